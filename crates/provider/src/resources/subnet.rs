//! Subnets
//!
//! The human key of a subnet is its CIDR. Creation needs the owning network,
//! which the caller may name instead of giving its UUID.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use cloudscale_common::{Error, Identity, Record, ResourceState, Result, Tags};

use super::{Adapter, Fields, ResourceDescriptor};
use crate::client::Transport;
use crate::state::{into_record, into_records, str_attr};

const NETWORKS: &str = "networks";

/// Reference to the owning network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkRef {
    pub uuid: Option<String>,
    pub name: Option<String>,
    /// Restricts a lookup by name to one zone
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubnetParams {
    pub uuid: Option<String>,
    pub cidr: Option<String>,
    pub network: Option<NetworkRef>,
    pub gateway_address: Option<String>,
    pub dns_servers: Option<Vec<String>>,
    pub tags: Option<Tags>,
}

pub struct Subnet {
    descriptor: ResourceDescriptor,
    params: SubnetParams,
}

impl Subnet {
    pub fn new(params: SubnetParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new("subnet", "subnets", "uuid", "cidr"),
            params,
        }
    }
}

/// Resolve a network reference to its stub (`href`, `uuid`, `name`)
pub async fn resolve_network(api: &dyn Transport, network: &NetworkRef) -> Result<Record> {
    if let Some(uuid) = &network.uuid {
        let record = api
            .get(&format!("{}/{}", NETWORKS, uuid))
            .await?
            .and_then(into_record)
            .ok_or_else(|| Error::NotFound {
                kind: "Network".to_string(),
                key: "uuid".to_string(),
                value: uuid.clone(),
            })?;
        return Ok(network_stub(&record));
    }

    let name = network.name.as_deref().ok_or_else(|| {
        Error::MissingParameter("network uuid or network name".to_string())
    })?;
    debug!("Resolving network {} in zone {:?}", name, network.zone);

    let mut matches: Vec<Record> = into_records(api.get(NETWORKS).await?)
        .into_iter()
        .filter(|record| str_attr(record, "name") == Some(name))
        .filter(|record| match &network.zone {
            Some(zone) => {
                record
                    .get("zone")
                    .and_then(|z| z.get("slug"))
                    .and_then(Value::as_str)
                    == Some(zone.as_str())
            }
            None => true,
        })
        .collect();

    if matches.len() > 1 {
        return Err(Error::Ambiguous {
            kind: NETWORKS.to_string(),
            key: "name".to_string(),
            value: name.to_string(),
            id_key: "uuid".to_string(),
        });
    }
    let record = matches.pop().ok_or_else(|| Error::NotFound {
        kind: "Network".to_string(),
        key: "name".to_string(),
        value: name.to_string(),
    })?;
    Ok(network_stub(&record))
}

fn network_stub(record: &Record) -> Record {
    ["href", "uuid", "name"]
        .into_iter()
        .filter_map(|key| record.get(key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

#[async_trait]
impl Adapter for Subnet {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.cidr.clone())
    }

    async fn create_payload(&self, api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        let cidr = p
            .cidr
            .clone()
            .ok_or_else(|| Error::MissingParameter("cidr".to_string()))?;
        let network = p
            .network
            .as_ref()
            .ok_or_else(|| Error::MissingParameter("network".to_string()))?;
        let stub = resolve_network(api, network).await?;
        let network_uuid = str_attr(&stub, "uuid")
            .map(str::to_string)
            .ok_or_else(|| Error::UnexpectedResponse("network without uuid".to_string()))?;

        Ok(Fields::new()
            .set("cidr", cidr)
            .set("network", network_uuid)
            .opt("gateway_address", &p.gateway_address)
            .opt("dns_servers", &p.dns_servers)
            .opt("tags", &p.tags))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        Fields::new()
            .opt("gateway_address", &self.params.gateway_address)
            .opt("dns_servers", &self.params.dns_servers)
            .opt("tags", &self.params.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTransport;
    use serde_json::json;

    fn networks() -> Value {
        json!([
            {"href": "https://api/v1/networks/n-1", "uuid": "n-1", "name": "private", "zone": {"slug": "lpg1"}},
            {"href": "https://api/v1/networks/n-2", "uuid": "n-2", "name": "private", "zone": {"slug": "rma1"}},
        ])
    }

    #[tokio::test]
    async fn test_resolve_network_by_name_in_zone() {
        let mut api = MockTransport::new();
        api.expect_get()
            .withf(|path| path == "networks")
            .returning(|_| Ok(Some(networks())));

        let stub = resolve_network(
            &api,
            &NetworkRef {
                name: Some("private".to_string()),
                zone: Some("lpg1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(
            Value::Object(stub),
            json!({"href": "https://api/v1/networks/n-1", "uuid": "n-1", "name": "private"})
        );
    }

    #[tokio::test]
    async fn test_resolve_network_by_name_without_zone_is_ambiguous() {
        let mut api = MockTransport::new();
        api.expect_get().returning(|_| Ok(Some(networks())));

        let err = resolve_network(
            &api,
            &NetworkRef {
                name: Some("private".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Ambiguous { .. }));
    }

    #[tokio::test]
    async fn test_resolve_unknown_network_uuid() {
        let mut api = MockTransport::new();
        api.expect_get()
            .withf(|path| path == "networks/nope")
            .returning(|_| Ok(None));

        let err = resolve_network(
            &api,
            &NetworkRef {
                uuid: Some("nope".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_payload_uses_network_uuid() {
        let mut api = MockTransport::new();
        api.expect_get().returning(|_| Ok(Some(networks())));

        let subnet = Subnet::new(SubnetParams {
            cidr: Some("172.16.0.0/24".to_string()),
            network: Some(NetworkRef {
                name: Some("private".to_string()),
                zone: Some("lpg1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });

        let payload = subnet.create_payload(&api).await.unwrap().into_payload();
        assert_eq!(payload["cidr"], json!("172.16.0.0/24"));
        assert_eq!(payload["network"], json!("n-1"));
    }
}
