//! Load balancers

use async_trait::async_trait;
use serde_json::Value;

use cloudscale_common::{Error, Identity, Record, ResourceState, Result, Tags};

use super::{status_or_presence, Adapter, Fields, ResourceDescriptor, Waits, ABSENT};
use crate::client::Transport;

const RUNNING: &[&str] = &["running"];
const GONE: &[&str] = &[ABSENT];

/// Virtual IP requested at creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipAddress {
    pub subnet: Option<String>,
    pub address: Option<String>,
}

impl From<VipAddress> for Value {
    fn from(vip: VipAddress) -> Self {
        let mut map = Record::new();
        if let Some(subnet) = vip.subnet {
            map.insert("subnet".to_string(), Value::String(subnet));
        }
        if let Some(address) = vip.address {
            map.insert("address".to_string(), Value::String(address));
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadBalancerParams {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub zone: Option<String>,
    pub vip_addresses: Option<Vec<VipAddress>>,
    pub tags: Option<Tags>,
}

pub struct LoadBalancer {
    descriptor: ResourceDescriptor,
    params: LoadBalancerParams,
}

impl LoadBalancer {
    pub fn new(params: LoadBalancerParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new("load balancer", "load-balancers", "uuid", "name"),
            params,
        }
    }
}

#[async_trait]
impl Adapter for LoadBalancer {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.name.clone())
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        if p.name.is_none() {
            return Err(Error::MissingParameter("name".to_string()));
        }
        Ok(Fields::new()
            .opt("name", &p.name)
            .opt("flavor", &p.flavor)
            .opt("zone", &p.zone)
            .opt("vip_addresses", &p.vip_addresses)
            .opt("tags", &p.tags))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        Fields::new()
            .opt("name", &self.params.name)
            .opt("tags", &self.params.tags)
    }

    fn status_label(&self, state: &ResourceState) -> String {
        status_or_presence(state, "status")
    }

    fn waits(&self) -> Waits {
        Waits {
            after_create: Some(RUNNING),
            after_update: None,
            after_delete: Some(GONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_payload_serializes_vips() {
        let lb = LoadBalancer::new(LoadBalancerParams {
            name: Some("lb1".to_string()),
            flavor: Some("lb-standard".to_string()),
            zone: Some("lpg1".to_string()),
            vip_addresses: Some(vec![VipAddress {
                subnet: Some("subnet-1".to_string()),
                address: None,
            }]),
            ..Default::default()
        });

        let api = crate::client::MockTransport::new();
        let fields = lb.create_payload(&api).await.unwrap();
        assert_eq!(
            Value::Object(fields.into_payload()),
            json!({
                "name": "lb1",
                "flavor": "lb-standard",
                "zone": "lpg1",
                "vip_addresses": [{"subnet": "subnet-1"}],
                "tags": null,
            })
        );
    }

    #[test]
    fn test_status_label_uses_status_field() {
        let lb = LoadBalancer::new(LoadBalancerParams::default());
        let state = ResourceState::present(
            json!({"uuid": "lb", "status": "changing"}).as_object().cloned().unwrap(),
        );
        assert_eq!(lb.status_label(&state), "changing");
    }
}
