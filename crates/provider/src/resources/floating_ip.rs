//! Floating IPs
//!
//! Floating IPs are addressed by their network (`192.0.2.1/32`) and carry no
//! name. The human key lives in the `ansible_name` tag and is surfaced as
//! `name` in the output.

use async_trait::async_trait;
use serde_json::Value;

use cloudscale_common::{Error, Identity, Record, ResourceState, Result, Tags};

use super::{Adapter, Fields, ResourceDescriptor};
use crate::client::Transport;
use crate::state::into_records;

/// Tag holding the human key
pub const NAME_TAG: &str = "ansible_name";

/// Percent-encoded `tag:ansible_name=<name>` filter
fn name_query(name: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair(&format!("tag:{}", NAME_TAG), name)
        .finish()
}

#[derive(Debug, Clone, Default)]
pub struct FloatingIpParams {
    /// Address, with or without prefix length
    pub ip: Option<String>,
    pub name: Option<String>,
    pub ip_version: Option<u8>,
    pub server: Option<String>,
    pub prefix_length: Option<u8>,
    pub reverse_ptr: Option<String>,
    /// `regional` or `global`
    pub ip_type: Option<String>,
    pub region: Option<String>,
    pub tags: Option<Tags>,
}

pub struct FloatingIp {
    descriptor: ResourceDescriptor,
    params: FloatingIpParams,
}

impl FloatingIp {
    pub fn new(params: FloatingIpParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new("floating IP", "floating-ips", "network", "name"),
            params,
        }
    }

    /// Desired tags with the name tag injected. Without explicit tags the
    /// current ones are kept so naming never drops foreign tags.
    fn desired_tags(&self, current: Option<&Value>) -> Option<Tags> {
        let name = self.params.name.as_deref();
        let mut tags = match (&self.params.tags, name, current) {
            (Some(tags), _, _) => tags.clone(),
            (None, Some(_), Some(current)) => Tags::from_value(current),
            (None, Some(_), None) => Tags::new(),
            (None, None, _) => return None,
        };
        if let Some(name) = name {
            tags.insert(NAME_TAG, name);
        }
        Some(tags)
    }
}

/// Address part of `192.0.2.1/32`
pub fn strip_prefix_length(network: &str) -> &str {
    network.split('/').next().unwrap_or(network)
}

#[async_trait]
impl Adapter for FloatingIp {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.ip.clone(), self.params.name.clone())
    }

    async fn query_by_id(&self, api: &dyn Transport, id: &str) -> Result<Option<Record>> {
        let path = self.descriptor.item_path(strip_prefix_length(id));
        Ok(api.get(&path).await?.and_then(crate::state::into_record))
    }

    async fn query_by_name(&self, api: &dyn Transport, name: &str) -> Result<Vec<Record>> {
        let path = format!("{}?{}", self.descriptor.collection, name_query(name));
        let listing = api.get(&path).await?;
        Ok(into_records(listing)
            .into_iter()
            .filter(|record| {
                record
                    .get("tags")
                    .and_then(|tags| tags.get(NAME_TAG))
                    .and_then(Value::as_str)
                    == Some(name)
            })
            .collect())
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        if self.params.name.is_none() {
            return Err(Error::MissingParameter("name".to_string()));
        }
        let p = &self.params;
        Ok(Fields::new()
            .opt("ip_version", &p.ip_version)
            .opt("server", &p.server)
            .opt("prefix_length", &p.prefix_length)
            .opt("reverse_ptr", &p.reverse_ptr)
            .opt("type", &p.ip_type)
            .opt("region", &p.region)
            .opt("tags", &self.desired_tags(None)))
    }

    fn update_fields(&self, current: &ResourceState) -> Fields {
        Fields::new()
            .opt("server", &self.params.server)
            .opt("tags", &self.desired_tags(current.get("tags")))
    }

    fn item_path(&self, current: &ResourceState) -> Option<String> {
        current
            .str_field("network")
            .map(|network| self.descriptor.item_path(strip_prefix_length(network)))
    }

    fn finalize(&self, output: &mut Record) {
        if output.get("name").map_or(false, |name| !name.is_null()) {
            return;
        }
        let name = output
            .get_mut("tags")
            .and_then(Value::as_object_mut)
            .and_then(|tags| tags.remove(NAME_TAG))
            .unwrap_or_else(|| Value::String(String::new()));
        output.insert("name".to_string(), name);
    }
}
