//! Load balancer pool members
//!
//! Members live below their pool, so the collection path depends on the
//! pool UUID.

use async_trait::async_trait;

use cloudscale_common::{Error, Identity, Presence, ResourceState, Result, Tags};

use super::{Adapter, Fields, ResourceDescriptor, Waits, ABSENT};
use crate::client::Transport;

/// A member is usable once it reports either enabled value.
const SETTLED: &[&str] = &["true", "false"];

#[derive(Debug, Clone, Default)]
pub struct PoolMemberParams {
    /// UUID of the owning pool
    pub pool: String,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub protocol_port: Option<u16>,
    pub monitor_port: Option<u16>,
    pub address: Option<String>,
    /// UUID of the subnet the address belongs to
    pub subnet: Option<String>,
    pub tags: Option<Tags>,
}

pub struct PoolMember {
    descriptor: ResourceDescriptor,
    params: PoolMemberParams,
}

impl PoolMember {
    pub fn new(params: PoolMemberParams) -> Self {
        let collection = format!("load-balancers/pools/{}/members", params.pool);
        Self {
            descriptor: ResourceDescriptor::new("pool member", collection, "uuid", "name"),
            params,
        }
    }
}

#[async_trait]
impl Adapter for PoolMember {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.name.clone())
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        if p.protocol_port.is_none() {
            return Err(Error::MissingParameter("protocol_port".to_string()));
        }
        Ok(Fields::new()
            .opt("name", &p.name)
            .opt("enabled", &p.enabled)
            .opt("protocol_port", &p.protocol_port)
            .opt("monitor_port", &p.monitor_port)
            .opt("address", &p.address)
            .opt("subnet", &p.subnet)
            .opt("tags", &p.tags))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        Fields::new()
            .opt("name", &self.params.name)
            .opt("enabled", &self.params.enabled)
            .opt("tags", &self.params.tags)
    }

    fn status_label(&self, state: &ResourceState) -> String {
        match state.presence() {
            Presence::Absent => ABSENT.to_string(),
            Presence::Present => match state.get("enabled").and_then(|v| v.as_bool()) {
                Some(enabled) => enabled.to_string(),
                None => "pending".to_string(),
            },
        }
    }

    fn waits(&self) -> Waits {
        Waits {
            after_create: Some(SETTLED),
            ..Waits::default()
        }
    }
}
