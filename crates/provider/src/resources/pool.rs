//! Load balancer pools

use async_trait::async_trait;

use cloudscale_common::{Error, Identity, ResourceState, Result, Tags};

use super::{Adapter, Fields, ResourceDescriptor, Waits, ABSENT, PRESENT};
use crate::client::Transport;

const SETTLED: &[&str] = &[PRESENT];
const GONE: &[&str] = &[ABSENT];

#[derive(Debug, Clone, Default)]
pub struct PoolParams {
    pub uuid: Option<String>,
    pub name: Option<String>,
    /// UUID of the owning load balancer
    pub load_balancer: Option<String>,
    /// `round_robin`, `least_connections` or `source_ip`
    pub algorithm: Option<String>,
    /// `tcp`, `proxy` or `proxyv2`
    pub protocol: Option<String>,
    pub tags: Option<Tags>,
}

pub struct Pool {
    descriptor: ResourceDescriptor,
    params: PoolParams,
}

impl Pool {
    pub fn new(params: PoolParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new("pool", "load-balancers/pools", "uuid", "name"),
            params,
        }
    }
}

#[async_trait]
impl Adapter for Pool {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.name.clone())
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        if p.load_balancer.is_none() {
            return Err(Error::MissingParameter("load_balancer".to_string()));
        }
        Ok(Fields::new()
            .opt("name", &p.name)
            .opt("load_balancer", &p.load_balancer)
            .opt("algorithm", &p.algorithm)
            .opt("protocol", &p.protocol)
            .opt("tags", &p.tags))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        Fields::new()
            .opt("name", &self.params.name)
            .opt("tags", &self.params.tags)
    }

    fn waits(&self) -> Waits {
        Waits {
            after_create: Some(SETTLED),
            after_update: Some(SETTLED),
            after_delete: Some(GONE),
        }
    }
}
