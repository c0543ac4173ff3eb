//! Subnet Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{NetworkRef, Subnet, SubnetParams};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct SubnetArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Subnet UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Subnet CIDR (e.g., 172.16.0.0/24)
    #[arg(long)]
    pub cidr: Option<String>,

    /// UUID of the owning network
    #[arg(long, conflicts_with = "network_name")]
    pub network_uuid: Option<String>,

    /// Name of the owning network
    #[arg(long)]
    pub network_name: Option<String>,

    /// Zone to look the network name up in
    #[arg(long, requires = "network_name")]
    pub network_zone: Option<String>,

    /// Gateway address
    #[arg(long)]
    pub gateway_address: Option<String>,

    /// DNS servers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub dns_servers: Option<Vec<String>>,

    #[command(flatten)]
    pub tags: TagArgs,
}

impl SubnetArgs {
    fn params(&self) -> SubnetParams {
        let network = (self.network_uuid.is_some() || self.network_name.is_some()).then(|| {
            NetworkRef {
                uuid: self.network_uuid.clone(),
                name: self.network_name.clone(),
                zone: self.network_zone.clone(),
            }
        });
        SubnetParams {
            uuid: self.uuid.clone(),
            cidr: self.cidr.clone(),
            network,
            gateway_address: self.gateway_address.clone(),
            dns_servers: self.dns_servers.clone(),
            tags: self.tags.desired(),
        }
    }
}

pub async fn execute(args: SubnetArgs, config: &ApiConfig) -> Result<Outcome> {
    converge(config, Subnet::new(args.params()), args.state).await
}
