//! Pool Member Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{PoolMember, PoolMemberParams};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct PoolMemberArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// UUID of the pool
    #[arg(long)]
    pub pool: String,

    /// Member UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Member name
    #[arg(long)]
    pub name: Option<String>,

    /// Whether the member receives traffic
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Port traffic is sent to
    #[arg(long)]
    pub protocol_port: Option<u16>,

    /// Port health checks are sent to
    #[arg(long)]
    pub monitor_port: Option<u16>,

    /// Member address
    #[arg(long)]
    pub address: Option<String>,

    /// UUID of the subnet the address belongs to
    #[arg(long)]
    pub subnet: Option<String>,

    #[command(flatten)]
    pub tags: TagArgs,
}

pub async fn execute(args: PoolMemberArgs, config: &ApiConfig) -> Result<Outcome> {
    let params = PoolMemberParams {
        pool: args.pool,
        uuid: args.uuid,
        name: args.name,
        enabled: args.enabled,
        protocol_port: args.protocol_port,
        monitor_port: args.monitor_port,
        address: args.address,
        subnet: args.subnet,
        tags: args.tags.desired(),
    };
    converge(config, PoolMember::new(params), args.state).await
}
