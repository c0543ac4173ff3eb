//! Pool Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{Pool, PoolParams};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct PoolArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Pool UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Pool name
    #[arg(long)]
    pub name: Option<String>,

    /// UUID of the load balancer
    #[arg(long)]
    pub load_balancer: Option<String>,

    /// round_robin, least_connections or source_ip
    #[arg(long)]
    pub algorithm: Option<String>,

    /// tcp, proxy or proxyv2
    #[arg(long)]
    pub protocol: Option<String>,

    #[command(flatten)]
    pub tags: TagArgs,
}

pub async fn execute(args: PoolArgs, config: &ApiConfig) -> Result<Outcome> {
    let params = PoolParams {
        uuid: args.uuid,
        name: args.name,
        load_balancer: args.load_balancer,
        algorithm: args.algorithm,
        protocol: args.protocol,
        tags: args.tags.desired(),
    };
    converge(config, Pool::new(params), args.state).await
}
