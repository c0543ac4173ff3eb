//! Load Balancer Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{LoadBalancer, LoadBalancerParams, VipAddress};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct LoadBalancerArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Load balancer UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Load balancer name
    #[arg(long)]
    pub name: Option<String>,

    /// Flavor slug (e.g., lb-standard)
    #[arg(long)]
    pub flavor: Option<String>,

    /// Zone slug (e.g., lpg1)
    #[arg(long)]
    pub zone: Option<String>,

    /// Virtual IP as subnet=UUID[,address=IP] (repeatable)
    #[arg(long = "vip", value_parser = parse_vip)]
    pub vip_addresses: Vec<VipAddress>,

    #[command(flatten)]
    pub tags: TagArgs,
}

/// Parse `subnet=UUID,address=IP`; both keys are optional
pub fn parse_vip(s: &str) -> std::result::Result<VipAddress, String> {
    let mut vip = VipAddress::default();
    for part in s.split(',').filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some(("subnet", value)) => vip.subnet = Some(value.to_string()),
            Some(("address", value)) => vip.address = Some(value.to_string()),
            _ => return Err(format!("unexpected VIP component '{}'", part)),
        }
    }
    Ok(vip)
}

impl LoadBalancerArgs {
    fn params(&self) -> LoadBalancerParams {
        LoadBalancerParams {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            flavor: self.flavor.clone(),
            zone: self.zone.clone(),
            vip_addresses: (!self.vip_addresses.is_empty()).then(|| self.vip_addresses.clone()),
            tags: self.tags.desired(),
        }
    }
}

pub async fn execute(args: LoadBalancerArgs, config: &ApiConfig) -> Result<Outcome> {
    converge(config, LoadBalancer::new(args.params()), args.state).await
}
