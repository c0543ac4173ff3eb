//! Floating IP Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{FloatingIp, FloatingIpParams};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct FloatingIpArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Floating IP address, with or without prefix length
    #[arg(long)]
    pub ip: Option<String>,

    /// Name, stored in the ansible_name tag
    #[arg(long)]
    pub name: Option<String>,

    /// IP version (4 or 6)
    #[arg(long, value_parser = parse_ip_version)]
    pub ip_version: Option<u8>,

    /// UUID of the server to assign the IP to
    #[arg(long)]
    pub server: Option<String>,

    /// Prefix length (IPv6 only)
    #[arg(long)]
    pub prefix_length: Option<u8>,

    /// Reverse PTR record
    #[arg(long)]
    pub reverse_ptr: Option<String>,

    /// regional or global
    #[arg(long = "type")]
    pub ip_type: Option<String>,

    /// Region for regional IPs
    #[arg(long)]
    pub region: Option<String>,

    #[command(flatten)]
    pub tags: TagArgs,
}

fn parse_ip_version(s: &str) -> Result<u8, String> {
    match s {
        "4" => Ok(4),
        "6" => Ok(6),
        other => Err(format!("IP version must be 4 or 6, got '{}'", other)),
    }
}

impl FloatingIpArgs {
    fn params(&self) -> FloatingIpParams {
        FloatingIpParams {
            ip: self.ip.clone(),
            name: self.name.clone(),
            ip_version: self.ip_version,
            server: self.server.clone(),
            prefix_length: self.prefix_length,
            reverse_ptr: self.reverse_ptr.clone(),
            ip_type: self.ip_type.clone(),
            region: self.region.clone(),
            tags: self.tags.desired(),
        }
    }
}

pub async fn execute(args: FloatingIpArgs, config: &ApiConfig) -> Result<Outcome> {
    converge(config, FloatingIp::new(args.params()), args.state).await
}
