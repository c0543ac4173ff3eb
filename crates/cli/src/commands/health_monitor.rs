//! Health Monitor Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{HealthMonitor, HealthMonitorParams, HttpCheck};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct HealthMonitorArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Health monitor UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// UUID of the monitored pool
    #[arg(long)]
    pub pool: Option<String>,

    /// Seconds between checks
    #[arg(long)]
    pub delay_s: Option<u32>,

    /// Seconds before a check times out
    #[arg(long)]
    pub timeout_s: Option<u32>,

    /// Successful checks before a member is up
    #[arg(long)]
    pub up_threshold: Option<u32>,

    /// Failed checks before a member is down
    #[arg(long)]
    pub down_threshold: Option<u32>,

    /// ping, tcp, http, https or tls-hello
    #[arg(long = "type")]
    pub monitor_type: Option<String>,

    /// Accepted HTTP status codes, comma separated
    #[arg(long, value_delimiter = ',')]
    pub http_expected_codes: Option<Vec<String>>,

    /// HTTP method
    #[arg(long)]
    pub http_method: Option<String>,

    /// HTTP path
    #[arg(long)]
    pub http_url_path: Option<String>,

    /// HTTP version (1.0 or 1.1)
    #[arg(long)]
    pub http_version: Option<String>,

    /// Host header
    #[arg(long)]
    pub http_host: Option<String>,

    #[command(flatten)]
    pub tags: TagArgs,
}

impl HealthMonitorArgs {
    fn http(&self) -> Option<HttpCheck> {
        let http = HttpCheck {
            expected_codes: self.http_expected_codes.clone(),
            method: self.http_method.clone(),
            url_path: self.http_url_path.clone(),
            version: self.http_version.clone(),
            host: self.http_host.clone(),
        };
        (http != HttpCheck::default()).then_some(http)
    }
}

pub async fn execute(args: HealthMonitorArgs, config: &ApiConfig) -> Result<Outcome> {
    let params = HealthMonitorParams {
        uuid: args.uuid.clone(),
        pool: args.pool.clone(),
        delay_s: args.delay_s,
        timeout_s: args.timeout_s,
        up_threshold: args.up_threshold,
        down_threshold: args.down_threshold,
        monitor_type: args.monitor_type.clone(),
        http: args.http(),
        tags: args.tags.desired(),
    };
    converge(config, HealthMonitor::new(params), args.state).await
}
