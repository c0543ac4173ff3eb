//! cloudscale CLI - Main Entry Point
//!
//! Converges one cloudscale.ch resource per invocation to the desired state
//! and prints the result.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use cloudscale_common::{ApiConfig, ApiToken, Outcome};
use commands::{
    custom_image, floating_ip, health_monitor, load_balancer, pool, pool_member, subnet,
};

/// cloudscale - declarative cloudscale.ch resource management
#[derive(Parser)]
#[command(name = "cloudscale")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API token
    #[arg(long, env = "CLOUDSCALE_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// API base URL
    #[arg(long, env = "CLOUDSCALE_API_URL", global = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "CLOUDSCALE_API_TIMEOUT", global = true)]
    api_timeout: Option<u64>,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    check: bool,

    /// Configuration file
    #[arg(long, env = "CLOUDSCALE_CONFIG", default_value = "cloudscale.toml", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage floating IPs
    FloatingIp(floating_ip::FloatingIpArgs),

    /// Manage custom images
    CustomImage(custom_image::CustomImageArgs),

    /// Manage load balancers
    LoadBalancer(load_balancer::LoadBalancerArgs),

    /// Manage load balancer pools
    Pool(pool::PoolArgs),

    /// Manage load balancer pool members
    PoolMember(pool_member::PoolMemberArgs),

    /// Manage load balancer health monitors
    HealthMonitor(health_monitor::HealthMonitorArgs),

    /// Manage subnets
    Subnet(subnet::SubnetArgs),

    /// Show version information
    Version,
}

impl Cli {
    /// File settings overridden by flags and environment
    fn api_config(&self) -> anyhow::Result<ApiConfig> {
        let mut config = ApiConfig::load(&self.config)?;
        if let Some(token) = &self.api_token {
            config.api_token = Some(ApiToken::new(token.clone()));
        }
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(timeout) = self.api_timeout {
            config.api_timeout = timeout;
        }
        if self.check {
            config.check_mode = true;
        }
        Ok(config.validate()?)
    }
}

async fn run(cli: Cli) -> anyhow::Result<Option<Outcome>> {
    if let Commands::Version = cli.command {
        println!("cloudscale v{}", cloudscale_common::VERSION);
        return Ok(None);
    }

    let config = cli.api_config()?;
    let outcome = match cli.command {
        Commands::FloatingIp(args) => floating_ip::execute(args, &config).await?,
        Commands::CustomImage(args) => custom_image::execute(args, &config).await?,
        Commands::LoadBalancer(args) => load_balancer::execute(args, &config).await?,
        Commands::Pool(args) => pool::execute(args, &config).await?,
        Commands::PoolMember(args) => pool_member::execute(args, &config).await?,
        Commands::HealthMonitor(args) => health_monitor::execute(args, &config).await?,
        Commands::Subnet(args) => subnet::execute(args, &config).await?,
        Commands::Version => return Ok(None),
    };
    Ok(Some(outcome))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, results to stdout
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    match run(cli).await {
        Ok(Some(outcome)) => output::print_outcome(&outcome, format),
        Ok(None) => {}
        Err(e) => {
            output::print_failure(&e, format);
            std::process::exit(1);
        }
    }

    Ok(())
}
