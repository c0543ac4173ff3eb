//! CLI Commands
//!
//! One subcommand per resource kind. Each builds the adapter parameters from
//! its flags and converges the resource to `--state`.

pub mod custom_image;
pub mod floating_ip;
pub mod health_monitor;
pub mod load_balancer;
pub mod pool;
pub mod pool_member;
pub mod subnet;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::debug;

use cloudscale_common::{ApiConfig, Outcome, Tags};
use cloudscale_provider::Adapter;

/// Desired presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// Tag flags shared by all resources
#[derive(Debug, Clone, Default, Args)]
pub struct TagArgs {
    /// Tag as key=value (repeatable)
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
}

impl TagArgs {
    /// `None` leaves tags alone, an empty set clears them
    pub fn desired(&self) -> Option<Tags> {
        if self.clear_tags {
            return Some(Tags::new());
        }
        if self.tags.is_empty() {
            return None;
        }
        Some(self.tags.iter().cloned().collect())
    }
}

/// Parse `key=value`
pub fn parse_tag(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Run one reconciliation pass
pub async fn converge<A: Adapter>(
    config: &ApiConfig,
    adapter: A,
    state: DesiredState,
) -> Result<Outcome> {
    debug!(
        "Converging {} to {:?}",
        adapter.descriptor().kind,
        state
    );
    let mut reconciler = cloudscale_provider::reconciler(config, adapter)?;
    let outcome = match state {
        DesiredState::Present => reconciler.present().await?,
        DesiredState::Absent => reconciler.absent().await?,
    };
    Ok(outcome)
}
