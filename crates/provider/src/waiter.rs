//! Polling for asynchronous state changes
//!
//! Some mutations return before the resource reaches its final status. The
//! waiter refreshes the resource once per interval until its status label is
//! one of the targets or the deadline passes.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use cloudscale_common::config::{DEFAULT_API_TIMEOUT, WAIT_TIMEOUT_FACTOR};
use cloudscale_common::{Error, ResourceState, Result};

use crate::resources::ABSENT;

/// Interval between two refreshes
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Something that can be re-queried while waiting
#[async_trait]
pub trait Refresh: Send {
    /// Re-query the resource
    async fn refresh(&mut self) -> Result<ResourceState>;

    /// Label compared against the targets
    fn status_label(&self, state: &ResourceState) -> String;

    /// Kind for diagnostics
    fn kind(&self) -> String;

    /// Instance name for diagnostics
    fn name(&self) -> String;
}

/// Target labels and deadline of one wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    states: BTreeSet<String>,
    deadline: Instant,
}

impl PollTarget {
    pub fn new<I, S>(states: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn accepts(&self, label: &str) -> bool {
        self.states.contains(label)
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn states(&self) -> Vec<String> {
        self.states.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    timeout: Duration,
    interval: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_API_TIMEOUT) * WAIT_TIMEOUT_FACTOR)
    }
}

impl Waiter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll until the status label is one of `targets`
    pub async fn wait_for<R: Refresh + ?Sized>(
        &self,
        resource: &mut R,
        targets: &[&str],
    ) -> Result<ResourceState> {
        let target = PollTarget::new(targets.iter().copied(), self.timeout);
        let mut last: Option<String> = None;
        let mut seen = false;

        while !target.expired() {
            let state = resource.refresh().await?;
            let label = resource.status_label(&state);

            if target.accepts(&label) {
                debug!(
                    "{} {} reached {}",
                    resource.kind(),
                    resource.name(),
                    label
                );
                return Ok(state);
            }

            debug!(
                "{} {} is {}, waiting for {:?}",
                resource.kind(),
                resource.name(),
                label,
                target.states()
            );
            seen |= state.is_present();
            last = Some(label);
            sleep(self.interval).await;
        }

        if !seen && !target.accepts(ABSENT) {
            return Err(Error::NotFoundWhileWaiting {
                kind: resource.kind(),
                name: resource.name(),
            });
        }

        Err(Error::Timeout {
            kind: resource.kind(),
            name: resource.name(),
            targets: target.states(),
            last: last.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}
