//! cloudscale-converge Provider
//!
//! Declarative present/absent management of cloudscale.ch resources: an HTTP
//! transport, a generic reconciler, a state waiter and one adapter per
//! resource kind.

pub mod client;
pub mod reconciler;
pub mod resources;
pub mod state;
pub mod waiter;

pub use client::{ApiClient, Transport};
pub use reconciler::Reconciler;
pub use resources::Adapter;
pub use waiter::Waiter;

use std::sync::Arc;

use cloudscale_common::{ApiConfig, Result};

/// Build a reconciler for `adapter` from validated configuration
pub fn reconciler<A: Adapter>(config: &ApiConfig, adapter: A) -> Result<Reconciler<A>> {
    let api: Arc<dyn Transport> = Arc::new(ApiClient::new(config)?);
    Ok(Reconciler::new(api, adapter)
        .check_mode(config.check_mode)
        .with_waiter(Waiter::new(config.wait_timeout())))
}
