// ============================
// crates/backend-lib/src/gateway/mod.rs
// ============================
//! Reverse-proxy gateway.
//!
//! Requests are matched against a [`RouteTable`] by longest path prefix, the
//! prefix is stripped, and the rest is relayed to the route's upstream by a
//! [`Forwarder`]. Upstream status, headers and body come back unchanged apart
//! from hop-by-hop headers.

mod forward;
mod route_table;
mod router;

use std::sync::Arc;

pub use forward::{strip_hop_by_hop, ForwardError, Forwarder, HttpForwarder};
pub use route_table::{RouteEntry, RouteMatch, RouteTable};
pub use router::create_router;

use crate::config::{ConfigError, GatewaySettings};

/// State shared by gateway handlers
#[derive(Clone)]
pub struct GatewayState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Arc<dyn Forwarder>,
}

impl GatewayState {
    /// Build the route table and an HTTP forwarder from settings
    pub fn new(settings: &GatewaySettings) -> Result<Self, ConfigError> {
        let forwarder = HttpForwarder::new(settings)?;
        Self::with_forwarder(settings, Arc::new(forwarder))
    }

    pub fn with_forwarder(
        settings: &GatewaySettings,
        forwarder: Arc<dyn Forwarder>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            routes: Arc::new(RouteTable::from_settings(settings)?),
            forwarder,
        })
    }
}
