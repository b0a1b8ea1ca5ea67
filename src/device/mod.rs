//! Device abstraction layer
//!
//! The proxy talks to a router through the `DeviceApi` trait, so it can be
//! driven by a real session or by a stand-in during tests.

pub mod hg659;

pub use hg659::Hg659Client;

use crate::error::Result;
use crate::models::{DeviceInfo, Host};
use async_trait::async_trait;

/// Read operations the proxy re-serves, plus session upkeep
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Fetch device metadata
    async fn device_info(&self) -> Result<DeviceInfo>;

    /// Fetch the list of known hosts
    async fn hosts(&self) -> Result<Vec<Host>>;

    /// Keep the session alive
    async fn heartbeat(&self) -> Result<()>;

    /// Start a fresh session: fetch the landing page, then log in
    async fn authenticate(&self, username: &str, password: &str) -> Result<()>;
}
