//! Client library for the undocumented management API of Huawei HG659
//! routers.
//!
//! ```no_run
//! # async fn demo() -> hg659::Result<()> {
//! use hg659::{config::HttpConfig, Hg659Client};
//!
//! let client = Hg659Client::connect("192.168.1.1", "user", "secret", &HttpConfig::default()).await?;
//! let info = client.device_info().await?;
//! println!("{} running {}", info.model, info.version);
//! for host in client.hosts().await? {
//!     println!("{} {} {:?}", host.name, host.mac_addr, host.ip_addrs);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod device;
pub mod error;
pub mod http;
pub mod models;
pub mod parser;
pub mod server;

pub use device::{DeviceApi, Hg659Client};
pub use error::{Error, Result};
pub use models::{Csrf, DeviceInfo, Host, MacAddr};
