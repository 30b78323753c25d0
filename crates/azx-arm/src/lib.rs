//! azx-arm — Azure Resource Manager client for the VPN exporter.
//!
//! # Architecture
//!
//! ```text
//! ArmClient
//!   ├── current_bearer() → checks expiry, refreshes through TokenSource
//!   ├── request() / get() → Authorization: Bearer <token>
//!   ├── build_url() → /subscriptions/{sub}[/resourceGroups/{group}]/providers/...
//!   ├── list_vpn_connections() → Vec<VpnConnection>
//!   └── get_vpn_connection(group, name) → VpnConnection
//!
//! ClientCredentialsSource → POST {login}/{tenant}/oauth2/token
//! ```

pub mod client;
pub mod error;
pub mod network;
pub mod token;

pub use client::ArmClient;
pub use error::{ArmError, ArmResult};
pub use token::{ClientCredentialsSource, Clock, SystemClock, Token, TokenSource};
