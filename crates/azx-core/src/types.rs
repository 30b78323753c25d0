//! Resource records returned by the Azure Resource Manager network provider.

use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Provider path of the modelled resource type.
pub const VPN_CONNECTIONS_PROVIDER: &str = "Microsoft.Network/connections";
/// API version used for both the list and the detail endpoints.
pub const VPN_CONNECTIONS_API_VERSION: &str = "2015-06-15";

/// Connection state reported in `properties.connectionStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ConnectionStatus {
    Connected,
    /// Any other literal (`Connecting`, `NotConnected`, `Unknown`, ...).
    Other(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Other(String::new())
    }
}

impl From<String> for ConnectionStatus {
    fn from(s: String) -> Self {
        if s == "Connected" {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Other(s)
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Decodes an explicit JSON `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnConnectionProperties {
    #[serde(rename = "connectionStatus", default, deserialize_with = "null_as_default")]
    pub status: ConnectionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingress_bytes_transferred: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub egress_bytes_transferred: f64,
}

/// A virtual network gateway connection.
///
/// `name` and `resource_group` are filled in from the resource id by the
/// list call; the detail call only fills in what the API returns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VpnConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub name: String,
    #[serde(skip)]
    pub resource_group: String,
    #[serde(default)]
    pub properties: VpnConnectionProperties,
}

/// List envelope: `{ "value": [ ... ] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct VpnConnectionList {
    pub value: Vec<VpnConnection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource id {id:?} has {segments} segments, expected at least {}", ResourceId::MIN_SEGMENTS)]
pub struct InvalidResourceId {
    pub id: String,
    pub segments: usize,
}

/// Fields derived from a Resource Manager identifier.
///
/// Identifiers have the fixed shape
/// `/subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`,
/// so after splitting on `/` (leading empty segment included) the resource
/// group sits at index 4 and the resource name at index 8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub resource_group: String,
    pub name: String,
}

impl ResourceId {
    const GROUP_SEGMENT: usize = 4;
    const NAME_SEGMENT: usize = 8;
    const MIN_SEGMENTS: usize = Self::NAME_SEGMENT + 1;

    pub fn parse(id: &str) -> Result<Self, InvalidResourceId> {
        let segments: Vec<&str> = id.split('/').collect();
        if segments.len() < Self::MIN_SEGMENTS {
            return Err(InvalidResourceId {
                id: id.to_string(),
                segments: segments.len(),
            });
        }
        Ok(Self {
            resource_group: segments[Self::GROUP_SEGMENT].to_string(),
            name: segments[Self::NAME_SEGMENT].to_string(),
        })
    }
}
