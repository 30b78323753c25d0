//! VPN connection lookups against the `Microsoft.Network` provider.

use reqwest::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use azx_core::{
    ResourceId, VPN_CONNECTIONS_API_VERSION, VPN_CONNECTIONS_PROVIDER, VpnConnection,
    VpnConnectionList, VpnConnectionProperties,
};

use crate::client::ArmClient;
use crate::error::{ArmError, ArmResult};

/// Detail responses must carry `properties`; an error body would otherwise
/// decode into an all-default record.
#[derive(Deserialize)]
struct VpnConnectionDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    name: String,
    properties: VpnConnectionProperties,
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &'static str) -> ArmResult<T> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(ArmError::transport)?;
    serde_json::from_slice(&body).map_err(|e| ArmError::Decode {
        what,
        status: status.as_u16(),
        reason: e.to_string(),
    })
}

impl ArmClient {
    /// List every VPN connection in the subscription.
    ///
    /// `name` and `resource_group` of each record are derived from its id.
    /// Records whose id is too short to carry them are skipped.
    pub async fn list_vpn_connections(&self) -> ArmResult<Vec<VpnConnection>> {
        let url = self.build_url(None, VPN_CONNECTIONS_PROVIDER, VPN_CONNECTIONS_API_VERSION);
        let resp = self.get(url).await?;
        let list: VpnConnectionList = decode(resp, "vpn connection list").await?;

        let mut conns = Vec::with_capacity(list.value.len());
        for mut conn in list.value {
            match ResourceId::parse(&conn.id) {
                Ok(id) => {
                    conn.name = id.name;
                    conn.resource_group = id.resource_group;
                    conns.push(conn);
                }
                Err(e) => warn!(error = %e, "skipping vpn connection with malformed id"),
            }
        }

        debug!(count = conns.len(), "listed vpn connections");
        Ok(conns)
    }

    /// Fetch a single VPN connection by resource group and name.
    pub async fn get_vpn_connection(&self, group: &str, name: &str) -> ArmResult<VpnConnection> {
        let provider_path = format!("{VPN_CONNECTIONS_PROVIDER}/{name}");
        let url = self.build_url(Some(group), &provider_path, VPN_CONNECTIONS_API_VERSION);
        let resp = self.get(url).await?;
        let detail: VpnConnectionDetail = decode(resp, "vpn connection").await?;

        Ok(VpnConnection {
            id: detail.id,
            location: detail.location,
            name: if detail.name.is_empty() {
                name.to_string()
            } else {
                detail.name
            },
            resource_group: group.to_string(),
            properties: detail.properties,
        })
    }
}
