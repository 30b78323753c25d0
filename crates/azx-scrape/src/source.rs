//! Where the coordinator reads VPN connections from.

use async_trait::async_trait;

use azx_arm::{ArmClient, ArmResult};
use azx_core::VpnConnection;

#[async_trait]
pub trait ConnectionSource: Send + Sync + 'static {
    /// List all connections, with `name` and `resource_group` filled in.
    async fn list_connections(&self) -> ArmResult<Vec<VpnConnection>>;

    /// Fetch the current state of one connection.
    async fn get_connection(&self, group: &str, name: &str) -> ArmResult<VpnConnection>;
}

#[async_trait]
impl ConnectionSource for ArmClient {
    async fn list_connections(&self) -> ArmResult<Vec<VpnConnection>> {
        self.list_vpn_connections().await
    }

    async fn get_connection(&self, group: &str, name: &str) -> ArmResult<VpnConnection> {
        self.get_vpn_connection(group, name).await
    }
}
