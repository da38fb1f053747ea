//! Shared User-Agent strings for transfer and describer HTTP clients.

/// Product token shared by every request the crate sends.
const PRODUCT: &str = "clipfetch";

/// Default User-Agent for transfer requests.
#[must_use]
pub(crate) fn default_transfer_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (media-transfer)")
}

/// Default User-Agent for describer requests.
#[must_use]
pub(crate) fn default_describe_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (describe)")
}
