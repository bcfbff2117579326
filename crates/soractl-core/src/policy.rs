//! Speed-class policy changes.

use soractl_api::{ApiClient, SpeedClass};
use tracing::info;

use crate::error::CoreError;
use crate::model::Device;

/// Set a device's speed class, resolving its subscriber identity first.
///
/// Fails fast with [`CoreError::MissingIdentity`] before any network call
/// when the record carries no resolvable IMSI.
pub async fn set_speed_class(
    api: &ApiClient,
    device: &Device,
    class: SpeedClass,
) -> Result<(), CoreError> {
    let imsi = device
        .identity()
        .ok_or_else(|| CoreError::MissingIdentity {
            device: device.display_name().to_owned(),
        })?;
    api.update_speed_class(imsi, class).await?;
    info!(imsi, class = %class, "speed class updated");
    Ok(())
}
