// Per-subscriber speed-class endpoint.

use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::SpeedClass;

impl ApiClient {
    /// Change a subscriber's bandwidth tier.
    ///
    /// `POST /subscribers/{imsi}/update_speed_class` with
    /// `{"speedClass": "s1.fast"}`. The provider answers with any of
    /// 200/201/204 on success.
    pub async fn update_speed_class(&self, imsi: &str, class: SpeedClass) -> Result<(), Error> {
        let url = self.url(&format!("subscribers/{imsi}/update_speed_class"))?;
        debug!(imsi, %class, "updating speed class");

        let resp = self
            .http()
            .post(url)
            .json(&json!({ "speedClass": class.as_str() }))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::ensure_success(resp).await?;
        Ok(())
    }
}
