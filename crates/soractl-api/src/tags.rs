// Subscriber detail and tag CRUD.

use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::DeviceRecord;

impl ApiClient {
    /// Fetch a single subscriber record (includes the `tags` map).
    ///
    /// `GET /subscribers/{imsi}`
    pub async fn get_subscriber(&self, imsi: &str) -> Result<DeviceRecord, Error> {
        let url = self.url(&format!("subscribers/{imsi}"))?;
        debug!(imsi, "fetching subscriber");

        let resp = self.http().get(url).send().await.map_err(Error::Transport)?;
        let resp = Self::ensure_success(resp).await?;
        Self::json_body(resp).await
    }

    /// Create or update a tag on a subscriber.
    ///
    /// `PUT /subscribers/{imsi}/tags` with `[{"tagName", "tagValue"}]`.
    pub async fn put_tag(&self, imsi: &str, name: &str, value: &str) -> Result<(), Error> {
        let url = self.url(&format!("subscribers/{imsi}/tags"))?;
        debug!(imsi, name, "putting tag");

        let resp = self
            .http()
            .put(url)
            .json(&json!([{ "tagName": name, "tagValue": value }]))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::ensure_success(resp).await?;
        Ok(())
    }

    /// Delete a tag from a subscriber.
    ///
    /// `DELETE /subscribers/{imsi}/tags` with `{"tagNames": [name]}`.
    pub async fn delete_tag(&self, imsi: &str, name: &str) -> Result<(), Error> {
        let url = self.url(&format!("subscribers/{imsi}/tags"))?;
        debug!(imsi, name, "deleting tag");

        let resp = self
            .http()
            .delete(url)
            .json(&json!({ "tagNames": [name] }))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::ensure_success(resp).await?;
        Ok(())
    }
}
