// On-demand port mapping (Napter) endpoints.
//
// A mapping is an ephemeral inbound NAT rule exposing one device port to a
// restricted source range. Creation must answer exactly 201; anything else
// is surfaced with the raw body because identity errors ("unknown imsi")
// need distinguishing from capacity or permission errors at the call site.

use reqwest::StatusCode;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{PortMapping, PortMappingRequest};

impl ApiClient {
    /// Create an ephemeral inbound port mapping.
    ///
    /// `POST /port_mappings`; only `201 Created` counts as success.
    pub async fn create_port_mapping(
        &self,
        request: &PortMappingRequest,
    ) -> Result<PortMapping, Error> {
        let url = self.url("port_mappings")?;
        debug!(
            imsi = request.destination.imsi,
            port = request.destination.port,
            duration = request.duration,
            "creating port mapping"
        );

        let resp = self
            .http()
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication { message: body });
        }
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Self::json_body(resp).await
    }

    /// Delete a port mapping by id.
    ///
    /// `DELETE /port_mappings/{id}`. A 404 means the mapping is already
    /// gone (server-side expiry), which is success for cleanup purposes.
    pub async fn delete_port_mapping(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("port_mappings/{id}"))?;
        debug!(id, "deleting port mapping");

        let resp = self
            .http()
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication { message: body });
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}
