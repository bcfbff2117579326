//! Remote-access session over an ephemeral port mapping.
//!
//! Single-use state machine: `Idle → Requested → Active → Closed`. Once
//! closed, the session cannot be reopened. `close()` always transitions to
//! `Closed`, even when the mapping deletion fails, so a session never ends
//! up half-open from the caller's perspective.

use soractl_api::{ApiClient, PortMapping, PortMappingRequest};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::Device;

/// Default mapping lifetime: one hour, enough for an update run.
pub const DEFAULT_DURATION_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// The create call is in flight.
    Requested,
    Active,
    Closed,
}

/// Endpoint the operator (or driver) connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub hostname: String,
    pub port: u16,
}

/// Single-use remote-access session for one device.
pub struct RemoteAccessSession<'a> {
    api: &'a ApiClient,
    state: SessionState,
    mapping: Option<PortMapping>,
    duration_secs: u64,
}

impl<'a> RemoteAccessSession<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            state: SessionState::Idle,
            mapping: None,
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The mapping id, while one is active. Exposed so the interrupt
    /// handler can track the resource for out-of-band cleanup.
    pub fn mapping_id(&self) -> Option<&str> {
        match self.state {
            SessionState::Active => self.mapping.as_ref().map(|m| m.id.as_str()),
            _ => None,
        }
    }

    /// Open the session: create a port mapping to the device's SSH port.
    ///
    /// `source_range` narrows who may connect (`"a.b.c.d/32"`); `None`
    /// leaves the mapping open to any source. Errors move the session back
    /// to `Idle` so a retry is possible; success moves it to `Active`.
    pub async fn open(
        &mut self,
        device: &Device,
        source_range: Option<String>,
    ) -> Result<ConnectionInfo, CoreError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Closed => return Err(CoreError::SessionClosed),
            SessionState::Requested | SessionState::Active => {
                return Err(CoreError::SessionAlreadyOpen);
            }
        }

        let imsi = device
            .identity()
            .ok_or_else(|| CoreError::MissingIdentity {
                device: device.display_name().to_owned(),
            })?;

        self.state = SessionState::Requested;
        let request = PortMappingRequest::ssh(imsi, self.duration_secs, source_range);
        match self.api.create_port_mapping(&request).await {
            Ok(mapping) => {
                info!(
                    imsi,
                    id = mapping.id,
                    endpoint = format!("{}:{}", mapping.hostname, mapping.port),
                    "remote access session opened"
                );
                let info = ConnectionInfo {
                    hostname: mapping.hostname.clone(),
                    port: mapping.port,
                };
                self.mapping = Some(mapping);
                self.state = SessionState::Active;
                Ok(info)
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Err(err.into())
            }
        }
    }

    /// Connection endpoint while the session is active.
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        match self.state {
            SessionState::Active => self.mapping.as_ref().map(|m| ConnectionInfo {
                hostname: m.hostname.clone(),
                port: m.port,
            }),
            _ => None,
        }
    }

    /// Close the session, deleting the mapping.
    ///
    /// Always ends in `Closed`, whatever the delete call returns; the
    /// mapping expires server-side anyway, so a failed delete must not
    /// leave the session reusable. Closing an idle or already-closed
    /// session is a no-op.
    pub async fn close(&mut self) -> Result<(), CoreError> {
        let mapping = match self.state {
            SessionState::Active | SessionState::Requested => self.mapping.take(),
            SessionState::Idle | SessionState::Closed => {
                self.state = SessionState::Closed;
                return Ok(());
            }
        };
        self.state = SessionState::Closed;

        if let Some(mapping) = mapping {
            if let Err(err) = self.api.delete_port_mapping(&mapping.id).await {
                warn!(id = mapping.id, error = %err, "failed to delete port mapping; it will expire server-side");
                return Err(err.into());
            }
            info!(id = mapping.id, "remote access session closed");
        }
        Ok(())
    }
}
