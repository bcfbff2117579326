//! Async client for the Soracom REST API.
//!
//! Covers the surfaces the fleet console needs: operator authentication,
//! paginated subscriber (device) retrieval, per-subscriber speed-class
//! updates, on-demand Napter port mappings, and tag CRUD. `soractl-core`
//! builds the domain model and orchestration on top of this crate.

pub mod auth;
pub mod client;
pub mod error;
pub mod ip_lookup;
pub mod models;
pub mod port_mappings;
pub mod speed_class;
pub mod subscribers;
pub mod tags;
pub mod transport;

pub use auth::{Credentials, authenticate};
pub use client::ApiClient;
pub use error::Error;
pub use models::{DeviceRecord, PortMapping, PortMappingRequest, SpeedClass};
pub use subscribers::{FetchOptions, SubscriberFilters};
pub use transport::TransportConfig;
