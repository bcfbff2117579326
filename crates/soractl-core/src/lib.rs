//! Domain layer between `soractl-api` and the CLI.
//!
//! This crate owns the business logic of the fleet console:
//!
//! - **[`Device`]** — immutable view over a raw subscriber record, with
//!   resolver functions probing the provider's loosely-populated fields
//!   (identity, online state, display name, software version).
//! - **[`CacheStore`]** — time-boxed, file-backed read-through cache for
//!   the inventory snapshot (TTL 600s, atomic temp-file + rename writes).
//! - **[`Inventory`] / [`DeviceCatalog`]** — paginated bulk load (cache
//!   first, API on miss) into an online/offline-categorized catalog with
//!   exact-before-substring search.
//! - **[`RemoteAccessSession`]** — state machine over an ephemeral inbound
//!   port mapping (`Idle → Requested → Active → Closed`, single use).
//! - **[`RemoteCommandDriver`]** — pluggable scripted-session protocol;
//!   [`SshUpdateDriver`] drives the update command sequence over SSH.
//! - **[`UpdateOrchestrator`]** — sequences speed-class raise → session →
//!   scripted update → classification, with guaranteed cleanup (speed
//!   restore + session close) on every path.
//! - **[`CleanupContext`]** — explicit resource ledger shared with the
//!   process interrupt handler, so ctrl-c releases the same resources.

pub mod cache;
pub mod catalog;
pub mod cleanup;
pub mod error;
pub mod model;
pub mod policy;
pub mod remote;
pub mod session;
pub mod update;

pub use cache::{CacheStore, InventorySnapshot, CACHE_TTL};
pub use catalog::{CatalogCounts, DeviceCatalog, Inventory};
pub use cleanup::CleanupContext;
pub use error::CoreError;
pub use model::{is_valid_imsi, Device};
pub use policy::set_speed_class;
pub use remote::ssh::{SshUpdateDriver, UpdateScript};
pub use remote::{RemoteCommandDriver, ScriptOutcome};
pub use session::{ConnectionInfo, RemoteAccessSession, SessionState};
pub use update::{UpdateOrchestrator, UpdateOutcome, UpdateStatus};

// Re-export the wire types callers routinely pass through.
pub use soractl_api::{DeviceRecord, SpeedClass};
