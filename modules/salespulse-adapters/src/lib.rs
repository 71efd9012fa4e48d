//! Platform adapters and the ingestion coordinator.
//!
//! Each supported platform has one adapter that knows how to authenticate a
//! delivery and map its payload into a [`NormalizedEvent`]. The coordinator
//! resolves the adapter from the route, bounds its work with a timeout and
//! writes exactly one record per accepted delivery.
//!
//! [`NormalizedEvent`]: salespulse_common::NormalizedEvent

pub mod adapter;
pub mod braip;
pub mod cakto;
pub mod cakto_sync;
pub mod coordinator;
pub mod fields;
pub mod hubla;
pub mod kirvano;
pub mod registry;
pub mod signature;

pub use adapter::WebhookAdapter;
pub use braip::BraipAdapter;
pub use cakto::CaktoAdapter;
pub use cakto_sync::{import_orders, CaktoClient, SyncError, SyncReport};
pub use coordinator::{Accepted, Coordinator};
pub use hubla::HublaAdapter;
pub use kirvano::KirvanoAdapter;
pub use registry::{build_adapter, AdapterRegistry};
