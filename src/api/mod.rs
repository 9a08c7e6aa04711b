//! Client layer for the remote simulation authority.
//!
//! ## Structure
//!
//! - `types`: domain and wire types (ResourceType, Location, EmergencyEvent)
//! - `traits`: the `SimulationApi` seam the engine depends on
//! - `client`: `RemoteClient`, the resilient reqwest implementation

pub mod client;
pub mod traits;
pub mod types;


pub use client::{ApiError, RemoteClient};
pub use traits::SimulationApi;
pub use types::{EmergencyEvent, Location, RawLocation, ResourceType};
