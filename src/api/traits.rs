//! The live-query seam between the decision engine and the authority.

use crate::api::types::{EmergencyEvent, Location, RawLocation, ResourceType};

/// Remote operations the engine needs from the simulation authority.
///
/// Every method degrades instead of failing: a call that cannot be served
/// resolves to empty/zero/false and the run keeps going. Ranking and solving
/// fetch every quantity they act on through this trait, never from a
/// location's advisory stock map.
#[allow(async_fn_in_trait)]
pub trait SimulationApi: Send + Sync {
    /// Start a run. Returns the authority's response body, if any.
    async fn reset(&self) -> Option<String>;

    /// End the run.
    async fn stop(&self) -> Option<String>;

    /// Poll the next emergency. `None` signals the end of the stream.
    async fn next_event(&self) -> Option<EmergencyEvent>;

    /// Locations currently offering `resource`. Empty on failure.
    async fn discover(&self, resource: ResourceType) -> Vec<RawLocation>;

    /// Live quantity of `resource` held at one location. Zero on failure.
    async fn quantity_at(&self, resource: ResourceType, city: &str, county: &str) -> i64;

    /// Move `quantity` units of `resource` from `source` to the emergency
    /// location. False when the dispatch could not be confirmed.
    async fn dispatch(
        &self,
        resource: ResourceType,
        source: &Location,
        target: &EmergencyEvent,
        quantity: i64,
    ) -> bool;
}
