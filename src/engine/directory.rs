//! Discovery of the de-duplicated location directory.

use crate::api::traits::SimulationApi;
use crate::api::types::{Location, ResourceType};

/// Union of every discovery endpoint, keyed by `(city, county)`.
///
/// First-seen wins: later sightings of the same place under another resource
/// type do not overwrite its attributes. A failed discovery for one type
/// contributes zero locations and does not abort the others (the client
/// already degrades it to an empty list).
pub async fn discover_all(api: &impl SimulationApi) -> Vec<Location> {
    let mut directory: Vec<Location> = Vec::new();
    for resource in ResourceType::ALL {
        let found = api.discover(resource).await;
        tracing::debug!("discovered {} locations offering {resource}", found.len());
        for raw in found {
            if directory
                .iter()
                .any(|known| known.is_same_place(&raw.city, &raw.county))
            {
                continue;
            }
            directory.push(raw.into_location(resource));
        }
    }
    directory
}
