//! Geographic ranking: epicenter estimation, proximity and cost ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::api::traits::SimulationApi;
use crate::api::types::{Location, ResourceType};

/// Euclidean distance in raw latitude/longitude degrees, not geodesic.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let lat = b.0 - a.0;
    let lon = b.1 - a.1;
    (lat * lat + lon * lon).sqrt()
}

/// Centroid of the locations in `county`. `(0.0, 0.0)` when none match;
/// that is a defined degenerate case, not an error.
pub fn epicenter(locations: &[Location], county: &str) -> (f64, f64) {
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    let mut counted = 0usize;
    for location in locations.iter().filter(|location| location.county == county) {
        lat_sum += location.latitude;
        lon_sum += location.longitude;
        counted += 1;
    }
    if counted == 0 {
        return (0.0, 0.0);
    }
    (lat_sum / counted as f64, lon_sum / counted as f64)
}

/// Order `locations` ascending by distance to `reference`, dropping every
/// location the authority currently reports empty across all resource
/// types. Quantities are fetched live; each survivor's advisory stock map is
/// refreshed as a side effect. Ties keep input order.
pub async fn rank_by_proximity(
    api: &impl SimulationApi,
    reference: (f64, f64),
    locations: Vec<Location>,
) -> Vec<Location> {
    let mut ranked: Vec<(Location, f64)> = Vec::with_capacity(locations.len());
    for mut location in locations {
        let stock = live_stock(api, &location).await;
        if stock.values().all(|&quantity| quantity == 0) {
            continue;
        }
        let dist = distance(reference, location.position());
        location.stock = stock;
        ranked.push((location, dist));
    }
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ranked.into_iter().map(|(location, _)| location).collect()
}

/// Reorder candidates for an emergency outside the home county:
/// `cost = distance(emergency, candidate) - distance(home, candidate)`,
/// lower first. Rewards responders that are already "on the way" over the
/// purely nearest. No inventory re-filtering happens here.
pub fn rank_for_external(home: (f64, f64), emergency: (f64, f64), candidates: &mut [Location]) {
    candidates.sort_by(|a, b| {
        let cost_a = distance(emergency, a.position()) - distance(home, a.position());
        let cost_b = distance(emergency, b.position()) - distance(home, b.position());
        cost_a.partial_cmp(&cost_b).unwrap_or(Ordering::Equal)
    });
}

/// Fetch the authoritative quantity of every resource type at `location`.
pub(crate) async fn live_stock(
    api: &impl SimulationApi,
    location: &Location,
) -> BTreeMap<ResourceType, i64> {
    let mut stock = BTreeMap::new();
    for resource in ResourceType::ALL {
        let quantity = api
            .quantity_at(resource, &location.city, &location.county)
            .await;
        stock.insert(resource, quantity);
    }
    stock
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{location, StubApi};

    #[test]
    fn epicenter_is_the_arithmetic_mean_of_matching_locations() {
        let locations = vec![
            location("A", "R", 46.0, 23.0),
            location("B", "R", 47.0, 24.0),
            location("C", "Elsewhere", 10.0, 10.0),
        ];
        assert_eq!(epicenter(&locations, "R"), (46.5, 23.5));
    }

    #[test]
    fn epicenter_of_an_empty_match_is_the_origin() {
        let locations = vec![location("C", "Elsewhere", 10.0, 10.0)];
        assert_eq!(epicenter(&locations, "R"), (0.0, 0.0));
    }

    #[tokio::test]
    async fn proximity_orders_by_distance_and_drops_empty_locations() {
        let api = StubApi::new();
        api.add_location("Far", "R", 2.0, 0.0, &[(ResourceType::Medical, 1)]);
        api.add_location("Near", "R", 1.0, 0.0, &[(ResourceType::Fire, 3)]);
        api.add_location("Empty", "R", 0.5, 0.0, &[(ResourceType::Police, 0)]);

        let directory = vec![
            location("Far", "R", 2.0, 0.0),
            location("Near", "R", 1.0, 0.0),
            location("Empty", "R", 0.5, 0.0),
        ];

        let ranked = rank_by_proximity(&api, (0.0, 0.0), directory.clone()).await;
        let cities: Vec<&str> = ranked.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(cities, vec!["Near", "Far"]);

        // Unchanged inventory ranks identically on a second pass.
        let again = rank_by_proximity(&api, (0.0, 0.0), directory).await;
        let cities_again: Vec<&str> = again.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(cities, cities_again);
    }

    #[tokio::test]
    async fn proximity_refreshes_advisory_stock_from_live_quantities() {
        let api = StubApi::new();
        api.add_location("Near", "R", 1.0, 0.0, &[(ResourceType::Fire, 3)]);

        let mut stale = location("Near", "R", 1.0, 0.0);
        stale.stock.insert(ResourceType::Fire, 99);

        let ranked = rank_by_proximity(&api, (0.0, 0.0), vec![stale]).await;
        assert_eq!(ranked[0].stock.get(&ResourceType::Fire), Some(&3));
    }

    #[test]
    fn external_ranking_prefers_candidates_on_the_way() {
        // A sits past the emergency as seen from home: large home distance,
        // small emergency distance, so its cost is negative. B is the
        // opposite.
        let home = (0.0, 0.0);
        let emergency = (2.0, 0.0);
        let mut candidates = vec![
            location("B", "R", 0.5, 0.0),
            location("A", "R", 1.5, 0.0),
        ];

        rank_for_external(home, emergency, &mut candidates);
        let cities: Vec<&str> = candidates.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(cities, vec!["A", "B"]);
    }
}
