//! Greedy multi-resource fulfillment for one emergency.

use std::collections::BTreeMap;

use crate::api::traits::SimulationApi;
use crate::api::types::{EmergencyEvent, Location, ResourceType};
use crate::engine::ranking;

/// What one solve pass observed and achieved.
#[derive(Debug, Default)]
pub struct SolveOutcome {
    /// Candidate indices holding zero stock in every resource type, whether
    /// found that way or drained by this pass's own dispatches. Positions
    /// refer to `candidates` as ordered during the call; the caller applies
    /// removals in descending index order.
    pub exhausted: Vec<usize>,
    /// True iff every requested quantity was fully dispatched.
    pub fully_resolved: bool,
}

/// Allocate `event`'s needs across `candidates` in order, nearest-first (or
/// cheapest-first for emergencies outside the home county).
///
/// Quantities are fetched live per candidate; the advisory stock map is only
/// written back, never read. Partial dispatches stand even when the
/// candidate list runs out before every need is met; there is no rollback.
pub async fn solve(
    api: &impl SimulationApi,
    home: (f64, f64),
    home_county: &str,
    event: &EmergencyEvent,
    candidates: &mut Vec<Location>,
) -> SolveOutcome {
    if event.county != home_county {
        ranking::rank_for_external(home, event.position(), candidates);
    }

    let mut needs: BTreeMap<ResourceType, i64> = event
        .needs
        .iter()
        .filter(|(_, &quantity)| quantity > 0)
        .map(|(&resource, &quantity)| (resource, quantity))
        .collect();
    let mut outcome = SolveOutcome::default();

    for index in 0..candidates.len() {
        if needs.values().all(|&quantity| quantity == 0) {
            break;
        }

        let mut stock = ranking::live_stock(api, &candidates[index]).await;
        if stock.values().all(|&quantity| quantity == 0) {
            outcome.exhausted.push(index);
            candidates[index].stock = stock;
            continue;
        }

        for resource in ResourceType::ALL {
            let Some(need) = needs.get_mut(&resource) else {
                continue;
            };
            let available = stock.get(&resource).copied().unwrap_or(0);
            if *need == 0 || available == 0 {
                continue;
            }
            let quantity = available.min(*need);
            if api
                .dispatch(resource, &candidates[index], event, quantity)
                .await
            {
                *need -= quantity;
                stock.insert(resource, available - quantity);
            }
        }
        if stock.values().all(|&quantity| quantity == 0) {
            outcome.exhausted.push(index);
        }
        candidates[index].stock = stock;
    }

    outcome.fully_resolved = needs.values().all(|&quantity| quantity == 0);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{emergency, location, StubApi};

    const HOME: (f64, f64) = (0.0, 0.0);
    const HOME_COUNTY: &str = "R";

    #[tokio::test]
    async fn spreads_one_need_across_candidates_in_order() {
        let api = StubApi::new();
        api.add_location("First", "R", 1.0, 0.0, &[(ResourceType::Medical, 5)]);
        api.add_location("Second", "R", 2.0, 0.0, &[(ResourceType::Medical, 10)]);
        let mut candidates = vec![
            location("First", "R", 1.0, 0.0),
            location("Second", "R", 2.0, 0.0),
        ];
        let event = emergency("Site", "R", 1.0, 1.0, &[(ResourceType::Medical, 8)]);

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(outcome.fully_resolved);
        // First was drained to zero across the board; Second was not.
        assert_eq!(outcome.exhausted, vec![0]);
        let dispatched: Vec<(String, i64)> = api
            .dispatches
            .lock()
            .unwrap()
            .iter()
            .map(|record| (record.source_city.clone(), record.quantity))
            .collect();
        assert_eq!(
            dispatched,
            vec![("First".to_string(), 5), ("Second".to_string(), 3)]
        );
        // Second still holds 7 medical; it stays a candidate.
        assert_eq!(api.quantity("Second", "R", ResourceType::Medical), 7);
    }

    #[tokio::test]
    async fn under_supply_leaves_the_need_open_and_reports_exhausted_candidates() {
        let api = StubApi::new();
        api.add_location("Low", "R", 1.0, 0.0, &[(ResourceType::Fire, 2)]);
        api.add_location("Empty", "R", 1.5, 0.0, &[(ResourceType::Fire, 0)]);
        api.add_location("Last", "R", 2.0, 0.0, &[(ResourceType::Fire, 1)]);
        let mut candidates = vec![
            location("Low", "R", 1.0, 0.0),
            location("Empty", "R", 1.5, 0.0),
            location("Last", "R", 2.0, 0.0),
        ];
        let event = emergency("Site", "R", 1.0, 1.0, &[(ResourceType::Fire, 5)]);

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(!outcome.fully_resolved);
        // Low and Last were drained dry; Empty was found that way.
        assert_eq!(outcome.exhausted, vec![0, 1, 2]);
        let total: i64 = api
            .dispatches
            .lock()
            .unwrap()
            .iter()
            .map(|record| record.quantity)
            .sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn stops_scanning_once_every_need_is_met() {
        let api = StubApi::new();
        api.add_location("Near", "R", 1.0, 0.0, &[(ResourceType::Police, 4)]);
        api.add_location("Spare", "R", 2.0, 0.0, &[(ResourceType::Police, 4)]);
        let mut candidates = vec![
            location("Near", "R", 1.0, 0.0),
            location("Spare", "R", 2.0, 0.0),
        ];
        let event = emergency("Site", "R", 1.0, 1.0, &[(ResourceType::Police, 4)]);

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(outcome.fully_resolved);
        // Spare was never consulted: its stock is untouched and no dispatch
        // names it.
        assert_eq!(api.quantity("Spare", "R", ResourceType::Police), 4);
        assert_eq!(api.dispatches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mixed_needs_draw_each_type_from_the_first_holder() {
        let api = StubApi::new();
        api.add_location(
            "Clinic",
            "R",
            1.0,
            0.0,
            &[(ResourceType::Medical, 3), (ResourceType::Rescue, 1)],
        );
        api.add_location("Station", "R", 2.0, 0.0, &[(ResourceType::Rescue, 5)]);
        let mut candidates = vec![
            location("Clinic", "R", 1.0, 0.0),
            location("Station", "R", 2.0, 0.0),
        ];
        let event = emergency(
            "Site",
            "R",
            1.0,
            1.0,
            &[(ResourceType::Medical, 2), (ResourceType::Rescue, 4)],
        );

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(outcome.fully_resolved);
        assert_eq!(api.quantity("Clinic", "R", ResourceType::Medical), 1);
        assert_eq!(api.quantity("Clinic", "R", ResourceType::Rescue), 0);
        assert_eq!(api.quantity("Station", "R", ResourceType::Rescue), 2);
    }

    #[tokio::test]
    async fn external_emergency_reorders_candidates_by_cost_first() {
        let api = StubApi::new();
        api.add_location("Homebody", "R", 0.5, 0.0, &[(ResourceType::Utility, 9)]);
        api.add_location("OnTheWay", "R", 1.5, 0.0, &[(ResourceType::Utility, 9)]);
        // Proximity order (distance to home) would put Homebody first.
        let mut candidates = vec![
            location("Homebody", "R", 0.5, 0.0),
            location("OnTheWay", "R", 1.5, 0.0),
        ];
        let event = emergency("Afar", "Elsewhere", 2.0, 0.0, &[(ResourceType::Utility, 1)]);

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(outcome.fully_resolved);
        assert_eq!(candidates[0].city, "OnTheWay");
        let dispatches = api.dispatches.lock().unwrap();
        assert_eq!(dispatches[0].resource, ResourceType::Utility);
        assert_eq!(dispatches[0].source_city, "OnTheWay");
        assert_eq!(dispatches[0].target_city, "Afar");
    }

    #[tokio::test]
    async fn an_event_without_needs_resolves_immediately() {
        let api = StubApi::new();
        api.add_location("Idle", "R", 1.0, 0.0, &[(ResourceType::Fire, 2)]);
        let mut candidates = vec![location("Idle", "R", 1.0, 0.0)];
        let event = emergency("Quiet", "R", 1.0, 1.0, &[]);

        let outcome = solve(&api, HOME, HOME_COUNTY, &event, &mut candidates).await;

        assert!(outcome.fully_resolved);
        assert!(api.dispatches.lock().unwrap().is_empty());
    }
}
