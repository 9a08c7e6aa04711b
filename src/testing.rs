//! In-memory test double for the simulation authority.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use crate::api::traits::SimulationApi;
use crate::api::types::{EmergencyEvent, Location, RawLocation, ResourceType};

/// Scripted `SimulationApi` backed by in-memory inventory. Dispatches debit
/// the source inventory, so multi-round tests observe the same drift a real
/// run would.
#[derive(Default)]
pub struct StubApi {
    discovery: Mutex<HashMap<ResourceType, Vec<RawLocation>>>,
    inventory: Mutex<HashMap<(String, String, ResourceType), i64>>,
    events: Mutex<VecDeque<EmergencyEvent>>,
    pub dispatches: Mutex<Vec<DispatchRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub resource: ResourceType,
    pub source_city: String,
    pub target_city: String,
    pub quantity: i64,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location with its starting inventory. It appears in the
    /// discovery payload of every resource type named in `stock`, including
    /// types it currently holds zero of.
    pub fn add_location(
        &self,
        city: &str,
        county: &str,
        latitude: f64,
        longitude: f64,
        stock: &[(ResourceType, i64)],
    ) {
        let mut discovery = self.discovery.lock().unwrap();
        let mut inventory = self.inventory.lock().unwrap();
        for &(resource, quantity) in stock {
            inventory.insert((city.to_string(), county.to_string(), resource), quantity);
            discovery.entry(resource).or_default().push(RawLocation {
                city: city.to_string(),
                county: county.to_string(),
                latitude,
                longitude,
                quantity,
            });
        }
    }

    pub fn push_event(&self, event: EmergencyEvent) {
        self.events.lock().unwrap().push_back(event);
    }

    /// Current inventory, for assertions.
    pub fn quantity(&self, city: &str, county: &str, resource: ResourceType) -> i64 {
        self.inventory
            .lock()
            .unwrap()
            .get(&(city.to_string(), county.to_string(), resource))
            .copied()
            .unwrap_or(0)
    }
}

impl SimulationApi for StubApi {
    async fn reset(&self) -> Option<String> {
        Some("ok".to_string())
    }

    async fn stop(&self) -> Option<String> {
        Some("stopped".to_string())
    }

    async fn next_event(&self) -> Option<EmergencyEvent> {
        self.events.lock().unwrap().pop_front()
    }

    async fn discover(&self, resource: ResourceType) -> Vec<RawLocation> {
        self.discovery
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    async fn quantity_at(&self, resource: ResourceType, city: &str, county: &str) -> i64 {
        self.inventory
            .lock()
            .unwrap()
            .get(&(city.to_string(), county.to_string(), resource))
            .copied()
            .unwrap_or(0)
    }

    async fn dispatch(
        &self,
        resource: ResourceType,
        source: &Location,
        target: &EmergencyEvent,
        quantity: i64,
    ) -> bool {
        let key = (source.city.clone(), source.county.clone(), resource);
        let mut inventory = self.inventory.lock().unwrap();
        let held = inventory.get(&key).copied().unwrap_or(0);
        if quantity <= 0 || held < quantity {
            return false;
        }
        inventory.insert(key, held - quantity);
        drop(inventory);

        self.dispatches.lock().unwrap().push(DispatchRecord {
            resource,
            source_city: source.city.clone(),
            target_city: target.city.clone(),
            quantity,
        });
        true
    }
}

/// A directory entry with empty advisory stock.
pub fn location(city: &str, county: &str, latitude: f64, longitude: f64) -> Location {
    Location {
        city: city.to_string(),
        county: county.to_string(),
        latitude,
        longitude,
        stock: BTreeMap::new(),
    }
}

/// An emergency with the given positive needs.
pub fn emergency(
    city: &str,
    county: &str,
    latitude: f64,
    longitude: f64,
    needs: &[(ResourceType, i64)],
) -> EmergencyEvent {
    EmergencyEvent {
        city: city.to_string(),
        county: county.to_string(),
        latitude,
        longitude,
        needs: needs.iter().copied().collect(),
    }
}
