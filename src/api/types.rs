//! Domain and wire types shared between the client and the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of resource kinds tracked by the simulation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Medical,
    Fire,
    Police,
    Rescue,
    Utility,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Medical,
        ResourceType::Fire,
        ResourceType::Police,
        ResourceType::Rescue,
        ResourceType::Utility,
    ];

    /// Lowercase name, as used in the authority's URL path segments.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Fire => "fire",
            Self::Police => "police",
            Self::Rescue => "rescue",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    /// Case-insensitive; the event stream spells types capitalized
    /// (`"Medical"`) while URL paths use lowercase.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "medical" => Ok(Self::Medical),
            "fire" => Ok(Self::Fire),
            "police" => Ok(Self::Police),
            "rescue" => Ok(Self::Rescue),
            "utility" => Ok(Self::Utility),
            _ => Err(format!("unknown resource type: {value}")),
        }
    }
}

/// A supply location known to the simulation authority.
///
/// Identity is the `(city, county)` pair. `stock` holds last-observed
/// quantities per resource type and is advisory only: allocation decisions
/// always re-fetch live quantities through [`crate::api::SimulationApi`],
/// because concurrent simulation activity can change inventory between
/// rounds.
#[derive(Debug, Clone)]
pub struct Location {
    pub city: String,
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stock: BTreeMap<ResourceType, i64>,
}

impl Location {
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn is_same_place(&self, city: &str, county: &str) -> bool {
        self.city == city && self.county == county
    }
}

/// Discovery payload for one location, as returned by `/{resource}/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub quantity: i64,
}

impl RawLocation {
    /// Promote to a directory entry, recording the discovering type's
    /// reported quantity as the initial advisory stock.
    pub fn into_location(self, resource: ResourceType) -> Location {
        let mut stock = BTreeMap::new();
        stock.insert(resource, self.quantity);
        Location {
            city: self.city,
            county: self.county,
            latitude: self.latitude,
            longitude: self.longitude,
            stock,
        }
    }
}

/// One emergency pulled from `/calls/next`. Ephemeral: consumed by a single
/// solve pass and discarded.
#[derive(Debug, Clone)]
pub struct EmergencyEvent {
    pub city: String,
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Requested quantity per resource type; only positive entries are kept.
    pub needs: BTreeMap<ResourceType, i64>,
}

impl EmergencyEvent {
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Wire shape of `/calls/next`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDto {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub requests: Vec<ResourceRequestDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRequestDto {
    #[serde(rename = "Type", default)]
    pub resource: String,
    #[serde(rename = "Quantity", default)]
    pub quantity: i64,
}

impl From<EventDto> for EmergencyEvent {
    fn from(dto: EventDto) -> Self {
        let mut needs = BTreeMap::new();
        for request in dto.requests {
            // Unknown type names and non-positive quantities carry no need.
            let Ok(resource) = request.resource.parse::<ResourceType>() else {
                continue;
            };
            if request.quantity > 0 {
                needs.insert(resource, request.quantity);
            }
        }
        Self {
            city: dto.city,
            county: dto.county,
            latitude: dto.latitude,
            longitude: dto.longitude,
            needs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_parses_both_spellings() {
        assert_eq!("Medical".parse::<ResourceType>(), Ok(ResourceType::Medical));
        assert_eq!("fire".parse::<ResourceType>(), Ok(ResourceType::Fire));
        assert!("drone".parse::<ResourceType>().is_err());
    }

    #[test]
    fn event_parsing_keeps_only_positive_known_requests() {
        let dto: EventDto = serde_json::from_str(
            r#"{
                "city": "Sighetu Marmației",
                "county": "Maramureș",
                "latitude": 47.93,
                "longitude": 23.89,
                "requests": [
                    { "Type": "Medical", "Quantity": 4 },
                    { "Type": "Fire", "Quantity": 0 },
                    { "Type": "Police", "Quantity": -2 },
                    { "Type": "Drone", "Quantity": 9 }
                ]
            }"#,
        )
        .expect("event payload should parse");

        let event = EmergencyEvent::from(dto);
        assert_eq!(event.city, "Sighetu Marmației");
        assert_eq!(event.needs.len(), 1);
        assert_eq!(event.needs.get(&ResourceType::Medical), Some(&4));
    }
}
