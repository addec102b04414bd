//! Plan data model shared by the request builder, normalizer, store and views.
//!
//! Field names follow the planner's JSON contract (`camelCase`), which is also
//! the persisted plan format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Service duration used when a saved plan predates the field.
pub const DEFAULT_STOP_DURATION: &str = "5";

/// One waypoint in a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// Distance from the preceding stop; 0 for the first stop.
    pub distance_from_previous_stop_km: f64,
    /// Cumulative travel plus service time since leaving the depot.
    pub minutes_from_start: u32,
}

impl Stop {
    /// Coordinates as a (lat, lng) tuple.
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// One driver's closed tour, depot to depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub driver_id: u32,
    pub estimated_time_minutes: u32,
    pub stops: Vec<Stop>,
}

impl Route {
    /// First and last stops are the depot.
    pub fn is_depot_index(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.stops.len()
    }

}

/// Traffic condition offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficCondition {
    Light,
    #[default]
    Moderate,
    Heavy,
}

impl TrafficCondition {
    pub const ALL: [TrafficCondition; 3] = [Self::Light, Self::Moderate, Self::Heavy];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }
}

impl fmt::Display for TrafficCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TrafficCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|condition| condition.label() == wanted)
            .ok_or_else(|| format!("unknown traffic condition {s:?} (expected light, moderate, or heavy)"))
    }
}

/// Raw form inputs, kept verbatim so a saved plan reloads exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanForm {
    pub hq_address: String,
    /// Newline-separated free text.
    pub delivery_addresses: String,
    pub driver_count: String,
    #[serde(default = "default_stop_duration", deserialize_with = "stop_duration_or_default")]
    pub stop_duration: String,
    pub traffic_condition: TrafficCondition,
}

fn default_stop_duration() -> String {
    DEFAULT_STOP_DURATION.to_string()
}

/// Older saves may carry `null` or `""` for the duration.
fn stop_duration_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(default_stop_duration))
}

impl Default for PlanForm {
    fn default() -> Self {
        Self {
            hq_address: String::new(),
            delivery_addresses: String::new(),
            driver_count: "1".to_string(),
            stop_duration: default_stop_duration(),
            traffic_condition: TrafficCondition::default(),
        }
    }
}

impl PlanForm {
    pub fn trimmed_hq(&self) -> &str {
        self.hq_address.trim()
    }

    /// Delivery addresses split on line breaks, blank lines dropped.
    pub fn delivery_list(&self) -> Vec<String> {
        self.delivery_addresses
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A complete optimization result plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(flatten)]
    pub form: PlanForm,
    pub routes: Vec<Route>,
}
