//! Real São Paulo locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use serde_json::{Value, json};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Headquarters
// ============================================================================

pub const HEADQUARTERS: Location =
    Location::new("Av. Paulista, 1578, São Paulo", -23.5613, -46.6565);

// ============================================================================
// Delivery addresses
// ============================================================================

pub const DELIVERIES: &[Location] = &[
    Location::new("Rua Augusta, 1500, São Paulo", -23.5568, -46.6602),
    Location::new("Rua Oscar Freire, 900, São Paulo", -23.5631, -46.6722),
    Location::new("Praça da Sé, São Paulo", -23.5503, -46.6339),
    Location::new("Rua 25 de Março, 1000, São Paulo", -23.5420, -46.6310),
    Location::new("Av. Brigadeiro Faria Lima, 2232, São Paulo", -23.5776, -46.6870),
    Location::new("Rua dos Pinheiros, 500, São Paulo", -23.5652, -46.6821),
];

/// Delivery addresses as the form's newline-separated text.
pub fn delivery_text(locations: &[Location]) -> String {
    locations
        .iter()
        .map(|location| location.name)
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Response builders
// ============================================================================

fn stop(location: &Location, km: f64, minutes: u32) -> Value {
    json!({
        "address": location.name,
        "lat": location.lat,
        "lng": location.lng,
        "distanceFromPreviousStopKm": km,
        "minutesFromStart": minutes
    })
}

/// A closed tour from headquarters through `deliveries` and back, with a
/// fixed leg length and leg time.
pub fn closed_tour(driver_id: u32, deliveries: &[Location], leg_km: f64, leg_minutes: u32) -> Value {
    let mut stops = vec![stop(&HEADQUARTERS, 0.0, 0)];
    let mut clock = 0;
    for delivery in deliveries {
        clock += leg_minutes;
        stops.push(stop(delivery, leg_km, clock));
    }
    clock += leg_minutes;
    stops.push(stop(&HEADQUARTERS, leg_km, clock));

    json!({
        "driverId": driver_id,
        "estimatedTimeMinutes": clock,
        "stops": stops
    })
}

/// `{"routes": [...]}` as raw response text.
pub fn response(routes: Vec<Value>) -> String {
    json!({ "routes": routes }).to_string()
}
