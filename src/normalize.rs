//! Plan response normalization.
//!
//! The service is asked for JSON but sometimes wraps it in code fences (or
//! escaped variants of them). This module strips that markup and
//! deserializes the payload strictly: any missing or mistyped field is a
//! [`PlannerError::MalformedResponse`]. An absent or empty `routes` array is
//! returned as an empty vector; the route store decides that it is an error.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::PlannerError;
use crate::model::Route;

/// Fence openers, longest first so `json` tags are consumed with the fence.
const FENCE_OPENERS: &[&str] = &[
    "```json", "```JSON", "```", "'''json", "'''", "\\`\\`\\`json", "\\`\\`\\`",
];
const FENCE_CLOSERS: &[&str] = &["```", "'''", "\\`\\`\\`"];

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Also check route invariants the service is trusted with.
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    #[serde(default)]
    routes: Option<Vec<Route>>,
}

/// Remove surrounding whitespace and enclosing code-fence markup.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    loop {
        let before = text;
        if let Some(rest) = FENCE_OPENERS.iter().find_map(|fence| text.strip_prefix(fence)) {
            text = rest.trim_start();
        }
        if let Some(rest) = FENCE_CLOSERS.iter().find_map(|fence| text.strip_suffix(fence)) {
            text = rest.trim_end();
        }
        if text == before {
            return text;
        }
    }
}

/// Parse raw service text into routes without semantic checks.
pub fn normalize_response(raw: &str) -> Result<Vec<Route>, PlannerError> {
    normalize_response_with(raw, NormalizeOptions::default())
}

pub fn normalize_response_with(
    raw: &str,
    options: NormalizeOptions,
) -> Result<Vec<Route>, PlannerError> {
    let payload = strip_code_fences(raw);
    if payload.is_empty() {
        return Err(PlannerError::MalformedResponse("empty response".to_string()));
    }

    let parsed: PlanResponse = serde_json::from_str(payload).map_err(|err| {
        tracing::warn!(error = %err, payload_len = payload.len(), "planner response did not parse");
        PlannerError::MalformedResponse(err.to_string())
    })?;

    let routes = parsed.routes.unwrap_or_default();
    if options.strict {
        check_route_invariants(&routes)?;
    }

    tracing::debug!(routes = routes.len(), "normalized planner response");
    Ok(routes)
}

/// Checks the invariants the service is trusted with: unique positive driver
/// ids, depot at both ends, coordinates in range, non-negative legs and
/// non-decreasing cumulative minutes.
pub fn check_route_invariants(routes: &[Route]) -> Result<(), PlannerError> {
    let mut seen = HashSet::new();

    for route in routes {
        let id = route.driver_id;
        if id == 0 {
            return Err(malformed("driver id must be positive".to_string()));
        }
        if !seen.insert(id) {
            return Err(malformed(format!("duplicate driver id {id}")));
        }

        let (Some(first), Some(last)) = (route.stops.first(), route.stops.last()) else {
            return Err(malformed(format!("route {id} has no stops")));
        };
        if route.stops.len() < 2 {
            return Err(malformed(format!("route {id} does not return to the depot")));
        }
        if first.address.trim() != last.address.trim() {
            return Err(malformed(format!(
                "route {id} starts at {:?} but ends at {:?}",
                first.address, last.address
            )));
        }

        let mut previous_minutes = 0;
        for (index, stop) in route.stops.iter().enumerate() {
            if stop.address.trim().is_empty() {
                return Err(malformed(format!("route {id} stop {index} has no address")));
            }
            if !(-90.0..=90.0).contains(&stop.lat) || !(-180.0..=180.0).contains(&stop.lng) {
                return Err(malformed(format!(
                    "route {id} stop {index} has coordinates out of range ({}, {})",
                    stop.lat, stop.lng
                )));
            }
            if !stop.distance_from_previous_stop_km.is_finite()
                || stop.distance_from_previous_stop_km < 0.0
            {
                return Err(malformed(format!("route {id} stop {index} has a negative leg")));
            }
            if stop.minutes_from_start < previous_minutes {
                return Err(malformed(format!(
                    "route {id} stop {index} goes back in time ({} < {previous_minutes})",
                    stop.minutes_from_start
                )));
            }
            previous_minutes = stop.minutes_from_start;
        }
    }

    Ok(())
}

fn malformed(reason: String) -> PlannerError {
    PlannerError::MalformedResponse(reason)
}
