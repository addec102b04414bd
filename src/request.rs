//! Plan request construction: prompt text plus the strict output schema.
//!
//! Pure logic, no I/O. Callers validate the form first with
//! [`validate_form`]; [`request_for_form`] does both.

use serde_json::{Value, json};

use crate::error::PlannerError;
use crate::model::{PlanForm, TrafficCondition};

/// Everything the external planner needs for one optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub prompt: String,
    /// Output schema in the service's type vocabulary.
    pub schema: Value,
}

/// Check the form before anything is sent to the service.
pub fn validate_form(form: &PlanForm) -> Result<(), PlannerError> {
    if form.trimmed_hq().is_empty() {
        return Err(PlannerError::Validation(
            "headquarters address is empty".to_string(),
        ));
    }
    if form.delivery_list().is_empty() {
        return Err(PlannerError::Validation(
            "no delivery addresses given".to_string(),
        ));
    }
    match form.driver_count.trim().parse::<u32>() {
        Ok(count) if count > 0 => {}
        _ => return Err(PlannerError::InvalidDriverCount(form.driver_count.clone())),
    }
    if form.stop_duration.trim().parse::<u32>().is_err() {
        return Err(PlannerError::InvalidStopDuration(form.stop_duration.clone()));
    }
    Ok(())
}

/// Validate the form and build the request from it.
pub fn request_for_form(form: &PlanForm) -> Result<PlanRequest, PlannerError> {
    validate_form(form)?;
    Ok(build_request(
        form.trimmed_hq(),
        &form.delivery_list(),
        form.driver_count.trim(),
        form.stop_duration.trim(),
        form.traffic_condition,
    ))
}

pub fn build_request(
    hq_address: &str,
    delivery_addresses: &[String],
    driver_count: &str,
    stop_duration: &str,
    traffic: TrafficCondition,
) -> PlanRequest {
    PlanRequest {
        prompt: build_prompt(hq_address, delivery_addresses, driver_count, stop_duration, traffic),
        schema: response_schema(),
    }
}

fn build_prompt(
    hq_address: &str,
    delivery_addresses: &[String],
    driver_count: &str,
    stop_duration: &str,
    traffic: TrafficCondition,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are a logistics optimization specialist for a food delivery company.\n\
         Your task is to take a headquarters address, a list of delivery addresses, \
         a number of drivers and a per-stop service duration, and return an optimized \
         delivery plan.\n\n",
    );

    prompt.push_str("Task details:\n");
    prompt.push_str(&format!("- Headquarters: \"{hq_address}\"\n"));
    prompt.push_str("- Delivery addresses:\n");
    for address in delivery_addresses {
        prompt.push_str(&format!("  - \"{address}\"\n"));
    }
    prompt.push_str(&format!("- Number of drivers: {driver_count}\n"));
    prompt.push_str(&format!(
        "- Service duration per delivery stop: {stop_duration} minutes.\n\n"
    ));

    prompt.push_str("Please carry out the following steps:\n");
    prompt.push_str(
        "1. For every address (headquarters and deliveries), find its geographic \
         coordinates (latitude, longitude).\n",
    );
    prompt.push_str(&format!(
        "2. Group the delivery addresses into exactly {driver_count} clusters based on \
         geographic proximity.\n"
    ));
    prompt.push_str(
        "3. For each cluster, determine the best delivery route starting at the \
         headquarters, visiting every address in the cluster and finally returning to \
         the headquarters. This is a Traveling Salesman Problem (TSP).\n",
    );
    prompt.push_str(&format!(
        "4. For each route, estimate the total time in minutes under \"{traffic}\" traffic \
         conditions. The total must include travel time PLUS total service time (number \
         of delivery stops multiplied by {stop_duration} minutes).\n"
    ));
    prompt.push_str(
        "5. For every stop on every route, include the distance in kilometers from the \
         *previous* stop and the cumulative time in minutes since the start \
         ('minutesFromStart'). For the first stop (headquarters) both values are 0. For \
         later stops, 'minutesFromStart' is the total time since leaving the \
         headquarters, including travel time UP TO the stop and the service time spent at \
         ALL PREVIOUS delivery stops.\n\n",
    );

    prompt.push_str(
        "Return the final plan as a single JSON object that follows the provided schema. \
         Every stop MUST include the address, the coordinates, the distance from the \
         previous leg and the cumulative time since the start.\n\
         The first and last stop of every route MUST be the headquarters address.\n",
    );

    prompt
}

/// Output schema the service must satisfy. All fields are required.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "routes": {
                "type": "ARRAY",
                "description": "Optimized routes, one per driver.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "driverId": { "type": "INTEGER" },
                        "estimatedTimeMinutes": { "type": "INTEGER" },
                        "stops": {
                            "type": "ARRAY",
                            "description": "Stops in optimized visiting order, each with all required metadata.",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "address": { "type": "STRING" },
                                    "lat": { "type": "NUMBER" },
                                    "lng": { "type": "NUMBER" },
                                    "distanceFromPreviousStopKm": {
                                        "type": "NUMBER",
                                        "description": "Distance in kilometers from the previous stop. 0 for the first stop (headquarters)."
                                    },
                                    "minutesFromStart": {
                                        "type": "INTEGER",
                                        "description": "Cumulative minutes from leaving the headquarters until arrival at this stop."
                                    }
                                },
                                "required": ["address", "lat", "lng", "distanceFromPreviousStopKm", "minutesFromStart"]
                            }
                        }
                    },
                    "required": ["driverId", "estimatedTimeMinutes", "stops"]
                }
            }
        },
        "required": ["routes"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(hq: &str, deliveries: &str) -> PlanForm {
        PlanForm {
            hq_address: hq.to_string(),
            delivery_addresses: deliveries.to_string(),
            driver_count: "2".to_string(),
            stop_duration: "7".to_string(),
            traffic_condition: TrafficCondition::Heavy,
        }
    }

    #[test]
    fn rejects_blank_hq() {
        let err = validate_form(&form("   ", "Rua A, 10")).unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
    }

    #[test]
    fn rejects_missing_deliveries() {
        let err = validate_form(&form("HQ", "\n  \n")).unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
    }

    #[test]
    fn rejects_zero_drivers() {
        let mut f = form("HQ", "Rua A");
        f.driver_count = "0".to_string();
        let err = validate_form(&f).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidDriverCount(ref raw) if raw == "0"));
    }

    #[test]
    fn rejects_non_numeric_stop_duration() {
        let mut f = form("HQ", "Rua A");
        f.stop_duration = "abc".to_string();
        let err = validate_form(&f).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidStopDuration(_)));
        assert_eq!(err.user_message(), crate::error::STOP_DURATION_MESSAGE);
    }

    #[test]
    fn prompt_lists_every_address_and_parameter() {
        let request = request_for_form(&form("Av. Paulista, 1000", "Rua A, 10\n\nRua B, 20")).unwrap();
        assert!(request.prompt.contains("- Headquarters: \"Av. Paulista, 1000\""));
        assert!(request.prompt.contains("  - \"Rua A, 10\"\n"));
        assert!(request.prompt.contains("  - \"Rua B, 20\"\n"));
        assert!(request.prompt.contains("exactly 2 clusters"));
        assert!(request.prompt.contains("7 minutes"));
        assert!(request.prompt.contains("\"heavy\" traffic"));
    }

    #[test]
    fn schema_requires_every_stop_field() {
        let schema = response_schema();
        let stop_required = &schema["properties"]["routes"]["items"]["properties"]["stops"]["items"]["required"];
        let fields: Vec<&str> = stop_required
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["address", "lat", "lng", "distanceFromPreviousStopKm", "minutesFromStart"]
        );
        assert_eq!(schema["required"], json!(["routes"]));
    }
}
