//! Textual listings: summary cards for every route, a detail panel for the
//! selected one, and the route selector options.

use std::fmt;

use crate::model::Route;
use crate::render::DEPOT_GLYPH;
use crate::render::chart::driver_label;

pub const STARTING_POINT: &str = "starting point";

/// Visit-order marker shown next to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    Depot,
    Visit(usize),
}

impl StepMarker {
    fn for_index(route: &Route, index: usize) -> Self {
        if route.is_depot_index(index) {
            StepMarker::Depot
        } else {
            StepMarker::Visit(index)
        }
    }
}

impl fmt::Display for StepMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepMarker::Depot => f.write_str(DEPOT_GLYPH),
            StepMarker::Visit(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOption {
    pub value: u32,
    pub label: String,
}

pub fn route_options(routes: &[Route]) -> Vec<RouteOption> {
    routes
        .iter()
        .map(|route| RouteOption {
            value: route.driver_id,
            label: driver_label(route.driver_id),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub marker: StepMarker,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCard {
    pub driver_id: u32,
    pub estimated_time_minutes: u32,
    pub entries: Vec<CardEntry>,
}

pub fn project_cards(routes: &[Route]) -> Vec<RouteCard> {
    routes.iter().map(project_card).collect()
}

pub fn project_card(route: &Route) -> RouteCard {
    RouteCard {
        driver_id: route.driver_id,
        estimated_time_minutes: route.estimated_time_minutes,
        entries: route
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| CardEntry {
                marker: StepMarker::for_index(route, index),
                address: stop.address.clone(),
            })
            .collect(),
    }
}

impl fmt::Display for RouteCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Driver {} Route", self.driver_id)?;
        writeln!(f, "Estimated time: {} minutes", self.estimated_time_minutes)?;
        for entry in &self.entries {
            writeln!(f, "  {:>3}  {}", entry.marker.to_string(), entry.address)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub marker: StepMarker,
    pub address: String,
    pub distance_text: String,
    pub time_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    pub driver_id: u32,
    pub rows: Vec<DetailRow>,
}

/// "starting point" for a zero first leg, otherwise "+D.D km".
pub fn distance_text(index: usize, km: f64) -> String {
    if index == 0 && km == 0.0 {
        STARTING_POINT.to_string()
    } else {
        format!("+{km:.1} km")
    }
}

pub fn project_detail(route: &Route) -> DetailPanel {
    DetailPanel {
        driver_id: route.driver_id,
        rows: route
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| DetailRow {
                marker: StepMarker::for_index(route, index),
                address: stop.address.clone(),
                distance_text: distance_text(index, stop.distance_from_previous_stop_km),
                time_text: format!("arrives at {} min", stop.minutes_from_start),
            })
            .collect(),
    }
}

impl fmt::Display for DetailPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Route {} Details", self.driver_id)?;
        for row in &self.rows {
            writeln!(f, "  {:>3}  {}", row.marker.to_string(), row.address)?;
            writeln!(f, "       {} \u{2022} {}", row.distance_text, row.time_text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stop;

    fn stop(address: &str, km: f64, minutes: u32) -> Stop {
        Stop {
            address: address.to_string(),
            lat: -23.5,
            lng: -46.6,
            distance_from_previous_stop_km: km,
            minutes_from_start: minutes,
        }
    }

    fn route() -> Route {
        Route {
            driver_id: 3,
            estimated_time_minutes: 52,
            stops: vec![
                stop("HQ", 0.0, 0),
                stop("Rua A, 10", 2.345, 9),
                stop("Rua B, 20", 0.0, 14),
                stop("HQ", 3.04, 26),
            ],
        }
    }

    #[test]
    fn zero_first_leg_is_starting_point() {
        assert_eq!(distance_text(0, 0.0), STARTING_POINT);
        assert_eq!(distance_text(2, 0.0), "+0.0 km");
        assert_eq!(distance_text(1, 2.345), "+2.3 km");
    }

    #[test]
    fn detail_rows_follow_stops() {
        let panel = project_detail(&route());
        let texts: Vec<&str> = panel.rows.iter().map(|r| r.distance_text.as_str()).collect();
        assert_eq!(texts, vec![STARTING_POINT, "+2.3 km", "+0.0 km", "+3.0 km"]);
        assert_eq!(panel.rows[3].time_text, "arrives at 26 min");
        assert_eq!(panel.rows[0].marker, StepMarker::Depot);
        assert_eq!(panel.rows[2].marker, StepMarker::Visit(2));
    }

    #[test]
    fn card_marks_depot_entries() {
        let card = project_card(&route());
        let markers: Vec<String> = card.entries.iter().map(|e| e.marker.to_string()).collect();
        assert_eq!(markers, vec![DEPOT_GLYPH, "1", "2", DEPOT_GLYPH]);
        let text = card.to_string();
        assert!(text.starts_with("Driver 3 Route\nEstimated time: 52 minutes\n"));
    }

    #[test]
    fn options_use_driver_labels() {
        let options = route_options(&[route()]);
        assert_eq!(
            options,
            vec![RouteOption {
                value: 3,
                label: "Driver 3".to_string()
            }]
        );
    }
}
