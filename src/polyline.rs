//! Polyline representation for route paths.
//!
//! A route's stops, in visiting order, become the path drawn on the map.
//! Points are (latitude, longitude); conversion to GeoJSON's (x, y) order
//! happens in [`Polyline::to_line_string`].

use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::model::Route;

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// South-west corner (lat, lng).
    pub south_west: (f64, f64),
    /// North-east corner (lat, lng).
    pub north_east: (f64, f64),
}

impl Bounds {
    /// Grow the box by `ratio` of its span on every side.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = (self.north_east.0 - self.south_west.0).abs() * ratio;
        let lng_buffer = (self.north_east.1 - self.south_west.1).abs() * ratio;
        Self {
            south_west: (self.south_west.0 - lat_buffer, self.south_west.1 - lng_buffer),
            north_east: (self.north_east.0 + lat_buffer, self.north_east.1 + lng_buffer),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.south_west.0 + self.north_east.0) / 2.0,
            (self.south_west.1 + self.north_east.1) / 2.0,
        )
    }

    pub fn contains(&self, point: (f64, f64)) -> bool {
        (self.south_west.0..=self.north_east.0).contains(&point.0)
            && (self.south_west.1..=self.north_east.1).contains(&point.1)
    }
}

/// A path through coordinates in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Path through every stop of the route, depot to depot.
    pub fn from_route(route: &Route) -> Self {
        Self::new(route.stops.iter().map(|stop| stop.location()).collect())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest box containing every point, `None` for an empty path.
    pub fn bounds(&self) -> Option<Bounds> {
        let (first, rest) = self.points.split_first()?;
        let mut bounds = Bounds {
            south_west: *first,
            north_east: *first,
        };
        for &(lat, lng) in rest {
            bounds.south_west.0 = bounds.south_west.0.min(lat);
            bounds.south_west.1 = bounds.south_west.1.min(lng);
            bounds.north_east.0 = bounds.north_east.0.max(lat);
            bounds.north_east.1 = bounds.north_east.1.max(lng);
        }
        Some(bounds)
    }

    /// GeoJSON-ordered line (x = lng, y = lat).
    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(
            self.points
                .iter()
                .map(|&(lat, lng)| Coord { x: lng, y: lat })
                .collect(),
        )
    }
}
