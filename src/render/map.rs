//! Map projection: markers plus a path for one route.
//!
//! The base map is created once, lazily, and outlives route switches. Each
//! draw discards the previous overlay entirely.

use geo_types::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;

use crate::model::Route;
use crate::polyline::{Bounds, Polyline};
use crate::render::DEPOT_GLYPH;

pub const DEFAULT_CENTER: (f64, f64) = (-23.5505, -46.6333);
pub const DEFAULT_ZOOM: u8 = 12;
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
pub const PATH_COLOR: &str = "#FF6B00";
pub const PATH_WEIGHT: u32 = 4;
/// Fraction of the path span added around it when framing the view.
pub const FIT_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Depot,
    /// Visit order, starting at 1.
    Delivery(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// (lat, lng)
    pub position: (f64, f64),
    pub kind: MarkerKind,
    pub address: String,
}

impl Marker {
    pub fn icon_text(&self) -> String {
        match self.kind {
            MarkerKind::Depot => DEPOT_GLYPH.to_string(),
            MarkerKind::Delivery(n) => n.to_string(),
        }
    }

    pub fn popup_title(&self) -> String {
        match self.kind {
            MarkerKind::Depot => "Headquarters".to_string(),
            MarkerKind::Delivery(n) => format!("Stop {n}"),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            MarkerKind::Depot => "depot",
            MarkerKind::Delivery(_) => "delivery",
        }
    }

    fn css_class(&self) -> &'static str {
        match self.kind {
            MarkerKind::Depot => "marker-icon hq-marker",
            MarkerKind::Delivery(_) => "marker-icon delivery-marker",
        }
    }
}

/// Everything drawn on top of the base map for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub driver_id: u32,
    pub markers: Vec<Marker>,
    pub path: Polyline,
    /// Padded path bounds; `None` when the route has no stops.
    pub view: Option<Bounds>,
}

pub fn project_route(route: &Route) -> RouteOverlay {
    let markers = route
        .stops
        .iter()
        .enumerate()
        .map(|(index, stop)| Marker {
            position: stop.location(),
            kind: if route.is_depot_index(index) {
                MarkerKind::Depot
            } else {
                MarkerKind::Delivery(index)
            },
            address: stop.address.clone(),
        })
        .collect();

    let path = Polyline::from_route(route);
    let view = path.bounds().map(|bounds| bounds.pad(FIT_PADDING));

    RouteOverlay {
        driver_id: route.driver_id,
        markers,
        path,
        view,
    }
}

impl RouteOverlay {
    /// Markers as `Point` features, then the path as a `LineString`.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features: Vec<Feature> = self
            .markers
            .iter()
            .map(|marker| {
                let point = Point::new(marker.position.1, marker.position.0);
                feature(
                    Geometry::new(geojson::Value::from(&point)),
                    properties(json!({
                        "driverId": self.driver_id,
                        "kind": marker.kind_name(),
                        "icon": marker.icon_text(),
                        "className": marker.css_class(),
                        "title": marker.popup_title(),
                        "address": marker.address,
                    })),
                )
            })
            .collect();

        if !self.path.is_empty() {
            let line = self.path.to_line_string();
            features.push(feature(
                Geometry::new(geojson::Value::from(&line)),
                properties(json!({
                    "driverId": self.driver_id,
                    "kind": "path",
                    "color": PATH_COLOR,
                    "weight": PATH_WEIGHT,
                })),
            ));
        }

        FeatureCollection {
            bbox: self.view.map(|b| vec![b.south_west.1, b.south_west.0, b.north_east.1, b.north_east.0]),
            features,
            foreign_members: None,
        }
    }
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn properties(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// Tile layer and initial view.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMap {
    pub center: (f64, f64),
    pub zoom: u8,
    pub tile_url: &'static str,
    pub attribution: &'static str,
}

impl Default for BaseMap {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: TILE_URL,
            attribution: TILE_ATTRIBUTION,
        }
    }
}

/// The long-lived map surface.
#[derive(Debug, Clone, Default)]
pub struct MapCanvas {
    base: Option<BaseMap>,
    overlay: Option<RouteOverlay>,
    base_inits: usize,
}

impl MapCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the base map on first use; later calls are no-ops.
    pub fn ensure_base(&mut self) -> &BaseMap {
        if self.base.is_none() {
            tracing::debug!("initializing base map");
            self.base_inits += 1;
        }
        self.base.get_or_insert_with(BaseMap::default)
    }

    /// Replace the overlay with the given route. Nothing is drawn before the
    /// base map exists.
    pub fn draw(&mut self, route: &Route) -> Option<&RouteOverlay> {
        self.base.as_ref()?;
        self.overlay = Some(project_route(route));
        self.overlay.as_ref()
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn base(&self) -> Option<&BaseMap> {
        self.base.as_ref()
    }

    pub fn overlay(&self) -> Option<&RouteOverlay> {
        self.overlay.as_ref()
    }

    /// How many times the base map was created. Stays at 1 once rendered.
    pub fn base_inits(&self) -> usize {
        self.base_inits
    }
}
