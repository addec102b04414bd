//! Presentation projections of the route store.
//!
//! Each projection is a pure function of the routes it is given; the
//! long-lived surfaces ([`map::MapCanvas`], [`chart::ChartPanel`]) only hold
//! the last projection so a front end can draw it.

pub mod chart;
pub mod listing;
pub mod map;

/// Glyph used for depot markers and depot list entries.
pub const DEPOT_GLYPH: &str = "🏠";
