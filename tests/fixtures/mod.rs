//! Test fixtures for delivery-planner.
//!
//! Provides realistic test data including:
//! - Real São Paulo locations (from OpenStreetMap)
//! - Builders for planner responses shaped like the service's JSON

#![allow(dead_code)]

pub mod sao_paulo_locations;

pub use sao_paulo_locations::*;
