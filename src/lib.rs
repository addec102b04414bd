//! delivery-planner core
//!
//! Turns a headquarters address, a list of delivery addresses and a driver
//! count into per-driver closed tours by asking an external AI planning
//! service, then projects the result into map, chart and listing views.

pub mod config;
pub mod error;
pub mod gemini;
pub mod model;
pub mod normalize;
pub mod polyline;
pub mod render;
pub mod request;
pub mod session;
pub mod storage;
pub mod store;
pub mod traits;
