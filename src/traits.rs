//! Core seams for the delivery planner.
//!
//! The planning service and the durable store are external collaborators.
//! These traits keep them swappable so the session can be driven by the
//! real HTTP adapter, a file store, or in-memory fakes in tests.

use crate::error::PlannerError;
use crate::request::PlanRequest;

/// The external AI planner that geocodes, clusters and orders stops.
///
/// Returns the raw response text; interpretation belongs to
/// [`crate::normalize`].
pub trait PlanningService {
    fn generate(&self, request: &PlanRequest) -> Result<String, PlannerError>;
}

impl<T: PlanningService + ?Sized> PlanningService for &T {
    fn generate(&self, request: &PlanRequest) -> Result<String, PlannerError> {
        (**self).generate(request)
    }
}

impl<T: PlanningService + ?Sized> PlanningService for Box<T> {
    fn generate(&self, request: &PlanRequest) -> Result<String, PlannerError> {
        (**self).generate(request)
    }
}

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PlannerError>;

    /// Overwrites any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PlannerError>;

    fn remove(&mut self, key: &str) -> Result<(), PlannerError>;
}
