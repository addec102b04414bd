//! In-memory holder of the active routes.

use crate::error::PlannerError;
use crate::model::Route;

/// Single source of truth for every view. Routes are kept sorted by
/// ascending driver id.
#[derive(Debug, Clone, Default)]
pub struct RouteStore {
    routes: Vec<Route>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active routes.
    ///
    /// An empty input clears the store and returns [`PlannerError::EmptyPlan`];
    /// prior routes are not kept around next to an error.
    pub fn replace(&mut self, mut routes: Vec<Route>) -> Result<&[Route], PlannerError> {
        if routes.is_empty() {
            self.routes.clear();
            return Err(PlannerError::EmptyPlan);
        }

        routes.sort_by_key(|route| route.driver_id);
        self.routes = routes;
        Ok(&self.routes)
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn current(&self) -> &[Route] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn select_by_driver_id(&self, driver_id: u32) -> Option<&Route> {
        self.routes.iter().find(|route| route.driver_id == driver_id)
    }

    /// Default selection: the lowest driver id.
    pub fn first(&self) -> Option<&Route> {
        self.routes.first()
    }
}
