//! Error kinds surfaced by the planner.
//!
//! Every failure is caught at the [`crate::session::Session`] boundary and
//! turned into a single error-panel message via [`PlannerError::user_message`].

use thiserror::Error;

pub const VALIDATION_MESSAGE: &str =
    "Please fill in the headquarters address and at least one delivery address.";
pub const OPTIMIZATION_FAILED_MESSAGE: &str = "Optimization failed. Check that every address is valid and complete (e.g. Street, Number, City).";
pub const EMPTY_PLAN_MESSAGE: &str = "The planner returned no routes. Check that the addresses are valid or try again with different data.";
pub const CORRUPTED_STORAGE_MESSAGE: &str =
    "Could not load the plan. The saved data may be corrupted.";
pub const MISSING_API_KEY_MESSAGE: &str = "API key not found. Check the environment configuration.";
pub const NO_SAVED_PLAN_MESSAGE: &str = "No saved plan found.";
pub const DRIVER_COUNT_MESSAGE: &str = "The number of drivers must be a whole number greater than zero.";
pub const STOP_DURATION_MESSAGE: &str = "The stop duration must be a whole number of minutes.";
pub const STORAGE_READ_MESSAGE: &str = "Could not read the saved plan. Check the storage directory.";

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Missing or unusable form input. Never reaches the service.
    #[error("invalid form input: {0}")]
    Validation(String),

    #[error("driver count {0:?} is not a positive integer")]
    InvalidDriverCount(String),

    #[error("stop duration {0:?} is not a non-negative integer")]
    InvalidStopDuration(String),

    #[error("no API key configured for the planning service")]
    MissingApiKey,

    /// Network, HTTP status, or timeout failure calling the planner.
    #[error("planning service call failed: {0}")]
    ServiceCall(String),

    #[error("malformed planner response: {0}")]
    MalformedResponse(String),

    #[error("planner returned no routes")]
    EmptyPlan,

    #[error("saved plan is corrupted: {0}")]
    CorruptedStorage(String),

    /// The store could not be read; the saved value is left alone.
    #[error("failed to read saved plan: {0}")]
    StorageRead(String),

    /// Non-fatal: the plan could not be written.
    #[error("failed to write saved plan: {0}")]
    StorageWrite(String),

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("no submission is waiting for a response")]
    NoPendingSubmission,

    #[error("no route for driver {0}")]
    UnknownRoute(u32),

    #[error("no plan is ready")]
    NotReady,
}

impl PlannerError {
    /// Short human-readable text for the error panel.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => VALIDATION_MESSAGE,
            Self::InvalidDriverCount(_) => DRIVER_COUNT_MESSAGE,
            Self::InvalidStopDuration(_) => STOP_DURATION_MESSAGE,
            Self::MissingApiKey => MISSING_API_KEY_MESSAGE,
            Self::ServiceCall(_) | Self::MalformedResponse(_) => OPTIMIZATION_FAILED_MESSAGE,
            Self::EmptyPlan => EMPTY_PLAN_MESSAGE,
            Self::CorruptedStorage(_) => CORRUPTED_STORAGE_MESSAGE,
            Self::StorageRead(_) => STORAGE_READ_MESSAGE,
            Self::StorageWrite(_) => "The plan could not be saved.",
            Self::SubmissionInFlight => "An optimization is already running.",
            Self::NoPendingSubmission => "No optimization is running.",
            Self::UnknownRoute(_) => "That route is not part of the current plan.",
            Self::NotReady => "There is no plan to work with yet.",
        }
    }

    /// Whether this error moves the session into its `Error` state.
    pub fn is_optimization_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::ServiceCall(_) | Self::MalformedResponse(_) | Self::EmptyPlan
        )
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        PlannerError::ServiceCall(err.to_string())
    }
}
