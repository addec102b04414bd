//! Orchestrator: wires form submission, route selection, save and load to the
//! request builder, normalizer, route store, storage and views.
//!
//! State machine:
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Ready
//!   ▲                  │  ▲             │
//!   │ (invalid form)   │  └──submit─────┘
//!   └──────────────────│──────────┐
//!                      └──fail──▶ Error ──submit──▶ Submitting
//! ```
//!
//! A submission is split into [`Session::begin_submit`] and
//! [`Session::complete_submit`] so a front end can await the service call
//! between them; a second `begin_submit` in that window is rejected.
//! [`Session::submit`] runs both around a blocking service call.

use crate::error::{NO_SAVED_PLAN_MESSAGE, PlannerError};
use crate::model::{Plan, PlanForm, Route};
use crate::normalize::{NormalizeOptions, normalize_response_with};
use crate::render::chart::{ChartPanel, ChartView};
use crate::render::listing::{
    DetailPanel, RouteCard, RouteOption, project_cards, project_detail, route_options,
};
use crate::render::map::MapCanvas;
use crate::request::{PlanRequest, request_for_form};
use crate::storage::PlanStorage;
use crate::store::RouteStore;
use crate::traits::{KeyValueStore, PlanningService};

pub const SUBMIT_LABEL: &str = "Optimize Routes";
pub const SUBMITTING_LABEL: &str = "Optimizing...";
pub const SAVED_NOTICE: &str = "Saved!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    /// Carries the error-panel message.
    Error(String),
    Ready,
}

/// Transient message outside the error panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Blocking message, e.g. form validation or an unreadable saved plan.
    Alert(String),
    /// Informational, e.g. nothing saved yet.
    Info(String),
    Saved,
    /// Low-priority: saving failed but nothing else is affected.
    SaveFailed(String),
}

pub struct Session<S, K> {
    service: S,
    storage: PlanStorage<K>,
    options: NormalizeOptions,
    state: SessionState,
    form: PlanForm,
    routes: RouteStore,
    selected: Option<u32>,
    map: MapCanvas,
    chart: ChartPanel,
    cards: Vec<RouteCard>,
    detail: Option<DetailPanel>,
    notice: Option<Notice>,
}

impl<S: PlanningService, K: KeyValueStore> Session<S, K> {
    pub fn new(service: S, storage: PlanStorage<K>) -> Self {
        Self {
            service,
            storage,
            options: NormalizeOptions::default(),
            state: SessionState::Idle,
            form: PlanForm::default(),
            routes: RouteStore::new(),
            selected: None,
            map: MapCanvas::new(),
            chart: ChartPanel::new(),
            cards: Vec::new(),
            detail: None,
            notice: None,
        }
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    // -------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------

    /// Validate, request, normalize and render in one blocking step.
    pub fn submit(&mut self, form: PlanForm) -> Result<&[Route], PlannerError> {
        let request = self.begin_submit(form)?;
        let response = self.service.generate(&request);
        self.complete_submit(response)
    }

    /// Enter `Submitting` and return the request to send.
    ///
    /// An invalid form leaves the state untouched and raises an alert.
    pub fn begin_submit(&mut self, form: PlanForm) -> Result<PlanRequest, PlannerError> {
        if self.state == SessionState::Submitting {
            tracing::warn!("ignoring submission while another is in flight");
            return Err(PlannerError::SubmissionInFlight);
        }

        let request = match request_for_form(&form) {
            Ok(request) => request,
            Err(err) => {
                tracing::info!(error = %err, "form rejected");
                self.notice = Some(Notice::Alert(err.user_message().to_string()));
                return Err(err);
            }
        };

        self.form = form;
        self.state = SessionState::Submitting;
        self.clear_results();
        tracing::info!(
            deliveries = self.form.delivery_list().len(),
            drivers = %self.form.driver_count,
            traffic = %self.form.traffic_condition,
            "submitting plan request"
        );
        Ok(request)
    }

    /// Feed the service outcome back in and leave `Submitting`.
    pub fn complete_submit(
        &mut self,
        response: Result<String, PlannerError>,
    ) -> Result<&[Route], PlannerError> {
        if self.state != SessionState::Submitting {
            return Err(PlannerError::NoPendingSubmission);
        }

        let routes = response.and_then(|text| normalize_response_with(&text, self.options));
        match routes {
            Ok(routes) => self.show_routes(routes),
            Err(err) => Err(self.fail(err)),
        }
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// Redraw the map and detail panel for another route. The chart and
    /// cards are left alone.
    pub fn select_route(&mut self, driver_id: u32) -> Result<&DetailPanel, PlannerError> {
        if self.state != SessionState::Ready {
            return Err(PlannerError::NotReady);
        }
        let route = self
            .routes
            .select_by_driver_id(driver_id)
            .ok_or(PlannerError::UnknownRoute(driver_id))?;

        self.map.draw(route);
        self.selected = Some(driver_id);
        tracing::debug!(driver_id, "route selected");
        Ok(self.detail.insert(project_detail(route)))
    }

    // -------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------

    /// Save the form and current routes. Failures only raise a notice.
    pub fn save(&mut self) -> Result<(), PlannerError> {
        if self.state != SessionState::Ready {
            return Err(PlannerError::NotReady);
        }

        let plan = Plan {
            form: self.form.clone(),
            routes: self.routes.current().to_vec(),
        };
        match self.storage.save(&plan) {
            Ok(()) => {
                self.notice = Some(Notice::Saved);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "saving plan failed");
                self.notice = Some(Notice::SaveFailed(err.user_message().to_string()));
                Err(err)
            }
        }
    }

    /// Restore the saved plan into the form and views.
    ///
    /// `Ok(None)` when nothing is saved. A corrupted plan is deleted and
    /// reported without touching the current state.
    pub fn load(&mut self) -> Result<Option<&[Route]>, PlannerError> {
        if self.state == SessionState::Submitting {
            return Err(PlannerError::SubmissionInFlight);
        }

        let plan = match self.storage.load() {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                self.notice = Some(Notice::Info(NO_SAVED_PLAN_MESSAGE.to_string()));
                return Ok(None);
            }
            Err(err) => {
                self.notice = Some(Notice::Alert(err.user_message().to_string()));
                return Err(err);
            }
        };

        tracing::info!(routes = plan.routes.len(), "restoring saved plan");
        self.form = plan.form;
        self.show_routes(plan.routes).map(Some)
    }

    // -------------------------------------------------------------------
    // View state
    // -------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_busy() { SUBMITTING_LABEL } else { SUBMIT_LABEL }
    }

    pub fn save_visible(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn error_panel(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn form(&self) -> &PlanForm {
        &self.form
    }

    pub fn routes(&self) -> &[Route] {
        self.routes.current()
    }

    pub fn selected_driver(&self) -> Option<u32> {
        self.selected
    }

    pub fn route_options(&self) -> Vec<RouteOption> {
        route_options(self.routes.current())
    }

    pub fn cards(&self) -> &[RouteCard] {
        &self.cards
    }

    pub fn detail_panel(&self) -> Option<&DetailPanel> {
        self.detail.as_ref()
    }

    pub fn map(&self) -> &MapCanvas {
        &self.map
    }

    pub fn chart(&self) -> Option<&ChartView> {
        self.chart.current()
    }

    pub fn chart_panel(&self) -> &ChartPanel {
        &self.chart
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn storage(&self) -> &PlanStorage<K> {
        &self.storage
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn show_routes(&mut self, routes: Vec<Route>) -> Result<&[Route], PlannerError> {
        let replaced = self.routes.replace(routes).map(|_| ());
        if let Err(err) = replaced {
            return Err(self.fail(err));
        }
        self.render_results();
        self.state = SessionState::Ready;
        tracing::info!(routes = self.routes.current().len(), "plan ready");
        Ok(self.routes.current())
    }

    /// Redraw every projection and select the lowest driver id.
    fn render_results(&mut self) {
        let routes = self.routes.current();

        self.map.ensure_base();
        self.chart.render(routes);
        self.cards = project_cards(routes);

        match routes.first() {
            Some(first) => {
                self.selected = Some(first.driver_id);
                self.map.draw(first);
                self.detail = Some(project_detail(first));
            }
            None => {
                self.selected = None;
                self.map.clear_overlay();
                self.detail = None;
            }
        }
    }

    fn clear_results(&mut self) {
        self.routes.clear();
        self.selected = None;
        self.cards.clear();
        self.detail = None;
        self.map.clear_overlay();
        self.chart.destroy();
    }

    fn fail(&mut self, err: PlannerError) -> PlannerError {
        tracing::error!(error = %err, "optimization failed");
        self.clear_results();
        self.state = SessionState::Error(err.user_message().to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    struct Fixed(&'static str);

    impl PlanningService for Fixed {
        fn generate(&self, _request: &PlanRequest) -> Result<String, PlannerError> {
            Ok(self.0.to_string())
        }
    }

    const TWO_ROUTES: &str = r#"{"routes":[
        {"driverId":2,"estimatedTimeMinutes":40,"stops":[
            {"address":"HQ","lat":-23.55,"lng":-46.63,"distanceFromPreviousStopKm":0,"minutesFromStart":0},
            {"address":"B","lat":-23.56,"lng":-46.64,"distanceFromPreviousStopKm":2.0,"minutesFromStart":20},
            {"address":"HQ","lat":-23.55,"lng":-46.63,"distanceFromPreviousStopKm":2.0,"minutesFromStart":40}]},
        {"driverId":1,"estimatedTimeMinutes":30,"stops":[
            {"address":"HQ","lat":-23.55,"lng":-46.63,"distanceFromPreviousStopKm":0,"minutesFromStart":0},
            {"address":"A","lat":-23.54,"lng":-46.62,"distanceFromPreviousStopKm":1.5,"minutesFromStart":15},
            {"address":"HQ","lat":-23.55,"lng":-46.63,"distanceFromPreviousStopKm":1.5,"minutesFromStart":30}]}
    ]}"#;

    fn form() -> PlanForm {
        PlanForm {
            hq_address: "HQ".to_string(),
            delivery_addresses: "A\nB".to_string(),
            driver_count: "2".to_string(),
            ..PlanForm::default()
        }
    }

    fn session(response: &'static str) -> Session<Fixed, MemoryStore> {
        Session::new(Fixed(response), PlanStorage::new(MemoryStore::new()))
    }

    #[test]
    fn starts_idle() {
        let session = session(TWO_ROUTES);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.submit_label(), SUBMIT_LABEL);
        assert!(!session.save_visible());
        assert!(session.map().base().is_none());
    }

    #[test]
    fn submit_selects_lowest_driver() {
        let mut session = session(TWO_ROUTES);
        let ids: Vec<u32> = session.submit(form()).unwrap().iter().map(|r| r.driver_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.selected_driver(), Some(1));
        assert_eq!(session.detail_panel().unwrap().driver_id, 1);
        assert_eq!(session.map().overlay().unwrap().driver_id, 1);
        assert!(session.save_visible());
    }

    #[test]
    fn invalid_form_keeps_state() {
        let mut session = session(TWO_ROUTES);
        let err = session.submit(PlanForm::default()).unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(matches!(session.notice(), Some(Notice::Alert(_))));
    }

    #[test]
    fn second_begin_is_rejected_while_in_flight() {
        let mut session = session(TWO_ROUTES);
        session.begin_submit(form()).unwrap();
        assert!(session.is_busy());
        assert_eq!(session.submit_label(), SUBMITTING_LABEL);
        assert!(matches!(session.begin_submit(form()), Err(PlannerError::SubmissionInFlight)));
        session.complete_submit(Ok(TWO_ROUTES.to_string())).unwrap();
        assert!(!session.is_busy());
    }

    #[test]
    fn complete_without_begin_is_rejected() {
        let mut session = session(TWO_ROUTES);
        let err = session.complete_submit(Ok(TWO_ROUTES.to_string())).unwrap_err();
        assert!(matches!(err, PlannerError::NoPendingSubmission));
    }

    #[test]
    fn selection_leaves_chart_alone() {
        let mut session = session(TWO_ROUTES);
        session.submit(form()).unwrap();
        let builds = session.chart_panel().builds();

        let detail = session.select_route(2).unwrap();
        assert_eq!(detail.driver_id, 2);
        assert_eq!(session.selected_driver(), Some(2));
        assert_eq!(session.map().overlay().unwrap().driver_id, 2);
        assert_eq!(session.chart_panel().builds(), builds);

        assert!(matches!(session.select_route(9), Err(PlannerError::UnknownRoute(9))));
        assert_eq!(session.selected_driver(), Some(2));
    }

    #[test]
    fn select_before_ready_is_refused() {
        let mut session = session(TWO_ROUTES);
        assert!(matches!(session.select_route(1), Err(PlannerError::NotReady)));
    }

    #[test]
    fn failure_clears_results() {
        let mut session = session(TWO_ROUTES);
        session.submit(form()).unwrap();

        session.begin_submit(form()).unwrap();
        let err = session
            .complete_submit(Err(PlannerError::ServiceCall("timeout".to_string())))
            .unwrap_err();
        assert!(err.is_optimization_failure());
        assert!(session.routes().is_empty());
        assert!(session.chart().is_none());
        assert!(session.cards().is_empty());
        assert!(session.error_panel().is_some());
        assert!(!session.save_visible());
    }

    #[test]
    fn save_outside_ready_is_a_no_op() {
        let mut session = session(TWO_ROUTES);
        assert!(matches!(session.save(), Err(PlannerError::NotReady)));
        assert!(!session.storage().store().contains(crate::storage::LAST_PLAN_KEY));
    }

    #[test]
    fn save_raises_saved_notice() {
        let mut session = session(TWO_ROUTES);
        session.submit(form()).unwrap();
        session.save().unwrap();
        assert_eq!(session.take_notice(), Some(Notice::Saved));
        assert!(session.notice().is_none());
    }
}
