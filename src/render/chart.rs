//! Time-distribution chart: one bar per route.

use serde_json::{Value, json};

use crate::model::Route;

pub const CHART_TITLE: &str = "Estimated Time per Driver";
pub const DATASET_LABEL: &str = "Estimated time (minutes)";
pub const Y_AXIS_TITLE: &str = "Minutes";
pub const BAR_FILL: &str = "rgba(255, 107, 0, 0.6)";
pub const BAR_BORDER: &str = "rgba(255, 107, 0, 1)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub minutes: Vec<u32>,
}

pub fn project_chart(routes: &[Route]) -> ChartView {
    ChartView {
        labels: routes.iter().map(|route| driver_label(route.driver_id)).collect(),
        minutes: routes.iter().map(|route| route.estimated_time_minutes).collect(),
    }
}

pub fn driver_label(driver_id: u32) -> String {
    format!("Driver {driver_id}")
}

impl ChartView {
    pub fn bar_count(&self) -> usize {
        self.labels.len()
    }

    /// Bar chart configuration for a browser charting front end.
    pub fn to_config(&self) -> Value {
        json!({
            "type": "bar",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": DATASET_LABEL,
                    "data": self.minutes,
                    "backgroundColor": BAR_FILL,
                    "borderColor": BAR_BORDER,
                    "borderWidth": 1
                }]
            },
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": {
                    "legend": { "display": false },
                    "title": {
                        "display": true,
                        "text": CHART_TITLE,
                        "font": { "size": 16 },
                        "padding": { "bottom": 15 }
                    }
                },
                "scales": {
                    "y": {
                        "beginAtZero": true,
                        "title": { "display": true, "text": Y_AXIS_TITLE }
                    }
                }
            }
        })
    }

    /// Horizontal text bars scaled so the longest is `width` cells.
    pub fn render_text(&self, width: usize) -> String {
        let max = self.minutes.iter().copied().max().unwrap_or(0);
        let label_width = self.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut out = format!("{CHART_TITLE}\n");
        for (label, &minutes) in self.labels.iter().zip(&self.minutes) {
            let cells = if max == 0 {
                0
            } else {
                (minutes as usize * width).div_ceil(max as usize)
            };
            out.push_str(&format!(
                "{label:<label_width$} | {} {minutes} min\n",
                "#".repeat(cells)
            ));
        }
        out
    }
}

/// Holds the current chart. Every render destroys the previous chart and
/// builds a new one.
#[derive(Debug, Clone, Default)]
pub struct ChartPanel {
    chart: Option<ChartView>,
    builds: usize,
}

impl ChartPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, routes: &[Route]) -> &ChartView {
        self.destroy();
        self.builds += 1;
        self.chart.insert(project_chart(routes))
    }

    pub fn destroy(&mut self) {
        self.chart = None;
    }

    pub fn current(&self) -> Option<&ChartView> {
        self.chart.as_ref()
    }

    /// Number of charts built so far.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(driver_id: u32, minutes: u32) -> Route {
        Route {
            driver_id,
            estimated_time_minutes: minutes,
            stops: Vec::new(),
        }
    }

    #[test]
    fn one_bar_per_route() {
        let chart = project_chart(&[route(1, 30), route(2, 90)]);
        assert_eq!(chart.labels, vec!["Driver 1", "Driver 2"]);
        assert_eq!(chart.minutes, vec![30, 90]);
        assert_eq!(chart.to_config()["data"]["datasets"][0]["data"], json!([30, 90]));
    }

    #[test]
    fn text_bars_scale_to_width() {
        let text = project_chart(&[route(1, 30), route(2, 60)]).render_text(10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CHART_TITLE);
        assert_eq!(lines[1], "Driver 1 | ##### 30 min");
        assert_eq!(lines[2], "Driver 2 | ########## 60 min");
    }

    #[test]
    fn render_recreates_chart() {
        let mut panel = ChartPanel::new();
        panel.render(&[route(1, 10)]);
        panel.render(&[route(1, 10), route(2, 20)]);
        assert_eq!(panel.builds(), 2);
        assert_eq!(panel.current().map(ChartView::bar_count), Some(2));
        panel.destroy();
        assert!(panel.current().is_none());
    }
}
