use serde::Serialize;

/// One tile in a dashboard's stats grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
    pub change: Option<&'static str>,
}

impl StatCard {
    pub fn new(title: &'static str, value: impl ToString) -> Self {
        Self {
            title,
            value: value.to_string(),
            change: None,
        }
    }

    pub fn with_change(mut self, change: &'static str) -> Self {
        self.change = Some(change);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickAction {
    pub title: &'static str,
    pub description: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Down => "Down",
        }
    }

    pub fn indicator_class(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "dot dot-green",
            HealthStatus::Degraded => "dot dot-yellow",
            HealthStatus::Down => "dot dot-red",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub service_name: &'static str,
    pub status: HealthStatus,
}
