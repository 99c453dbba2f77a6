pub mod auth_service;
pub mod dashboard_service;

pub use auth_service::AuthService;
pub use dashboard_service::{AdminOverview, CustomerOverview, DashboardService, PortalOverview};
