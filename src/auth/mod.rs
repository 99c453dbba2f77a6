pub mod gate;
pub mod handlers;
pub mod middleware;

pub use gate::{login_url, GateDecision, PageGate, ADMIN_ONLY, CUSTOMER_ONLY};
pub use middleware::CurrentSession;
