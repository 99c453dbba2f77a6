pub mod article;
pub mod dashboard;
pub mod profile;
pub mod session_user;
pub mod ticket;

pub use article::KnowledgeBaseArticle;
pub use dashboard::{HealthStatus, QuickAction, ServiceHealth, StatCard};
pub use profile::{NewUserProfile, UserProfile};
pub use session_user::{ProfileUpdate, Role, SessionUser, UnknownRole};
pub use ticket::{Ticket, TicketPriority, TicketStatus};
