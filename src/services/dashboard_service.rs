use crate::models::{
    HealthStatus, KnowledgeBaseArticle, QuickAction, ServiceHealth, StatCard, Ticket,
    TicketPriority, TicketStatus,
};
use chrono::{Duration, Utc};

/// Fixed figures behind the dashboards. Every call builds fresh data; nothing
/// is fetched from the backend or cached.
#[derive(Clone, Debug, Default)]
pub struct DashboardService;

pub struct AdminOverview {
    pub stats: Vec<StatCard>,
    pub recent_tickets: Vec<Ticket>,
    pub total_users: i64,
    pub knowledge_base_articles: i64,
    pub active_workflows: i64,
}

pub struct CustomerOverview {
    pub stats: Vec<StatCard>,
    pub recent_tickets: Vec<Ticket>,
    pub articles: Vec<KnowledgeBaseArticle>,
    pub categories: Vec<String>,
}

pub struct PortalOverview {
    pub stats: Vec<StatCard>,
    pub quick_actions: Vec<QuickAction>,
    pub system_health: Vec<ServiceHealth>,
}

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    pub fn admin_overview(&self) -> AdminOverview {
        AdminOverview {
            stats: vec![
                StatCard::new("Total Tickets", 156),
                StatCard::new("Open Tickets", 23),
                StatCard::new("Resolved Tickets", 133),
                StatCard::new("Avg Resolution Time", "2.5h"),
                StatCard::new("Customer Satisfaction", "4.2/5"),
            ],
            recent_tickets: vec![
                ticket(
                    "1",
                    "Login Issue",
                    "Unable to access account after password reset",
                    TicketStatus::Open,
                    TicketPriority::High,
                    0,
                ),
                ticket(
                    "2",
                    "Password Reset",
                    "Reset email never arrived",
                    TicketStatus::InProgress,
                    TicketPriority::Medium,
                    1,
                ),
                ticket(
                    "3",
                    "Feature Request",
                    "Export tickets to CSV",
                    TicketStatus::Resolved,
                    TicketPriority::Low,
                    2,
                ),
            ],
            total_users: 45,
            knowledge_base_articles: 28,
            active_workflows: 12,
        }
    }

    /// Customer view. `category` narrows the article list; matching ignores case.
    pub fn customer_overview(&self, category: Option<&str>) -> CustomerOverview {
        let articles = knowledge_base();
        let mut categories: Vec<String> = Vec::new();
        for article in &articles {
            if !categories.contains(&article.category) {
                categories.push(article.category.clone());
            }
        }

        let articles = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(wanted) => articles
                .into_iter()
                .filter(|article| article.in_category(wanted))
                .collect(),
            None => articles,
        };

        CustomerOverview {
            stats: vec![
                StatCard::new("My Tickets", 5),
                StatCard::new("Open Tickets", 2),
                StatCard::new("Resolved Tickets", 3),
                StatCard::new("Avg Response Time", "1.8h"),
            ],
            recent_tickets: vec![
                ticket(
                    "1",
                    "Account Access Issue",
                    "Cannot log into my account",
                    TicketStatus::Open,
                    TicketPriority::High,
                    0,
                ),
                ticket(
                    "2",
                    "Feature Request",
                    "Would like to see dark mode",
                    TicketStatus::InProgress,
                    TicketPriority::Medium,
                    1,
                ),
            ],
            articles,
            categories,
        }
    }

    pub fn portal_overview(&self) -> PortalOverview {
        PortalOverview {
            stats: vec![
                StatCard::new("Total Users", "1,234").with_change("+12%"),
                StatCard::new("Active Tickets", 89).with_change("-5%"),
                StatCard::new("Knowledge Articles", 456).with_change("+8%"),
                StatCard::new("System Uptime", "99.9%").with_change("+0.1%"),
            ],
            quick_actions: vec![
                QuickAction {
                    title: "User Management",
                    description: "Manage users, roles, and permissions",
                    href: "/admin/users",
                },
                QuickAction {
                    title: "Knowledge Base",
                    description: "Create and manage help articles",
                    href: "/admin/knowledge",
                },
                QuickAction {
                    title: "Workflows",
                    description: "Automate support processes",
                    href: "/admin/workflows",
                },
                QuickAction {
                    title: "Analytics",
                    description: "View reports and insights",
                    href: "/admin/analytics",
                },
                QuickAction {
                    title: "AI Assistant",
                    description: "Configure AI-powered support",
                    href: "/admin/ai",
                },
                QuickAction {
                    title: "Settings",
                    description: "System configuration",
                    href: "/admin/settings",
                },
            ],
            system_health: vec![
                ServiceHealth {
                    service_name: "Database",
                    status: HealthStatus::Healthy,
                },
                ServiceHealth {
                    service_name: "API",
                    status: HealthStatus::Healthy,
                },
                ServiceHealth {
                    service_name: "AI Services",
                    status: HealthStatus::Degraded,
                },
                ServiceHealth {
                    service_name: "Storage",
                    status: HealthStatus::Healthy,
                },
            ],
        }
    }
}

fn ticket(
    id: &str,
    title: &str,
    description: &str,
    status: TicketStatus,
    priority: TicketPriority,
    days_ago: i64,
) -> Ticket {
    Ticket {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        status,
        priority,
        created_at: Utc::now() - Duration::days(days_ago),
    }
}

fn knowledge_base() -> Vec<KnowledgeBaseArticle> {
    let article = |id: &str, title: &str, content: &str, category: &str, views: i64| {
        KnowledgeBaseArticle {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            tags: vec![category.to_lowercase()],
            view_count: views,
            helpful_count: views / 2,
            published_at: Some(Utc::now()),
        }
    };

    vec![
        article(
            "1",
            "Getting Started Guide",
            "Learn how to use our platform effectively",
            "Getting Started",
            15,
        ),
        article(
            "2",
            "Troubleshooting Common Issues",
            "Solutions to frequently encountered problems",
            "Support",
            23,
        ),
        article(
            "3",
            "Best Practices",
            "Tips for getting the most out of our services",
            "Tips",
            8,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_overview_figures() {
        let overview = DashboardService::new().admin_overview();
        assert_eq!(overview.stats[0].value, "156");
        assert_eq!(overview.stats[1].value, "23");
        assert_eq!(overview.stats[3].value, "2.5h");
        assert_eq!(overview.total_users, 45);
        assert_eq!(overview.recent_tickets.len(), 3);
        assert_eq!(overview.recent_tickets[1].status, TicketStatus::InProgress);
    }

    #[test]
    fn test_customer_category_filter() {
        let service = DashboardService::new();

        let all = service.customer_overview(None);
        assert_eq!(all.articles.len(), 3);
        assert_eq!(all.categories, vec!["Getting Started", "Support", "Tips"]);

        let support = service.customer_overview(Some("support"));
        assert_eq!(support.articles.len(), 1);
        assert_eq!(support.articles[0].title, "Troubleshooting Common Issues");
        assert_eq!(support.categories.len(), 3);

        assert!(service.customer_overview(Some("Billing")).articles.is_empty());
        assert_eq!(service.customer_overview(Some("  ")).articles.len(), 3);
    }

    #[test]
    fn test_portal_health_reports_degraded_ai() {
        let overview = DashboardService::new().portal_overview();
        let ai = overview
            .system_health
            .iter()
            .find(|s| s.service_name == "AI Services")
            .unwrap();
        assert_eq!(ai.status, HealthStatus::Degraded);
        assert_eq!(overview.quick_actions.len(), 6);
    }
}
