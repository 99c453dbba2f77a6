use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published help article listed on the customer dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub helpful_count: i64,
    pub published_at: Option<DateTime<Utc>>,
}

impl KnowledgeBaseArticle {
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category.trim())
    }
}
