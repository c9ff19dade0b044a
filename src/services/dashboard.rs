//! Cross-project aggregate queries for the dashboard page.

use reqwest::Method;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{DashboardTask, SearchResults};

const RESOURCE: &str = "dashboard";

pub struct DashboardService<'a> {
    api: &'a ApiClient,
}

impl<'a> DashboardService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        DashboardService { api }
    }

    async fn tasks(&self, section: &str, limit: u32) -> Result<Vec<DashboardTask>, ClientError> {
        self.api
            .call(Method::GET, format!("dashboard/{section}"), RESOURCE, "fetching")
            .query("limit", limit)
            .send()
            .await
    }

    pub async fn recently_assigned(&self, limit: u32) -> Result<Vec<DashboardTask>, ClientError> {
        self.tasks("recently-assigned", limit).await
    }

    pub async fn in_progress(&self, limit: u32) -> Result<Vec<DashboardTask>, ClientError> {
        self.tasks("in-progress", limit).await
    }

    pub async fn approaching_deadline(
        &self,
        limit: u32,
    ) -> Result<Vec<DashboardTask>, ClientError> {
        self.tasks("approaching-deadline", limit).await
    }

    /// Unified search over projects and tasks. The query is URL-encoded.
    pub async fn search(&self, query: &str) -> Result<SearchResults, ClientError> {
        self.api
            .call(Method::GET, "dashboard/search", RESOURCE, "searching")
            .query("query", query)
            .send()
            .await
    }
}
