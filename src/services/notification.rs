use reqwest::Method;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::Notification;

pub struct NotificationService<'a> {
    api: &'a ApiClient,
}

impl<'a> NotificationService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        NotificationService { api }
    }

    // GET /notifications
    pub async fn list(&self) -> Result<Vec<Notification>, ClientError> {
        self.api
            .call(Method::GET, "notifications", "notifications", "fetching")
            .send()
            .await
    }

    // PUT /notifications/{id}/read
    pub async fn mark_read(&self, notification_id: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .api
            .call(
                Method::PUT,
                format!("notifications/{notification_id}/read"),
                "notification",
                "marking read",
            )
            .json(&serde_json::json!({}))?
            .send()
            .await?;
        Ok(())
    }
}
