use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::models::Notification;

impl ApiClient {
    pub async fn fetch_notifications(&self, user_id: i64) -> Result<Vec<Notification>, ApiError> {
        self.get(&format!("/notifications/{user_id}")).await
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::PUT, &format!("/notifications/{notification_id}/read"))
            .await?;
        Ok(())
    }

    pub async fn delete_notification(&self, notification_id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/notifications/{notification_id}"))
            .await?;
        Ok(())
    }
}
