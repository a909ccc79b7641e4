use async_trait::async_trait;
use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::{
    goal::GoalBackend,
    models::{Goal, GoalStatus, Post},
};

impl ApiClient {
    pub async fn create_goal(
        &self,
        user_id: i64,
        title: &str,
        duration_minutes: u32,
    ) -> Result<Goal, ApiError> {
        self.send_json(
            Method::POST,
            "/goals",
            &serde_json::json!({
                "user_id": user_id,
                "title": title,
                "duration": duration_minutes,
            }),
        )
        .await
    }

    pub async fn update_goal_status(
        &self,
        goal_id: i64,
        status: GoalStatus,
    ) -> Result<Goal, ApiError> {
        self.send_json(
            Method::PATCH,
            &format!("/goals/{goal_id}"),
            &serde_json::json!({ "status": status.as_str() }),
        )
        .await
    }

    pub async fn fetch_goals(&self, user_id: i64) -> Result<Vec<Goal>, ApiError> {
        self.get(&format!("/goals/{user_id}")).await
    }
}

#[async_trait]
impl GoalBackend for ApiClient {
    async fn create_goal(
        &self,
        user_id: i64,
        title: &str,
        duration_minutes: u32,
    ) -> Result<Goal, ApiError> {
        ApiClient::create_goal(self, user_id, title, duration_minutes).await
    }

    async fn update_goal_status(&self, goal_id: i64, status: GoalStatus) -> Result<(), ApiError> {
        ApiClient::update_goal_status(self, goal_id, status)
            .await
            .map(|_| ())
    }

    async fn create_post(
        &self,
        user_id: i64,
        goal_id: i64,
        image_url: &str,
        description: &str,
    ) -> Result<Post, ApiError> {
        ApiClient::create_post(self, user_id, goal_id, image_url, description).await
    }
}
