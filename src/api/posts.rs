use std::path::Path;

use reqwest::{multipart, Method};
use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::models::Post;

#[derive(Deserialize)]
struct ImageUpload {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

impl ApiClient {
    /// Feed payload. Passing the viewer lets the backend mark per-viewer
    /// like state.
    pub async fn fetch_all_posts(&self, viewer_id: Option<i64>) -> Result<Vec<Post>, ApiError> {
        let path = match viewer_id {
            Some(id) => format!("/posts?viewerId={id}"),
            None => "/posts".to_string(),
        };
        self.get(&path).await
    }

    pub async fn fetch_nailed_posts(&self, user_id: i64) -> Result<Vec<Post>, ApiError> {
        self.get(&format!("/posts/nailed/{user_id}")).await
    }

    pub async fn create_post(
        &self,
        user_id: i64,
        goal_id: i64,
        image_url: &str,
        description: &str,
    ) -> Result<Post, ApiError> {
        self.send_json(
            Method::POST,
            "/posts",
            &serde_json::json!({
                "user_id": user_id,
                "goal_id": goal_id,
                "image_url": image_url,
                "description": description,
            }),
        )
        .await
    }

    /// Uploads a local image and returns the URL the backend stored it at.
    pub async fn upload_post_image(&self, image: &Path) -> Result<String, ApiError> {
        let part = Self::image_part(image).await?;
        let form = multipart::Form::new().part("image", part);
        let uploaded: ImageUpload = self.send_multipart("/posts/upload-image", form).await?;
        Ok(uploaded.image_url)
    }
}
