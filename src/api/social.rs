//! Likes, comments, bookmarks and followers: thin pass-throughs over the
//! backend routes, auth-gated where the original client gated them.

use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::models::{Comment, Post, User};

#[derive(Deserialize)]
struct LikeCount {
    count: i64,
}

#[derive(Deserialize)]
struct LikeStatus {
    liked: bool,
}

#[derive(Deserialize)]
struct BookmarkRef {
    id: i64,
}

impl ApiClient {
    // --- likes ---

    pub async fn like_count(&self, post_id: i64) -> Result<i64, ApiError> {
        let count: LikeCount = self.get(&format!("/likes/{post_id}/count")).await?;
        Ok(count.count)
    }

    pub async fn like_status(&self, post_id: i64, user_id: i64) -> Result<bool, ApiError> {
        let status: LikeStatus = self
            .get(&format!("/likes/{post_id}/status/{user_id}"))
            .await?;
        Ok(status.liked)
    }

    pub async fn like_post(&self, user_id: i64, post_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_json(
                Method::POST,
                "/likes",
                &serde_json::json!({ "user_id": user_id, "post_id": post_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn unlike_post(&self, user_id: i64, post_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/likes/{post_id}/{user_id}"))
            .await?;
        Ok(())
    }

    // --- comments ---

    pub async fn fetch_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.get(&format!("/comments/{post_id}")).await
    }

    pub async fn add_comment(
        &self,
        user_id: i64,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, ApiError> {
        self.send_json(
            Method::POST,
            "/comments",
            &serde_json::json!({ "user_id": user_id, "post_id": post_id, "content": content }),
        )
        .await
    }

    pub async fn edit_comment(&self, comment_id: i64, content: &str) -> Result<Comment, ApiError> {
        self.send_json(
            Method::PATCH,
            &format!("/comments/{comment_id}"),
            &serde_json::json!({ "content": content }),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/comments/{comment_id}"))
            .await?;
        Ok(())
    }

    // --- bookmarks ---

    pub async fn bookmark_post(&self, user_id: i64, post_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_json(
                Method::POST,
                "/bookmarks",
                // This route predates the snake_case convention.
                &serde_json::json!({ "userId": user_id, "postId": post_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn unbookmark_post(&self, user_id: i64, post_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/bookmarks/{user_id}/{post_id}"))
            .await?;
        Ok(())
    }

    pub async fn bookmarked_post_ids(&self, user_id: i64) -> Result<Vec<i64>, ApiError> {
        self.require_token()?;
        let refs: Vec<BookmarkRef> = self.get(&format!("/bookmarks/{user_id}")).await?;
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    pub async fn bookmarked_posts(&self, user_id: i64) -> Result<Vec<Post>, ApiError> {
        self.require_token()?;
        self.get(&format!("/bookmarks/{user_id}/detailed")).await
    }

    // --- followers ---

    pub async fn fetch_followers(&self, user_id: i64) -> Result<Vec<User>, ApiError> {
        self.require_token()?;
        self.get(&format!("/followers/followers/{user_id}")).await
    }

    pub async fn follow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_json(
                Method::POST,
                "/followers",
                &serde_json::json!({ "follower_id": follower_id, "following_id": following_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn unfollow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_json(
                Method::DELETE,
                "/followers",
                &serde_json::json!({ "follower_id": follower_id, "following_id": following_id }),
            )
            .await?;
        Ok(())
    }
}
