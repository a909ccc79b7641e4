//! The home feed: every user's posts, shuffled on each load, with the
//! viewer's own posts dropped.

use std::sync::Arc;

use rand::{seq::SliceRandom, Rng};

use crate::{
    api::{ApiClient, ApiError},
    auth::AuthService,
    models::Post,
};

pub struct FeedService {
    api: Arc<ApiClient>,
    auth: Arc<AuthService>,
}

impl FeedService {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthService>) -> Self {
        Self { api, auth }
    }

    /// Fetches the feed scoped to the signed-in viewer (the backend uses the
    /// viewer id to mark per-viewer like state). Works signed out too; the
    /// feed is then unfiltered.
    pub async fn load(&self) -> Result<Vec<Post>, ApiError> {
        let viewer_id = self.auth.current_user().map(|user| user.id);
        let posts = self.api.fetch_all_posts(viewer_id).await?;
        Ok(arrange(posts, viewer_id, &mut rand::thread_rng()))
    }
}

fn arrange(mut posts: Vec<Post>, viewer_id: Option<i64>, rng: &mut impl Rng) -> Vec<Post> {
    posts.shuffle(rng);
    if let Some(viewer_id) = viewer_id {
        posts.retain(|post| post.user_id != viewer_id);
    }
    posts
}
