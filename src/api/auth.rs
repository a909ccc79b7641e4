use std::path::Path;

use reqwest::{multipart, Method};
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};
use crate::models::User;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetChallenge {
    #[serde(rename = "resetToken")]
    pub reset_token: String,
    pub message: String,
}

#[derive(Deserialize)]
struct TokenCheck {
    valid: bool,
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl Acknowledgement {
    /// Some auth routes answer 200 with an `error` field instead of a
    /// failure status; normalize that into a rejection.
    fn into_result(self) -> Result<Option<String>, ApiError> {
        match self.error {
            Some(error) => Err(ApiError::Rejected {
                status: 400,
                message: error,
            }),
            None => Ok(self.message),
        }
    }
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
    email: &'a str,
    #[serde(rename = "newPassword")]
    new_password: &'a str,
    reset_token: u32,
}

#[derive(Serialize)]
struct PasswordCheckBody<'a> {
    email: &'a str,
    #[serde(rename = "currentPassword")]
    current_password: &'a str,
}

#[derive(Serialize)]
struct ChangePasswordBody<'a> {
    email: &'a str,
    #[serde(rename = "currentPassword")]
    current_password: &'a str,
    #[serde(rename = "newPassword")]
    new_password: &'a str,
}

impl ApiClient {
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/signup",
            &serde_json::json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Checks the currently held bearer token against the backend.
    pub async fn verify_token(&self) -> Result<bool, ApiError> {
        self.require_token()?;
        let check: TokenCheck = self
            .send_empty(Method::POST, "/auth/verify-token")
            .await?;
        Ok(check.valid)
    }

    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<PasswordResetChallenge, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/forgot-password",
            &serde_json::json!({ "email": email }),
        )
        .await
    }

    pub async fn verify_reset_code(&self, email: &str, reset_token: u32) -> Result<String, ApiError> {
        let ack: Acknowledgement = self
            .send_json(
                Method::POST,
                "/auth/verify-code",
                &serde_json::json!({ "email": email, "reset_token": reset_token }),
            )
            .await?;
        Ok(ack.into_result()?.unwrap_or_default())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: u32,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let ack: Acknowledgement = self
            .send_json(
                Method::PATCH,
                "/auth/reset-password",
                &ResetPasswordBody {
                    email,
                    new_password,
                    reset_token,
                },
            )
            .await?;
        Ok(ack.into_result()?.unwrap_or_default())
    }

    pub async fn verify_current_password(
        &self,
        email: &str,
        current_password: &str,
    ) -> Result<(), ApiError> {
        let ack: Acknowledgement = self
            .send_json(
                Method::POST,
                "/auth/verify-current-password",
                &PasswordCheckBody {
                    email,
                    current_password,
                },
            )
            .await?;
        ack.into_result().map(|_| ())
    }

    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let ack: Acknowledgement = self
            .send_json(
                Method::PATCH,
                "/auth/change-password",
                &ChangePasswordBody {
                    email,
                    current_password,
                    new_password,
                },
            )
            .await?;
        ack.into_result().map(|_| ())
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.require_token()?;
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/auth/delete-user/{user_id}"))
            .await?;
        Ok(())
    }

    pub async fn fetch_profile(&self, user_id: i64) -> Result<User, ApiError> {
        self.get(&format!("/profile/{user_id}")).await
    }

    pub async fn update_profile(&self, user_id: i64, username: &str) -> Result<User, ApiError> {
        self.require_token()?;
        self.send_json(
            Method::PATCH,
            &format!("/profile/{user_id}"),
            &serde_json::json!({ "username": username }),
        )
        .await
    }

    pub async fn upload_profile_image(
        &self,
        user_id: i64,
        image: &Path,
    ) -> Result<User, ApiError> {
        self.require_token()?;
        let part = Self::image_part(image).await?;
        let form = multipart::Form::new().part("profileImage", part);
        self.send_multipart(&format!("/profile/{user_id}/image-upload"), form)
            .await
    }
}
