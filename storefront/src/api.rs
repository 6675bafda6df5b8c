//! Remote API client
//!
//! [`RemoteApi`] is the seam between effects and the backend. [`HttpApi`]
//! is the production implementation; tests substitute a scripted stub.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{Category, CategoryId, Product, UserRef};

/// Successful login payload
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: UserRef,
}

/// OTP validation payload; `status == 1` means verified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct OtpResponse {
    pub status: i64,
}

impl OtpResponse {
    pub const VERIFIED: i64 = 1;

    pub fn is_verified(&self) -> bool {
        self.status == Self::VERIFIED
    }
}

#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn recommended(&self) -> Result<Vec<Product>, ApiError>;
    async fn bestsellers(&self) -> Result<Vec<Product>, ApiError>;
    async fn category_products(&self, category_id: CategoryId) -> Result<Vec<Product>, ApiError>;
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;
    async fn register(
        &self,
        email: &str,
        password: &str,
        accepted_terms: bool,
    ) -> Result<(), ApiError>;
    async fn verify_otp(&self, email: &str, otp: &str) -> Result<OtpResponse, ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    email_id: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Registration<'a> {
    email_id: &'a str,
    password: &'a str,
    accepted_terms: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OtpCheck<'a> {
    email_id: &'a str,
    otp: &'a str,
}

/// [`RemoteApi`] over HTTP with JSON bodies
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Every request made through this client fails after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "Request rejected");
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/categories").await
    }

    async fn recommended(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/recommended").await
    }

    async fn bestsellers(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/bestsellers").await
    }

    async fn category_products(&self, category_id: CategoryId) -> Result<Vec<Product>, ApiError> {
        self.get_json(&format!("/category-products/{category_id}"))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .post(
                "/login",
                &Credentials {
                    email_id: email,
                    password,
                },
            )
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        accepted_terms: bool,
    ) -> Result<(), ApiError> {
        self.post(
            "/register",
            &Registration {
                email_id: email,
                password,
                accepted_terms,
            },
        )
        .await?;
        Ok(())
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<OtpResponse, ApiError> {
        let response = self
            .post(
                "/otp-validation",
                &OtpCheck {
                    email_id: email,
                    otp,
                },
            )
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
