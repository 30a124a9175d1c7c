use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use super::models::{
    AuthResponse, ConsumptionRecord, IssuedToken, LoginRequest, Meter, NewConsumption, NewMeter,
    SignupRequest, UserInfo, UserSummary,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status(),
            ApiError::Rejected(_) => None,
        }
    }
}

/// HTTP client for the smart meter backend.
///
/// Every request runs to completion or failure; nothing is retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`; paths are joined under `/api`.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        ApiClient {
            client: builder.build().unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// The backend expects the raw token, without a `Bearer ` prefix.
    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header(reqwest::header::AUTHORIZATION, token)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ApiError::Status { status, message });
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let request = self.authorized(self.client.get(self.url(path)), token);
        Self::read_json(request.send().await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.authorized(self.client.post(self.url(path)), token).json(body);
        Self::read_json(request.send().await?).await
    }

    /// Like [`post`](Self::post) but ignores the response body.
    async fn post_unit<B: Serialize>(&self, path: &str, token: &str, body: &B) -> Result<(), ApiError> {
        let request = self.authorized(self.client.post(self.url(path)), token).json(body);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ApiError::Status { status, message });
        }
        Ok(())
    }

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_error: &str,
    ) -> Result<IssuedToken, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<AuthResponse>().await {
                Ok(body) => body.error.or(body.message),
                Err(_) => None,
            };
            return Err(ApiError::Status {
                status,
                message: message.unwrap_or_else(|| default_error.to_string()),
            });
        }

        // A 2xx without a token is still a refusal.
        let body = response.json::<AuthResponse>().await?;
        match body.token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(IssuedToken {
                token,
                message: body.message,
            }),
            None => Err(ApiError::Rejected(
                body.error.unwrap_or_else(|| default_error.to_string()),
            )),
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<IssuedToken, ApiError> {
        tracing::debug!(username = %request.username, "Submitting login");
        self.authenticate("auth/login", request, "Login failed").await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<IssuedToken, ApiError> {
        tracing::debug!(username = %request.username, "Submitting signup");
        self.authenticate("auth/signup", request, "Signup failed").await
    }

    pub async fn get_user(&self, token: &str) -> Result<UserInfo, ApiError> {
        self.get("user/get_user", token).await
    }

    pub async fn update_user(&self, token: &str, user: &UserInfo) -> Result<UserInfo, ApiError> {
        self.post("user/update_user", token, user).await
    }

    pub async fn get_all_users(&self, token: &str) -> Result<Vec<UserSummary>, ApiError> {
        self.get("user/get_all", token).await
    }

    pub async fn get_meters(&self, token: &str) -> Result<Vec<Meter>, ApiError> {
        self.get("meters/get_data", token).await
    }

    pub async fn add_meter(&self, token: &str, meter: &NewMeter) -> Result<(), ApiError> {
        self.post_unit("meters/add_meter", token, meter).await
    }

    pub async fn get_consumption(&self, token: &str) -> Result<Vec<ConsumptionRecord>, ApiError> {
        self.get("consumption/get_data", token).await
    }

    pub async fn add_consumption(
        &self,
        token: &str,
        reading: &NewConsumption,
    ) -> Result<(), ApiError> {
        self.post_unit("consumption/add_data", token, reading).await
    }

    pub async fn update_consumption(
        &self,
        token: &str,
        record: &ConsumptionRecord,
    ) -> Result<ConsumptionRecord, ApiError> {
        self.post("consumption/update_data", token, record).await
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}
