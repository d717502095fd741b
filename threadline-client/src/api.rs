//! Thin HTTP client over the Threadline API.

use anyhow::{Context, Result, bail};
use reqwest::{Client, Response};
use url::Url;

use shared::models::{
    AuthResponse, ChatRequest, ChatResponse, CreateThreadRequest, DeleteThreadResponse,
    ErrorResponse, LoginRequest, RenameThreadRequest, SignupRequest, ThreadDetail, ThreadSummary,
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Builds a client against `server` (e.g. `http://localhost:7000`).
    ///
    /// # Errors
    /// Fails when the server URL does not parse.
    pub fn new(server: &str) -> Result<Self> {
        let base = Url::parse(server).context("invalid server URL")?;
        Ok(Self {
            http: Client::new(),
            base,
            token: None,
        })
    }

    /// Attaches the bearer token used for authenticated routes.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid API path {path}"))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// # Errors
    /// Fails on transport errors or a non-success response.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("/api/auth/signup")?)
            .json(&body)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors or rejected credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("/api/auth/login")?)
            .json(&body)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors or a non-success response.
    pub async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        let request = self.authorized(self.http.get(self.endpoint("/api/thread")?));
        Ok(expect_success(request.send().await?).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors or when the thread does not exist.
    pub async fn get_thread(&self, id: &str) -> Result<ThreadDetail> {
        let request = self.authorized(self.http.get(self.endpoint(&format!("/api/thread/{id}"))?));
        Ok(expect_success(request.send().await?).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors or a non-success response.
    pub async fn create_thread(&self, title: Option<&str>) -> Result<ThreadDetail> {
        let body = CreateThreadRequest {
            title: title.map(ToString::to_string),
        };
        let request = self
            .authorized(self.http.post(self.endpoint("/api/thread")?))
            .json(&body);
        Ok(expect_success(request.send().await?).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors, a blank title, or a missing thread.
    pub async fn rename_thread(&self, id: &str, title: &str) -> Result<ThreadDetail> {
        let body = RenameThreadRequest {
            title: title.to_string(),
        };
        let request = self
            .authorized(self.http.put(self.endpoint(&format!("/api/thread/{id}"))?))
            .json(&body);
        Ok(expect_success(request.send().await?).await?.json().await?)
    }

    /// # Errors
    /// Fails on transport errors or when the thread does not exist.
    pub async fn delete_thread(&self, id: &str) -> Result<DeleteThreadResponse> {
        let request =
            self.authorized(self.http.delete(self.endpoint(&format!("/api/thread/{id}"))?));
        Ok(expect_success(request.send().await?).await?.json().await?)
    }

    /// Submits one chat message; the returned `thread_id` is canonical.
    ///
    /// # Errors
    /// Fails on transport errors, a blank message, or an upstream failure.
    pub async fn chat(&self, thread_id: &str, message: &str) -> Result<ChatResponse> {
        let body = ChatRequest {
            thread_id: thread_id.to_string(),
            message: message.to_string(),
        };
        let request = self
            .authorized(self.http.post(self.endpoint("/api/chat")?))
            .json(&body);
        Ok(expect_success(request.send().await?).await?.json().await?)
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map_or_else(|_| status.to_string(), |body| body.message);
    bail!("server rejected the request: {message}")
}
