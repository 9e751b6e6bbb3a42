use async_trait::async_trait;
use brewhouse_core::BrewhouseConfig;
use brewhouse_protocol::api::{
    CompleteRequest, ErrorBody, SessionEnvelope, StatusResponse, TimeUpdate,
};
use brewhouse_protocol::measurements::MeasurementUpdate;
use brewhouse_protocol::session::{BrewingSession, SessionStatus};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::{ParseError, Url};

use crate::store::{SessionStore, StoreError};

/// [`SessionStore`] backed by the storefront's REST API.
#[derive(Clone)]
pub struct HttpSessionStore {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpSessionStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, StoreError> {
        let mut url = Url::parse(base_url).map_err(|err| StoreError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        })?;

        if url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl {
                url: base_url.to_string(),
                source: ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_string();
            path.push('/');
            url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: url,
            token: token.filter(|token| !token.is_empty()),
        })
    }

    pub fn from_config(config: &BrewhouseConfig) -> Result<Self, StoreError> {
        Self::new(config.api_url(), config.api_token().map(str::to_string))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/recipes/{recipe_id}/brewing-session/{path..}`, each segment
    /// percent-encoded on its own.
    fn endpoint(&self, recipe_id: &str, path: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                source: ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(["recipes", recipe_id, "brewing-session"])
            .extend(path);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|err| StoreError::Http(err.to_string()))?;
        check_status(response).await
    }

    async fn session_command(
        &self,
        recipe_id: &str,
        command: &str,
    ) -> Result<BrewingSession, StoreError> {
        let url = self.endpoint(recipe_id, &[command])?;
        let response = self.send(self.request(Method::POST, url)).await?;
        let envelope: SessionEnvelope = decode(response).await?;
        Ok(envelope.session)
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn status(&self, recipe_id: &str) -> Result<StatusResponse, StoreError> {
        let url = self.endpoint(recipe_id, &["status"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    async fn start(&self, recipe_id: &str) -> Result<BrewingSession, StoreError> {
        self.session_command(recipe_id, "start").await
    }

    async fn pause(&self, recipe_id: &str) -> Result<BrewingSession, StoreError> {
        self.session_command(recipe_id, "pause").await
    }

    async fn resume(&self, recipe_id: &str) -> Result<BrewingSession, StoreError> {
        self.session_command(recipe_id, "resume").await
    }

    async fn complete(
        &self,
        recipe_id: &str,
        status: Option<SessionStatus>,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(recipe_id, &["complete"])?;
        let body = CompleteRequest { status };
        self.send(self.request(Method::POST, url).json(&body))
            .await
            .map(drop)
    }

    async fn complete_step(&self, recipe_id: &str, step_id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(recipe_id, &["steps", step_id])?;
        self.send(self.request(Method::POST, url)).await.map(drop)
    }

    async fn uncomplete_step(&self, recipe_id: &str, step_id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(recipe_id, &["steps", step_id])?;
        self.send(self.request(Method::DELETE, url)).await.map(drop)
    }

    async fn update_time(&self, recipe_id: &str, current_time: u64) -> Result<(), StoreError> {
        let url = self.endpoint(recipe_id, &["time"])?;
        let body = TimeUpdate { current_time };
        self.send(self.request(Method::PATCH, url).json(&body))
            .await
            .map(drop)
    }

    async fn update_gravity(
        &self,
        recipe_id: &str,
        update: &MeasurementUpdate,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(recipe_id, &["gravity"])?;
        self.send(self.request(Method::PATCH, url).json(update))
            .await
            .map(drop)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => err.error,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };
    Err(StoreError::UnexpectedStatus {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    response
        .json::<T>()
        .await
        .map_err(|err| StoreError::Decode(err.to_string()))
}
