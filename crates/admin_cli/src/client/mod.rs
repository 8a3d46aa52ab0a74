use api_types::{
    ErrorResponse,
    entity::{Entity, Payload},
    reference::{RefItem, RefKey, RefListResponse},
};
use engine::{EntityService, ReferenceLoader, ServiceError};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{AppError, Result};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for the back-office API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| AppError::Setting(format!("invalid base_url: {err}")))?;
        // `join` replaces the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            token,
            http: reqwest::Client::new(),
        })
    }

    /// Client bound to one resource collection (e.g. `promo-codes`).
    pub fn resource(&self, resource: &str) -> ResourceClient {
        ResourceClient {
            client: self.clone(),
            resource: resource.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::Server(format!("invalid endpoint {path}: {err}")))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> std::result::Result<T, ServiceError> {
        let res = self.authorize(req).send().await.map_err(transport)?;

        if res.status().is_success() {
            return res.json::<T>().await.map_err(transport);
        }

        let status = res.status();
        let body = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(error_for(status, body))
    }
}

impl ReferenceLoader for Client {
    async fn load(&self, key: RefKey) -> std::result::Result<Vec<RefItem>, ServiceError> {
        let endpoint = self.endpoint(&format!("reference/{key}"))?;
        tracing::debug!("GET {endpoint}");
        let list: RefListResponse = self.send(self.http.get(endpoint)).await?;
        Ok(list.items)
    }
}

/// [`EntityService`] over `{base}/{resource}`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: Client,
    resource: String,
}

impl EntityService for ResourceClient {
    async fn get_entity(&self, id: &str) -> std::result::Result<Entity, ServiceError> {
        let endpoint = self.client.endpoint(&format!("{}/{id}", self.resource))?;
        tracing::debug!("GET {endpoint}");
        self.client.send(self.client.http.get(endpoint)).await
    }

    async fn create_entity(
        &self,
        payload: &Payload,
        idempotency_key: Uuid,
    ) -> std::result::Result<Entity, ServiceError> {
        let endpoint = self.client.endpoint(&self.resource)?;
        tracing::debug!("POST {endpoint} ({idempotency_key})");
        let req = self
            .client
            .http
            .post(endpoint)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(payload);
        self.client.send(req).await
    }

    async fn update_entity(
        &self,
        id: &str,
        payload: &Payload,
    ) -> std::result::Result<Entity, ServiceError> {
        let endpoint = self.client.endpoint(&format!("{}/{id}", self.resource))?;
        tracing::debug!("PUT {endpoint}");
        self.client
            .send(self.client.http.put(endpoint).json(payload))
            .await
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

fn error_for(status: StatusCode, body: String) -> ServiceError {
    match status.as_u16() {
        401 => ServiceError::Unauthorized,
        403 => ServiceError::Forbidden,
        404 => ServiceError::NotFound,
        409 => ServiceError::Conflict(body),
        422 => ServiceError::Validation(body),
        _ => ServiceError::Server(body),
    }
}
