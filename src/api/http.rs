//! reqwest client for the storefront REST backend.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::{
    form::FieldErrors,
    persist::{SessionStorage, StoredSession},
    purchase::{Category, Product, Purchase, PurchaseLine},
    types::{ProductId, PurchaseId, PurchaseStatus},
    user::{AuthPayload, Credentials, ProfileUpdate, User},
};

use super::{
    ApiError, ApiResult, DeletedCount, ErrorResponse, PurchaseApi, SuccessResponse,
    query::{ProductPage, ProductQuery},
};

/// Environment variable read by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "SHOPCART_API_BASE_URL";

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root; a trailing `/` is added when missing.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Defaults, with `base_url` taken from [`BASE_URL_ENV`] when set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                cfg.base_url = url.trim().to_string();
            }
        }
        cfg
    }
}

/// Backend client. Cheap to clone; clones share the token and storage.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Arc<RwLock<Option<String>>>,
    storage: Arc<Mutex<Box<dyn SessionStorage>>>,
}

impl HttpClient {
    /// Builds a client and seeds the access token from `storage`.
    pub fn new(config: ClientConfig, storage: Box<dyn SessionStorage>) -> ApiResult<Self> {
        let session = storage.load()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let mut base_url = config.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url,
            access_token: Arc::new(RwLock::new(session.access_token)),
            storage: Arc::new(Mutex::new(storage)),
        })
    }

    /// Current contents of session storage.
    pub fn stored_session(&self) -> ApiResult<StoredSession> {
        let storage = self.lock_storage()?;
        Ok(storage.load()?)
    }

    /// True while a token is attached to requests.
    pub fn has_access_token(&self) -> bool {
        self.access_token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Creates an account and stores the returned session.
    pub async fn register(&self, body: &Credentials) -> ApiResult<AuthPayload> {
        let resp: SuccessResponse<AuthPayload> = self.send(self.http.post(self.url("register")).json(body)).await?;
        self.store_auth(&resp.data)?;
        Ok(resp.data)
    }

    /// Signs in and stores the returned session.
    pub async fn login(&self, body: &Credentials) -> ApiResult<AuthPayload> {
        let resp: SuccessResponse<AuthPayload> = self.send(self.http.post(self.url("login")).json(body)).await?;
        self.store_auth(&resp.data)?;
        Ok(resp.data)
    }

    /// Signs out on the backend. The local session is cleared whatever the
    /// backend answers.
    pub async fn logout(&self) -> ApiResult<String> {
        let result = self.send_message(self.http.post(self.url("logout"))).await;
        self.clear_session()?;
        result
    }

    /// One page of the catalog.
    pub async fn get_products(&self, query: &ProductQuery) -> ApiResult<ProductPage> {
        let resp: SuccessResponse<ProductPage> = self.send(self.http.get(self.url("products")).query(query)).await?;
        Ok(resp.data)
    }

    /// A single product.
    pub async fn get_product_detail(&self, id: &ProductId) -> ApiResult<Product> {
        let resp: SuccessResponse<Product> = self.send(self.http.get(self.url(&format!("products/{id}")))).await?;
        Ok(resp.data)
    }

    /// All categories.
    pub async fn get_categories(&self) -> ApiResult<Vec<Category>> {
        let resp: SuccessResponse<Vec<Category>> = self.send(self.http.get(self.url("categories"))).await?;
        Ok(resp.data)
    }

    /// The signed-in user.
    pub async fn get_profile(&self) -> ApiResult<User> {
        let resp: SuccessResponse<User> = self.send(self.http.get(self.url("me"))).await?;
        Ok(resp.data)
    }

    /// Updates the profile and stores the returned user.
    pub async fn update_profile(&self, body: &ProfileUpdate) -> ApiResult<SuccessResponse<User>> {
        let resp: SuccessResponse<User> = self.send(self.http.put(self.url("user")).json(body)).await?;
        self.lock_storage()?.save_profile(&resp.data)?;
        Ok(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn lock_storage(&self) -> ApiResult<std::sync::MutexGuard<'_, Box<dyn SessionStorage>>> {
        self.storage
            .lock()
            .map_err(|_| ApiError::Message("session storage lock poisoned".to_string()))
    }

    fn store_auth(&self, auth: &AuthPayload) -> ApiResult<()> {
        if let Ok(mut token) = self.access_token.write() {
            *token = Some(auth.access_token.clone());
        }
        let mut storage = self.lock_storage()?;
        storage.save_tokens(&auth.access_token, &auth.refresh_token)?;
        storage.save_profile(&auth.user)?;
        log::info!("signed in as {}", auth.user.email);
        Ok(())
    }

    /// Drops the in-memory token and wipes session storage.
    pub fn clear_session(&self) -> ApiResult<()> {
        if let Ok(mut token) = self.access_token.write() {
            *token = None;
        }
        self.lock_storage()?.clear()?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<SuccessResponse<T>> {
        let bytes = self.execute(req).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_message(&self, req: RequestBuilder) -> ApiResult<String> {
        let bytes = self.execute(req).await?;
        let body: ErrorResponse = serde_json::from_slice(&bytes)?;
        Ok(body.message)
    }

    async fn execute(&self, req: RequestBuilder) -> ApiResult<Vec<u8>> {
        let token = self.access_token.read().ok().and_then(|t| t.clone());
        let req = match token {
            Some(token) => req.header(AUTHORIZATION, token),
            None => req,
        };
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?.to_vec();
        if status.is_success() {
            return Ok(bytes);
        }
        Err(self.error_from(status, &bytes))
    }

    fn error_from(&self, status: StatusCode, body: &[u8]) -> ApiError {
        let parsed = serde_json::from_slice::<ErrorResponse>(body).unwrap_or(ErrorResponse {
            message: String::new(),
            data: None,
        });
        match status {
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
                fields: parsed.data.as_ref().map(FieldErrors::from_payload).unwrap_or_default(),
                message: parsed.message,
            },
            StatusCode::UNAUTHORIZED => {
                log::warn!("unauthorized response, clearing session: {}", parsed.message);
                if let Err(err) = self.clear_session() {
                    log::warn!("failed to clear session: {err}");
                }
                ApiError::Unauthorized {
                    message: parsed.message,
                }
            }
            other => {
                log::warn!("http {}: {}", other.as_u16(), parsed.message);
                ApiError::Status {
                    status: other.as_u16(),
                    message: parsed.message,
                }
            }
        }
    }
}

#[async_trait]
impl PurchaseApi for HttpClient {
    async fn get_purchases(&self, status: PurchaseStatus) -> ApiResult<Vec<Purchase>> {
        let req = self.http.get(self.url("purchases")).query(&[("status", status.code())]);
        let resp: SuccessResponse<Vec<Purchase>> = self.send(req).await?;
        Ok(resp.data)
    }

    async fn add_to_cart(&self, line: PurchaseLine) -> ApiResult<Purchase> {
        let req = self.http.post(self.url("purchases/add-to-cart")).json(&line);
        let resp: SuccessResponse<Purchase> = self.send(req).await?;
        Ok(resp.data)
    }

    async fn update_purchase(&self, line: PurchaseLine) -> ApiResult<Purchase> {
        let req = self.http.put(self.url("purchases/update-purchase")).json(&line);
        let resp: SuccessResponse<Purchase> = self.send(req).await?;
        Ok(resp.data)
    }

    async fn delete_purchases(&self, ids: Vec<PurchaseId>) -> ApiResult<DeletedCount> {
        let req = self.http.delete(self.url("purchases")).json(&ids);
        let resp: SuccessResponse<DeletedCount> = self.send(req).await?;
        Ok(resp.data)
    }

    async fn buy_products(&self, lines: Vec<PurchaseLine>) -> ApiResult<String> {
        let req = self.http.post(self.url("purchases/buy-products")).json(&lines);
        self.send_message(req).await
    }
}
