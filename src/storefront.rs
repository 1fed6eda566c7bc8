//! Facade wiring the backend client, session state, and cart runtime.

use std::sync::Arc;

use crate::{
    api::{
        ApiError, ApiResult, PurchaseApi,
        http::{ClientConfig, HttpClient},
    },
    core::app::AppState,
    form::{self, FieldErrors},
    persist::SessionStorage,
    purchase::Purchase,
    runtime::handle::{CartConfig, CartHandle, RuntimeError, spawn_cart},
    types::{ProductId, PurchaseId, PurchaseStatus},
    user::{Credentials, ProfileUpdate, User},
};

/// Errors surfaced by [`Storefront`].
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// Rejected before any request was made.
    #[error("invalid form input")]
    Invalid(FieldErrors),
    /// Backend or transport failure.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Cart runtime failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl StorefrontError {
    /// Per-field messages from client rules or a server 422.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            StorefrontError::Invalid(fields) => Some(fields),
            StorefrontError::Api(ApiError::Validation { fields, .. }) => Some(fields),
            _ => None,
        }
    }
}

/// A signed-in (or anonymous) shopper: client, session state and cart.
pub struct Storefront {
    client: HttpClient,
    cart: CartHandle,
    state: AppState,
}

impl Storefront {
    /// Opens a storefront session. Must be called inside a tokio runtime.
    pub fn open(
        client_config: ClientConfig,
        cart_config: CartConfig,
        storage: Box<dyn SessionStorage>,
    ) -> Result<Self, StorefrontError> {
        let client = HttpClient::new(client_config, storage)?;
        let state = AppState::from_session(&client.stored_session()?);
        let cart = spawn_cart(Arc::new(client.clone()), cart_config);
        Ok(Self { client, cart, state })
    }

    /// Session state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Cart runtime handle.
    pub fn cart(&self) -> &CartHandle {
        &self.cart
    }

    /// Backend client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Validates the form, signs in and records the profile.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, StorefrontError> {
        let errors = form::validate_login(email, password);
        if !errors.is_empty() {
            return Err(StorefrontError::Invalid(form::collect(&errors)));
        }
        let auth = self
            .client
            .login(&Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.state.sign_in(auth.user.clone());
        Ok(auth.user)
    }

    /// Validates the form, creates the account and signs in.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, StorefrontError> {
        let errors = form::validate_register(email, password, confirm_password);
        if !errors.is_empty() {
            return Err(StorefrontError::Invalid(form::collect(&errors)));
        }
        let auth = self
            .client
            .register(&Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.state.sign_in(auth.user.clone());
        Ok(auth.user)
    }

    /// Signs out and clears local state even when the backend call fails.
    pub async fn sign_out(&mut self) -> Result<(), StorefrontError> {
        if let Err(err) = self.client.logout().await {
            log::warn!("logout request failed, clearing local session anyway: {err}");
        }
        self.state.reset();
        self.cart.reset().await?;
        log::info!("signed out");
        Ok(())
    }

    /// Reloads the profile from the backend.
    pub async fn refresh_profile(&mut self) -> Result<User, StorefrontError> {
        let result = self.client.get_profile().await;
        let user = self.expire_on_unauthorized(result).await?;
        self.state.set_profile(user.clone());
        Ok(user)
    }

    /// Sends a profile or password update and returns the server message.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<String, StorefrontError> {
        let result = self.client.update_profile(update).await;
        let resp = self.expire_on_unauthorized(result).await?;
        self.state.set_profile(resp.data);
        Ok(resp.message)
    }

    /// The client has already dropped the session on a 401; bring the
    /// local state and cart in line with it.
    async fn expire_on_unauthorized<T>(&mut self, result: ApiResult<T>) -> Result<T, StorefrontError> {
        if let Err(ApiError::Unauthorized { .. }) = &result {
            self.state.reset();
            if let Err(err) = self.cart.reset().await {
                log::warn!("failed to reset cart after session expiry: {err}");
            }
        }
        Ok(result?)
    }

    /// Validates the form and sends a password change.
    pub async fn change_password(
        &mut self,
        current: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<String, StorefrontError> {
        let errors = form::validate_password_change(current, new_password, confirm_password);
        if !errors.is_empty() {
            return Err(StorefrontError::Invalid(form::collect(&errors)));
        }
        self.update_profile(&ProfileUpdate::password_change(current, new_password))
            .await
    }

    /// Orders shown on the completed-purchases view.
    pub async fn completed_purchases(&self) -> Result<Vec<Purchase>, StorefrontError> {
        Ok(self.client.get_purchases(PurchaseStatus::COMPLETED).await?)
    }

    /// Puts one more unit of `product_id` in the cart and opens it.
    pub async fn buy_again(&self, product_id: ProductId) -> Result<PurchaseId, StorefrontError> {
        Ok(self.cart.add_to_cart_and_navigate(product_id, 1).await?)
    }
}
