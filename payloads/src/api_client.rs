use std::sync::Arc;
use std::time::Duration;

use crate::envelope::{self, Normalized};
use crate::storage::{SessionStorage, SessionStorageExt};
use crate::{CompanyId, FreightId, requests, responses};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// Timeout applied to every request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An API client for interfacing with the backend.
///
/// Requests carry the stored access token as a bearer token. A 401 triggers
/// one token refresh and one retry of the original request; a second 401 is
/// returned to the caller.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
}

impl APIClient {
    pub fn new(
        address: impl Into<String>,
        timeout: Duration,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ClientError> {
        let builder = reqwest::Client::builder();

        // the browser fetch API has no per-request timeout knob
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(timeout);
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        Ok(Self {
            address: address.into().trim_end_matches('/').to_string(),
            inner_client: builder.build()?,
            storage,
        })
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.storage.access_token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request built by `build`, refreshing the session and retrying
    /// once if the backend answers 401.
    async fn send<F>(&self, build: F) -> ReqwestResult
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response =
            self.authorized(build(&self.inner_client)).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if !self.refresh_token().await {
            return Ok(response);
        }
        tracing::debug!("Retrying request after token refresh");
        self.authorized(build(&self.inner_client)).send().await
    }

    async fn get(&self, path: &str) -> ReqwestResult {
        let url = self.format_url(path);
        self.send(|client| client.get(&url)).await
    }

    async fn get_with_query(
        &self,
        path: &str,
        query: &impl Serialize,
    ) -> ReqwestResult {
        let url = self.format_url(path);
        self.send(|client| client.get(&url).query(query)).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        let url = self.format_url(path);
        self.send(|client| client.post(&url).json(body)).await
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns whether the session was refreshed. A rejected refresh clears
    /// the stored session.
    pub async fn refresh_token(&self) -> bool {
        let Some(refresh_token) = self.storage.refresh_token() else {
            return false;
        };
        let body = requests::RefreshToken {
            refresh_token: refresh_token.expose_secret().to_string(),
        };
        let result = self
            .inner_client
            .post(self.format_url("auth/refresh"))
            .json(&body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token refresh failed: {e}");
                return false;
            }
        };
        match ok_body::<responses::AuthTokens>(response).await {
            Ok(tokens) => {
                self.storage.store_tokens(&tokens);
                tracing::info!("Refreshed access token");
                true
            }
            Err(e) => {
                tracing::warn!("Token refresh rejected, clearing session: {e}");
                self.storage.clear_session();
                false
            }
        }
    }
}

/// Methods on the backend API
impl APIClient {
    /// Log in and store the returned tokens.
    pub async fn login(
        &self,
        details: &requests::LoginCredentials,
    ) -> Result<responses::AuthTokens, ClientError> {
        let response = self
            .inner_client
            .post(self.format_url("auth/login"))
            .json(details)
            .send()
            .await?;
        let tokens: responses::AuthTokens = ok_body(response).await?;
        self.storage.store_tokens(&tokens);
        Ok(tokens)
    }

    pub fn logout(&self) {
        self.storage.clear_session();
    }

    pub async fn user_profile(
        &self,
    ) -> Result<responses::UserProfile, ClientError> {
        let response = self.get("auth/me").await?;
        decode(ok_json(response).await?)
    }

    /// Open freight listings matching `filters`, as the raw response body.
    pub async fn list_freights_raw(
        &self,
        filters: &requests::FreightFilters,
    ) -> Result<Value, ClientError> {
        let response = self.get_with_query("freights", filters).await?;
        ok_json(response).await
    }

    pub async fn list_freights(
        &self,
        filters: &requests::FreightFilters,
    ) -> Result<Vec<responses::Freight>, ClientError> {
        decode(self.list_freights_raw(filters).await?)
    }

    pub async fn get_freight(
        &self,
        freight_id: &FreightId,
    ) -> Result<responses::Freight, ClientError> {
        let response = self.get(&format!("freights/{freight_id}")).await?;
        decode(ok_json(response).await?)
    }

    pub async fn list_company_freights_raw(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        let response =
            self.get(&format!("companies/{company_id}/freights")).await?;
        ok_json(response).await
    }

    pub async fn company_stats_raw(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        let response =
            self.get(&format!("companies/{company_id}/stats")).await?;
        ok_json(response).await
    }

    /// Vehicles registered by the logged in driver.
    pub async fn list_vehicles_raw(&self) -> Result<Value, ClientError> {
        let response = self.get("vehicles").await?;
        ok_json(response).await
    }

    pub async fn express_interest(
        &self,
        details: &requests::ExpressInterest,
    ) -> Result<responses::FreightInterest, ClientError> {
        let response = self.post("interests", details).await?;
        decode(ok_json(response).await?)
    }

    /// Interests expressed by the logged in driver.
    pub async fn list_driver_interests_raw(
        &self,
    ) -> Result<Value, ClientError> {
        let response = self.get("interests/mine").await?;
        ok_json(response).await
    }

    pub async fn admin_list_users_raw(&self) -> Result<Value, ClientError> {
        let response = self.get("admin/users").await?;
        ok_json(response).await
    }

    pub async fn admin_list_freights_raw(&self) -> Result<Value, ClientError> {
        let response = self.get("admin/freights").await?;
        ok_json(response).await
    }

    pub async fn admin_stats_raw(&self) -> Result<Value, ClientError> {
        let response = self.get("admin/stats").await?;
        ok_json(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing the server's message or
    /// the response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The message the server sent along with an error status, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::APIError(_, message) if !message.trim().is_empty() => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::APIError(status, _) => Some(*status),
            Self::Network(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

/// Turn an error response into a ClientError, preferring the `message` field
/// of a JSON error body over the raw text.
async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return ClientError::Network(e),
    };
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| envelope::message_of(&body))
        .unwrap_or(text);
    ClientError::APIError(status, message)
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json::<T>().await?)
}

/// Return the JSON body of a successful request without interpreting its
/// envelope.
pub async fn ok_json(response: reqwest::Response) -> Result<Value, ClientError> {
    ok_body(response).await
}

/// Normalize a raw body and deserialize its payload.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    match envelope::normalize(body) {
        Normalized::Error(message) => {
            Err(ClientError::APIError(StatusCode::OK, message))
        }
        payload => payload.decode().map_err(ClientError::Decode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_unwraps_envelope() {
        let stats: responses::CompanyStats = decode(json!({
            "data": {
                "total_freights": 3,
                "active_freights": 2,
                "completed_freights": 1,
                "pending_interests": 5
            }
        }))
        .unwrap();
        assert_eq!(stats.active_freights, 2);
        assert_eq!(stats.total_spent, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn decode_surfaces_envelope_failure_as_api_error() {
        let err = decode::<Vec<responses::Freight>>(json!({
            "success": false,
            "message": "Empresa não encontrada"
        }))
        .unwrap_err();
        assert_eq!(err.server_message(), Some("Empresa não encontrada"));
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[test]
    fn decode_mismatch_is_decode_error() {
        let err = decode::<responses::CompanyStats>(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn blank_server_message_is_ignored() {
        let err = ClientError::APIError(StatusCode::BAD_GATEWAY, "  ".into());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_address() {
        let client = APIClient::new(
            "http://localhost:3000/",
            DEFAULT_TIMEOUT,
            Arc::new(crate::storage::MemoryStorage::new()),
        )
        .unwrap();
        assert_eq!(
            client.format_url("freights"),
            "http://localhost:3000/api/freights"
        );
    }
}
