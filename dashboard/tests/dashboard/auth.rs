use std::sync::Arc;

use payloads::api_client::DEFAULT_TIMEOUT;
use payloads::requests::LoginCredentials;
use payloads::storage::{MemoryStorage, SessionStorageExt};
use payloads::{APIClient, ClientError, StatusCode};
use secrecy::ExposeSecret;
use test_helpers::auth_backend::{
    FRESH_ACCESS_TOKEN, RefreshMode, ROTATED_REFRESH_TOKEN, spawn_auth_backend,
};

async fn logged_in_client(address: &str) -> anyhow::Result<APIClient> {
    test_helpers::init_tracing();
    let client =
        APIClient::new(address, DEFAULT_TIMEOUT, Arc::new(MemoryStorage::new()))?;
    client
        .login(&LoginCredentials {
            email: "joao@example.com".into(),
            password: "senha-segura".into(),
        })
        .await?;
    Ok(client)
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() -> anyhow::Result<()> {
    let backend = spawn_auth_backend(RefreshMode::Rotate);
    let client = logged_in_client(&backend.address).await?;

    let profile = client.user_profile().await?;

    assert_eq!(profile.email, "joao@example.com");
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.profile_calls(), 2);
    let storage = client.storage();
    assert_eq!(
        storage.access_token().unwrap().expose_secret(),
        FRESH_ACCESS_TOKEN
    );
    assert_eq!(
        storage.refresh_token().unwrap().expose_secret(),
        ROTATED_REFRESH_TOKEN
    );
    Ok(())
}

#[tokio::test]
async fn second_unauthorized_is_returned() -> anyhow::Result<()> {
    let backend = spawn_auth_backend(RefreshMode::StillUnauthorized);
    let client = logged_in_client(&backend.address).await?;

    let result = client.user_profile().await;

    match result {
        Err(ClientError::APIError(status, message)) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Token expired");
        }
        other => panic!("expected a 401, got {other:?}"),
    }
    // one refresh, one retry, no loop
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.profile_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn rejected_refresh_clears_session() -> anyhow::Result<()> {
    let backend = spawn_auth_backend(RefreshMode::Reject);
    let client = logged_in_client(&backend.address).await?;
    assert!(client.storage().current_user().is_some());

    let result = client.user_profile().await;

    assert!(matches!(
        result,
        Err(ClientError::APIError(StatusCode::UNAUTHORIZED, _))
    ));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.profile_calls(), 1);
    let storage = client.storage();
    assert!(storage.access_token().is_none());
    assert!(storage.refresh_token().is_none());
    assert!(storage.current_user().is_none());
    Ok(())
}
