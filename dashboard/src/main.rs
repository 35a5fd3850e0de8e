use std::sync::Arc;

use dashboard::{
    AdminDashboard, CompanyDashboard, Config, DriverDashboard, FreightsFacade,
    MarketplaceApi, Notifier,
    telemetry::{get_subscriber, init_subscriber, log_error},
};
use payloads::requests::LoginCredentials;
use payloads::responses::UserProfile;
use payloads::storage::MemoryStorage;
use payloads::{APIClient, Role};

/// StarFrete dashboard runner
///
/// Loads the dashboard of the configured user once and logs a summary of it.
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// Required environment variables:
/// - BACKEND_URL: Base URL of the StarFrete backend
///
/// Optional environment variables:
/// - REQUEST_TIMEOUT_SECS: HTTP timeout (default 10)
/// - CACHE_DURATION_MS: Cache lifetime of the public freight listing
///   (default 30000). Role dashboards use their own tuned lifetimes.
/// - DEBOUNCE_MS: Search debounce of the public freight listing (default 300)
/// - STARFRETE_EMAIL, STARFRETE_PASSWORD: Log in as this user. Without them
///   only the public freight listing is loaded.
///
/// Example:
/// BACKEND_URL=http://localhost:3001 STARFRETE_EMAIL=empresa@example.com \
/// STARFRETE_PASSWORD=secret cargo run --bin starfrete-dashboard
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if available
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber)?;

    let config = Config::from_env()?;
    let client = Arc::new(APIClient::new(
        &config.backend_url,
        config.request_timeout,
        Arc::new(MemoryStorage::new()),
    )?);
    let notifier = Notifier::new();

    let profile = match config.credentials() {
        Some((email, password)) => Some(login(&client, email, password).await?),
        None => None,
    };
    let api: Arc<dyn MarketplaceApi> = client;

    match profile {
        Some(UserProfile {
            role: Role::Company,
            company_id: Some(company_id),
            name,
            ..
        }) => {
            let dashboard =
                CompanyDashboard::new(api, company_id, notifier.clone());
            dashboard.refresh().await;
            let stats = dashboard.stats();
            tracing::info!(
                "{name}: {} freights, {} active, {} pending interests",
                stats.total_freights,
                stats.active_freights,
                stats.pending_interests
            );
            for (status, count) in dashboard.status_counts() {
                tracing::info!("  {status}: {count}");
            }
        }
        Some(UserProfile {
            role: Role::Company,
            name,
            ..
        }) => {
            anyhow::bail!("company user {name} has no company attached");
        }
        Some(UserProfile {
            role: Role::Driver,
            name,
            ..
        }) => {
            let dashboard = DriverDashboard::new(api, notifier.clone());
            dashboard.refresh().await;
            tracing::info!(
                "{name}: {} open freights, {} compatible with {} vehicles, \
                 {} interests",
                dashboard.available_freights().len(),
                dashboard.compatible_freights().len(),
                dashboard.vehicles().len(),
                dashboard.interests().len()
            );
        }
        Some(UserProfile {
            role: Role::Admin,
            name,
            ..
        }) => {
            let dashboard = AdminDashboard::new(api, notifier.clone());
            dashboard.refresh().await;
            let stats = dashboard.stats();
            tracing::info!(
                "{name}: {} users ({} companies, {} drivers), {} freights, \
                 {} open",
                stats.total_users,
                stats.total_companies,
                stats.total_drivers,
                stats.total_freights,
                stats.open_freights
            );
        }
        None => {
            let listing = FreightsFacade::with_options(
                api,
                notifier.clone(),
                config.listing_options(),
            );
            let freights = listing.refresh().await;
            tracing::info!("{} open freights", freights.len());
            for freight in freights.iter().take(10) {
                tracing::info!(
                    "  {}: {} -> {} ({})",
                    freight.title,
                    freight.origin,
                    freight.destination,
                    freight.price
                );
            }
        }
    }

    for toast in notifier.toasts() {
        tracing::warn!("Unread notification: {}", toast.message);
    }
    Ok(())
}

async fn login(
    client: &APIClient,
    email: &str,
    password: &str,
) -> anyhow::Result<UserProfile> {
    let credentials = LoginCredentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    let tokens = client.login(&credentials).await.inspect_err(|e| {
        log_error(anyhow::anyhow!("login as {email} failed: {e}"));
    })?;
    let profile = match tokens.user {
        Some(profile) => profile,
        None => client.user_profile().await?,
    };
    tracing::info!("Logged in as {} ({})", profile.name, profile.role);
    Ok(profile)
}
