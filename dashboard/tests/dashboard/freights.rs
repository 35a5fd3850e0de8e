use std::time::Duration;

use dashboard::FreightsFacade;
use payloads::requests::FreightFilters;
use payloads::{FreightStatus, StatusCode};
use test_helpers::{Endpoint, spawn_app};

#[tokio::test(start_paused = true)]
async fn mount_loads_open_freights_once() -> anyhow::Result<()> {
    let app = spawn_app();
    let facade = FreightsFacade::new(app.api(), app.notifier.clone());

    let freights = facade.mount().await;
    assert_eq!(freights.len(), app.dataset.open_freights.len());
    assert_eq!(app.api.last_filters(), Some(FreightFilters::default()));

    // same filters and a fresh cache: nothing to do
    facade.set_filters(FreightFilters::default()).await;
    assert_eq!(app.api.calls(Endpoint::Freights), 1);
    assert!(!facade.loading());
    assert!(facade.error().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn changed_filters_refetch() -> anyhow::Result<()> {
    let app = spawn_app();
    let facade = FreightsFacade::new(app.api(), app.notifier.clone());
    facade.mount().await;

    let filters = FreightFilters {
        status: Some(FreightStatus::Open),
        origin_state: Some("SP".into()),
        ..Default::default()
    };
    facade.set_filters(filters.clone()).await;

    assert_eq!(app.api.calls(Endpoint::Freights), 2);
    assert_eq!(app.api.last_filters(), Some(filters.clone()));
    assert_eq!(facade.filters(), filters);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn search_waits_for_typing_to_stop() -> anyhow::Result<()> {
    let app = spawn_app();
    let facade = FreightsFacade::new(app.api(), app.notifier.clone());
    facade.mount().await;

    for text in ["s", "so", "soj", "soja "] {
        facade.search(text);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(app.api.calls(Endpoint::Freights), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    tokio::task::yield_now().await;
    assert_eq!(app.api.calls(Endpoint::Freights), 2);
    let filters = app.api.last_filters().unwrap();
    assert_eq!(filters.search.as_deref(), Some("soja"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_listing_and_notifies() -> anyhow::Result<()> {
    let app = spawn_app();
    let facade = FreightsFacade::new(app.api(), app.notifier.clone());
    facade.mount().await;

    app.api.set_error(
        Endpoint::Freights,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Database unavailable",
    );
    let freights = facade.refresh().await;

    assert_eq!(freights.len(), app.dataset.open_freights.len());
    assert_eq!(facade.error().as_deref(), Some("Database unavailable"));
    assert_eq!(
        app.error_toasts(),
        vec!["Failed to load freights: Database unavailable".to_string()]
    );
    Ok(())
}
