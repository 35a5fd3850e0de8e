use std::time::Duration;

use dashboard::AdminDashboard;
use dashboard::admin::{STATS, USERS};
use payloads::StatusCode;
use test_helpers::{Endpoint, spawn_app};

#[tokio::test(start_paused = true)]
async fn mount_loads_every_read() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = AdminDashboard::new(app.api(), app.notifier.clone());

    let snapshot = dashboard.mount().await;

    assert!(!snapshot.global_loading);
    assert!(snapshot.errors().is_empty());
    assert_eq!(dashboard.users(), app.dataset.users);
    assert_eq!(dashboard.freights(), app.dataset.company_freights);
    assert_eq!(dashboard.stats(), app.dataset.platform_stats);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn one_failing_read_does_not_block_the_others() -> anyhow::Result<()> {
    let app = spawn_app();
    app.api.set_error(
        Endpoint::AdminStats,
        StatusCode::SERVICE_UNAVAILABLE,
        "Estatísticas indisponíveis",
    );
    let dashboard = AdminDashboard::new(app.api(), app.notifier.clone());

    let snapshot = dashboard.refresh().await;

    assert_eq!(dashboard.users().len(), 4);
    assert!(snapshot.get(STATS).unwrap().data.is_none());
    assert_eq!(
        snapshot.errors(),
        vec![(STATS, "Estatísticas indisponíveis")]
    );
    assert_eq!(
        app.error_toasts(),
        vec!["Failed to load stats: Estatísticas indisponíveis".to_string()]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn global_loading_lasts_until_the_slowest_read() -> anyhow::Result<()> {
    let app = spawn_app();
    app.api.set_delay(Endpoint::AdminUsers, Duration::from_millis(500));
    let dashboard = AdminDashboard::new(app.api(), app.notifier.clone());

    let running = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.mount().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(dashboard.global_loading());
    let snapshot = dashboard.snapshot();
    assert!(snapshot.get(USERS).unwrap().loading);
    // results are merged only once every read has settled
    assert!(snapshot.get(STATS).unwrap().loading);

    let snapshot = running.await?;
    assert!(!snapshot.global_loading);
    assert_eq!(dashboard.users().len(), 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn malformed_stats_keep_previous_numbers() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = AdminDashboard::new(app.api(), app.notifier.clone());
    dashboard.mount().await;

    app.api.set_ok(
        Endpoint::AdminStats,
        test_helpers::envelope(serde_json::json!("maintenance")),
    );
    let snapshot = dashboard.refresh().await;

    assert_eq!(dashboard.stats(), app.dataset.platform_stats);
    assert!(snapshot.get(STATS).unwrap().error.is_some());
    assert_eq!(app.error_toasts().len(), 1);
    Ok(())
}
