use std::time::Duration;

use dashboard::CompanyDashboard;
use payloads::{FreightStatus, StatusCode};
use test_helpers::{Endpoint, spawn_app};

#[tokio::test(start_paused = true)]
async fn mount_loads_freights_and_stats() -> anyhow::Result<()> {
    let app = spawn_app();
    let company_id = app.dataset.company_id;
    let dashboard =
        CompanyDashboard::new(app.api(), company_id, app.notifier.clone());

    dashboard.mount().await;

    assert_eq!(app.api.last_company(), Some(company_id));
    assert_eq!(dashboard.freights(), app.dataset.company_freights);
    assert_eq!(dashboard.stats(), app.dataset.company_stats);
    assert_eq!(
        dashboard.status_counts(),
        vec![
            (FreightStatus::Open, 3),
            (FreightStatus::Negotiating, 1),
            (FreightStatus::InTransit, 1),
            (FreightStatus::Delivered, 1),
            (FreightStatus::Cancelled, 1),
        ]
    );
    assert_eq!(dashboard.active_freights().len(), 5);
    assert!(!dashboard.loading());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn freights_expire_before_stats() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = CompanyDashboard::new(
        app.api(),
        app.dataset.company_id,
        app.notifier.clone(),
    );
    dashboard.mount().await;

    tokio::time::advance(Duration::from_secs(20)).await;
    dashboard.mount().await;

    assert_eq!(app.api.calls(Endpoint::CompanyFreights), 2);
    assert_eq!(app.api.calls(Endpoint::CompanyStats), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refresh_reports_each_failure() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = CompanyDashboard::new(
        app.api(),
        app.dataset.company_id,
        app.notifier.clone(),
    );
    dashboard.mount().await;

    app.api
        .set_error(Endpoint::CompanyStats, StatusCode::FORBIDDEN, "Acesso negado");
    dashboard.refresh().await;

    assert_eq!(app.api.calls(Endpoint::CompanyFreights), 2);
    assert_eq!(dashboard.stats(), app.dataset.company_stats);
    assert_eq!(dashboard.errors(), vec!["Acesso negado".to_string()]);
    assert_eq!(
        app.error_toasts(),
        vec!["Failed to load company dashboard: Acesso negado".to_string()]
    );
    Ok(())
}
