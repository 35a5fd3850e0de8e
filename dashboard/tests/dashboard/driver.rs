use dashboard::{DashboardError, DriverDashboard};
use payloads::requests::{ExpressInterest, INTEREST_MESSAGE_MAX_LEN};
use payloads::{FreightStatus, StatusCode};
use test_helpers::{Endpoint, spawn_app};

#[tokio::test(start_paused = true)]
async fn compatible_freights_follow_vehicles() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = DriverDashboard::new(app.api(), app.notifier.clone());
    dashboard.mount().await;

    let filters = app.api.last_filters().unwrap();
    assert_eq!(filters.status, Some(FreightStatus::Open));
    assert_eq!(dashboard.available_freights().len(), 3);
    assert_eq!(dashboard.vehicles().len(), 2);

    // the extra heavy grain load needs a bigger vehicle
    let compatible: Vec<_> = dashboard
        .compatible_freights()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(
        compatible,
        vec!["Eletrônicos Campinas", "Móveis Bento Gonçalves"]
    );
    assert!(dashboard.has_interest(app.dataset.carriable_freight().id));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn expressing_interest_refreshes_interests() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = DriverDashboard::new(app.api(), app.notifier.clone());
    dashboard.mount().await;

    let freight = &app.dataset.open_freights[2];
    assert!(!dashboard.has_interest(freight.id));
    let interest = dashboard
        .express_interest(&ExpressInterest {
            freight_id: freight.id,
            vehicle_id: app.dataset.vehicles[1].id,
            message: Some("Disponível na sexta".into()),
            proposed_price: None,
        })
        .await?;

    assert_eq!(interest.freight_id, freight.id);
    assert_eq!(app.api.calls(Endpoint::DriverInterests), 2);
    assert!(dashboard.has_interest(freight.id));
    assert!(app.error_toasts().is_empty());
    assert_eq!(app.notifier.toasts().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn long_messages_are_rejected_locally() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = DriverDashboard::new(app.api(), app.notifier.clone());

    let result = dashboard
        .express_interest(&ExpressInterest {
            freight_id: app.dataset.carriable_freight().id,
            vehicle_id: app.dataset.vehicles[0].id,
            message: Some("a".repeat(INTEREST_MESSAGE_MAX_LEN + 1)),
            proposed_price: None,
        })
        .await;

    assert!(matches!(result, Err(DashboardError::MessageTooLong { .. })));
    assert_eq!(app.api.calls(Endpoint::ExpressInterest), 0);
    assert_eq!(app.error_toasts().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rejected_interest_shows_server_message() -> anyhow::Result<()> {
    let app = spawn_app();
    let dashboard = DriverDashboard::new(app.api(), app.notifier.clone());
    app.api.set_error(
        Endpoint::ExpressInterest,
        StatusCode::CONFLICT,
        "Interesse já registrado",
    );

    let result = dashboard
        .express_interest(&ExpressInterest {
            freight_id: app.dataset.carriable_freight().id,
            vehicle_id: app.dataset.vehicles[0].id,
            message: None,
            proposed_price: None,
        })
        .await;

    assert!(matches!(result, Err(DashboardError::Api(_))));
    assert_eq!(
        app.error_toasts(),
        vec!["Failed to express interest: Interesse já registrado".to_string()]
    );
    assert_eq!(app.api.calls(Endpoint::DriverInterests), 0);
    Ok(())
}
