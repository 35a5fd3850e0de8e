pub mod auth_backend;
pub mod mock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use dashboard::{MarketplaceApi, Notifier, telemetry};
use mock::MockDataset;
use payloads::requests::{ExpressInterest, FreightFilters};
use payloads::responses::FreightInterest;
use payloads::{
    ClientError, CompanyId, InterestId, InterestStatus, StatusCode,
};
use serde_json::{Value, json};
use tracing_log::LogTracer;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

/// The backend reads a [`MockApi`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Freights,
    CompanyFreights,
    CompanyStats,
    Vehicles,
    DriverInterests,
    ExpressInterest,
    AdminUsers,
    AdminFreights,
    AdminStats,
}

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Fail(StatusCode, String),
}

/// Scripted stand-in for the StarFrete backend.
///
/// Each endpoint answers with its configured [`Reply`], after an optional
/// delay (use paused tokio time in tests that set one). Unscripted endpoints
/// answer 404. Calls are counted per endpoint.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<Endpoint, Reply>,
    delays: HashMap<Endpoint, Duration>,
    calls: HashMap<Endpoint, usize>,
    last_filters: Option<FreightFilters>,
    last_company: Option<CompanyId>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend serving `dataset`. Company freights come in a doubly nested
    /// envelope and the other lists in a single one, the way the real
    /// backend is inconsistent about it.
    pub fn with_dataset(dataset: &MockDataset) -> Self {
        let api = Self::new();
        api.set_ok(Endpoint::Freights, envelope(json!(dataset.open_freights)));
        api.set_ok(
            Endpoint::CompanyFreights,
            envelope(envelope(json!(dataset.company_freights))),
        );
        api.set_ok(Endpoint::CompanyStats, json!(dataset.company_stats));
        api.set_ok(Endpoint::Vehicles, envelope(json!(dataset.vehicles)));
        api.set_ok(Endpoint::DriverInterests, json!(dataset.interests));
        api.set_ok(Endpoint::ExpressInterest, Value::Null);
        api.set_ok(Endpoint::AdminUsers, envelope(json!(dataset.users)));
        api.set_ok(
            Endpoint::AdminFreights,
            envelope(json!(dataset.company_freights)),
        );
        api.set_ok(Endpoint::AdminStats, envelope(json!(dataset.platform_stats)));
        api
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_ok(&self, endpoint: Endpoint, body: Value) {
        self.lock().replies.insert(endpoint, Reply::Ok(body));
    }

    pub fn set_error(&self, endpoint: Endpoint, status: StatusCode, message: &str) {
        self.lock()
            .replies
            .insert(endpoint, Reply::Fail(status, message.to_string()));
    }

    pub fn set_delay(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().delays.insert(endpoint, delay);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn last_filters(&self) -> Option<FreightFilters> {
        self.lock().last_filters.clone()
    }

    pub fn last_company(&self) -> Option<CompanyId> {
        self.lock().last_company
    }

    async fn answer(&self, endpoint: Endpoint) -> Result<Value, ClientError> {
        let (reply, delay) = {
            let mut state = self.lock();
            *state.calls.entry(endpoint).or_default() += 1;
            (
                state.replies.get(&endpoint).cloned(),
                state.delays.get(&endpoint).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        tracing::debug!("MockApi answering {endpoint:?}");
        match reply {
            Some(Reply::Ok(body)) => Ok(body),
            Some(Reply::Fail(status, message)) => {
                Err(ClientError::APIError(status, message))
            }
            None => Err(ClientError::APIError(
                StatusCode::NOT_FOUND,
                format!("no reply scripted for {endpoint:?}"),
            )),
        }
    }
}

#[async_trait]
impl MarketplaceApi for MockApi {
    async fn list_freights(
        &self,
        filters: &FreightFilters,
    ) -> Result<Value, ClientError> {
        self.lock().last_filters = Some(filters.clone());
        self.answer(Endpoint::Freights).await
    }

    async fn list_company_freights(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        self.lock().last_company = Some(*company_id);
        self.answer(Endpoint::CompanyFreights).await
    }

    async fn company_stats(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        self.lock().last_company = Some(*company_id);
        self.answer(Endpoint::CompanyStats).await
    }

    async fn list_vehicles(&self) -> Result<Value, ClientError> {
        self.answer(Endpoint::Vehicles).await
    }

    async fn list_driver_interests(&self) -> Result<Value, ClientError> {
        self.answer(Endpoint::DriverInterests).await
    }

    /// Records the interest so later interest listings include it.
    async fn express_interest(
        &self,
        details: &ExpressInterest,
    ) -> Result<FreightInterest, ClientError> {
        self.answer(Endpoint::ExpressInterest).await?;
        let interest = FreightInterest {
            id: InterestId(Uuid::new_v4()),
            freight_id: details.freight_id,
            status: InterestStatus::Pending,
            message: details.message.clone(),
            created_at: jiff::Timestamp::now(),
        };

        let mut state = self.lock();
        if let Some(Reply::Ok(Value::Array(interests))) =
            state.replies.get_mut(&Endpoint::DriverInterests)
        {
            interests.push(json!(interest));
        }
        Ok(interest)
    }

    async fn admin_list_users(&self) -> Result<Value, ClientError> {
        self.answer(Endpoint::AdminUsers).await
    }

    async fn admin_list_freights(&self) -> Result<Value, ClientError> {
        self.answer(Endpoint::AdminFreights).await
    }

    async fn admin_stats(&self) -> Result<Value, ClientError> {
        self.answer(Endpoint::AdminStats).await
    }
}

/// Wrap `body` the way the backend wraps successful responses.
pub fn envelope(body: Value) -> Value {
    json!({ "success": true, "data": body })
}

/// Everything a facade test needs: the dataset, the backend serving it, and
/// a notifier to inspect.
pub struct TestApp {
    pub dataset: MockDataset,
    pub api: Arc<MockApi>,
    pub notifier: Notifier,
}

impl TestApp {
    pub fn api(&self) -> Arc<dyn MarketplaceApi> {
        self.api.clone()
    }

    pub fn error_toasts(&self) -> Vec<String> {
        self.notifier
            .toasts()
            .into_iter()
            .filter(|toast| toast.toast_type == dashboard::ToastType::Error)
            .map(|toast| toast.message)
            .collect()
    }
}

pub fn spawn_app() -> TestApp {
    init_tracing();
    let dataset = MockDataset::new();
    let api = Arc::new(MockApi::with_dataset(&dataset));
    TestApp {
        dataset,
        api,
        notifier: Notifier::new(),
    }
}

/// Install an error-level subscriber once per test binary.
pub fn init_tracing() {
    let subscriber = telemetry::get_subscriber("error".into());
    let _ = LogTracer::init();
    let _ = subscriber.try_init();
}
