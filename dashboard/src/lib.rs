//! Dashboard facades for the StarFrete marketplace.
//!
//! Each facade binds one or more fetch coordinators to backend reads with a
//! cache lifetime tuned to how often the data changes, and reports refresh
//! failures through the shared [`Notifier`].

pub mod admin;
pub mod api;
pub mod company;
pub mod config;
pub mod driver;
pub mod freights;
pub mod notify;
pub mod telemetry;

pub use admin::AdminDashboard;
pub use api::MarketplaceApi;
pub use company::CompanyDashboard;
pub use config::{Config, ConfigError};
pub use driver::DriverDashboard;
pub use freights::FreightsFacade;
pub use notify::{Notifier, Toast, ToastType};

use payloads::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Message must be at most {max} characters")]
    MessageTooLong { max: usize },
    #[error(transparent)]
    Api(#[from] ClientError),
}
