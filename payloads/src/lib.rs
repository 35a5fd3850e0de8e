//! Types shared between the StarFrete backend API and its clients.
//!
//! Request and response bodies live in [`requests`] and [`responses`]; the
//! HTTP wrapper used to talk to the backend lives in [`api_client`].

pub mod api_client;
pub mod envelope;
pub mod matching;
pub mod requests;
pub mod responses;
pub mod storage;

pub use api_client::{APIClient, ClientError};
pub use reqwest::StatusCode;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type wrapper helps ensure we don't mix up ids for different resources.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub struct UserId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub struct CompanyId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub struct FreightId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub struct VehicleId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub struct InterestId(pub Uuid);

/// Account type of a marketplace user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Company,
    Driver,
    Admin,
}

/// Lifecycle of a freight listing as reported by the backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FreightStatus {
    /// Published and accepting driver interest.
    Open,
    /// A driver has been selected but pickup has not happened.
    Negotiating,
    InTransit,
    Delivered,
    Cancelled,
}

impl FreightStatus {
    pub const ALL: [FreightStatus; 5] = [
        FreightStatus::Open,
        FreightStatus::Negotiating,
        FreightStatus::InTransit,
        FreightStatus::Delivered,
        FreightStatus::Cancelled,
    ];

    /// Whether the freight still needs attention from the company.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Open | Self::Negotiating | Self::InTransit
        )
    }
}

/// Status of a driver's interest in a freight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

/// A place a freight is picked up from or delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    /// Two-letter Brazilian state code, e.g. "SP".
    pub state: String,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.city, self.state)
    }
}
