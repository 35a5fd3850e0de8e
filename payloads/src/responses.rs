use crate::matching::{BodyType, FreightCategory, VehicleType};
use crate::{
    CompanyId, FreightId, FreightStatus, InterestId, InterestStatus, Location,
    Role, UserId, VehicleId,
};
use jiff::Timestamp;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// A freight listing as shown to companies and drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freight {
    pub id: FreightId,
    /// Missing on listings served to drivers before they express interest.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    pub title: String,
    pub origin: Location,
    pub destination: Location,
    pub status: FreightStatus,
    pub price: Decimal,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub category: Option<FreightCategory>,
    /// Explicitly requested vehicle types; empty means "any".
    #[serde(default)]
    pub vehicle_types: Vec<VehicleType>,
    /// Explicitly requested body types; empty means "any".
    #[serde(default)]
    pub body_types: Vec<BodyType>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A vehicle registered by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub body_type: BodyType,
    #[serde(default)]
    pub capacity_kg: Option<Decimal>,
}

/// A driver's interest in a freight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightInterest {
    pub id: InterestId,
    pub freight_id: FreightId,
    pub status: InterestStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: Timestamp,
}

/// Aggregate numbers for a company's dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyStats {
    pub total_freights: u64,
    pub active_freights: u64,
    pub completed_freights: u64,
    pub pending_interests: u64,
    #[serde(default)]
    pub total_spent: Decimal,
}

/// Platform-wide numbers for the admin console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_companies: u64,
    pub total_drivers: u64,
    pub total_freights: u64,
    pub open_freights: u64,
}

/// A user row in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

/// Profile of the logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

/// Token pair returned by login and token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access_token: SecretString,
    /// Refresh endpoints may rotate the refresh token or keep the old one.
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub message: String,
}
