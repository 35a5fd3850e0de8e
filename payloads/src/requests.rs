use crate::matching::VehicleType;
use crate::{FreightId, FreightStatus, VehicleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const INTEREST_MESSAGE_MAX_LEN: usize = 500;

#[derive(Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RefreshToken {
    pub refresh_token: String,
}

/// Query filters for freight listings. Unset fields are omitted from the
/// query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreightFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FreightStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FreightFilters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressInterest {
    pub freight_id: FreightId,
    pub vehicle_id: VehicleId,
    pub message: Option<String>,
    /// Counter-offer, if the driver does not accept the listed price.
    pub proposed_price: Option<Decimal>,
}

impl ExpressInterest {
    pub fn message_too_long(&self) -> bool {
        self.message
            .as_ref()
            .is_some_and(|m| m.chars().count() > INTEREST_MESSAGE_MAX_LEN)
    }
}
