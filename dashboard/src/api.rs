//! The backend reads the dashboards depend on.

use async_trait::async_trait;
use payloads::requests::{ExpressInterest, FreightFilters};
use payloads::{APIClient, ClientError, CompanyId, responses};
use serde_json::Value;

/// Remote reads used by the dashboard facades.
///
/// Reads return the raw response body; coordinators take care of the
/// envelope. [`APIClient`] is the production implementation.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn list_freights(
        &self,
        filters: &FreightFilters,
    ) -> Result<Value, ClientError>;

    async fn list_company_freights(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError>;

    async fn company_stats(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError>;

    async fn list_vehicles(&self) -> Result<Value, ClientError>;

    async fn list_driver_interests(&self) -> Result<Value, ClientError>;

    async fn express_interest(
        &self,
        details: &ExpressInterest,
    ) -> Result<responses::FreightInterest, ClientError>;

    async fn admin_list_users(&self) -> Result<Value, ClientError>;

    async fn admin_list_freights(&self) -> Result<Value, ClientError>;

    async fn admin_stats(&self) -> Result<Value, ClientError>;
}

#[async_trait]
impl MarketplaceApi for APIClient {
    async fn list_freights(
        &self,
        filters: &FreightFilters,
    ) -> Result<Value, ClientError> {
        self.list_freights_raw(filters).await
    }

    async fn list_company_freights(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        self.list_company_freights_raw(company_id).await
    }

    async fn company_stats(
        &self,
        company_id: &CompanyId,
    ) -> Result<Value, ClientError> {
        self.company_stats_raw(company_id).await
    }

    async fn list_vehicles(&self) -> Result<Value, ClientError> {
        self.list_vehicles_raw().await
    }

    async fn list_driver_interests(&self) -> Result<Value, ClientError> {
        self.list_driver_interests_raw().await
    }

    async fn express_interest(
        &self,
        details: &ExpressInterest,
    ) -> Result<responses::FreightInterest, ClientError> {
        APIClient::express_interest(self, details).await
    }

    async fn admin_list_users(&self) -> Result<Value, ClientError> {
        self.admin_list_users_raw().await
    }

    async fn admin_list_freights(&self) -> Result<Value, ClientError> {
        self.admin_list_freights_raw().await
    }

    async fn admin_stats(&self) -> Result<Value, ClientError> {
        self.admin_stats_raw().await
    }
}
