//! Typed storefront calls.

use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::RequestError;
use crate::http::QueryValue;
use crate::problem::ApiResult;
use crate::types::{
    Credentials, Episode, FeedResponse, LoginResponse, NewOrder, Order, OrderPage, OrderUpdate,
    Product, ProductPage, ProductQuery,
};

/// RSS feed the episode list is converted from.
pub const EPISODE_FEED_URL: &str = "https://feeds.simplecast.com/hEI_f9Dx";

impl ApiClient {
    /// Recent podcast episodes, via the RSS-to-JSON endpoint.
    pub async fn get_episodes(&self) -> ApiResult<Vec<Episode>> {
        let feed: FeedResponse = self
            .get("api.json", &[("rss_url", EPISODE_FEED_URL.into())])
            .await?;
        Ok(feed.items)
    }

    pub async fn list_products(&self, filter: &ProductQuery) -> ApiResult<ProductPage> {
        let mut query: Vec<(&str, QueryValue)> = Vec::new();
        if let Some(category) = &filter.category {
            query.push(("category", category.as_str().into()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.into()));
        }
        self.get("products", &query).await
    }

    pub async fn get_product(&self, id: u64) -> ApiResult<Product> {
        self.get(&format!("products/{id}"), &[]).await
    }

    /// Exchange credentials for a session. Wrong credentials are `unauthorized`.
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<ApiResult<LoginResponse>, RequestError> {
        self.post("login", credentials).await
    }

    /// Orders of the user whose bearer token this client carries.
    pub async fn order_history(&self) -> ApiResult<OrderPage> {
        self.get("orders", &[]).await
    }

    pub async fn place_order(&self, order: &NewOrder) -> Result<ApiResult<Order>, RequestError> {
        self.post("orders", order).await
    }

    pub async fn update_order(
        &self,
        id: Uuid,
        update: &OrderUpdate,
    ) -> Result<ApiResult<Order>, RequestError> {
        self.put(&format!("orders/{id}"), update).await
    }
}
