//! Backend seams: the order and like endpoints the shop layer calls.
//!
//! [`OrderGateway`] and [`LikeGateway`] are the traits checkout and
//! favorites are written against. [`RestGateway`] implements both over the
//! storefront's REST API with a blocking `reqwest` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use flora_core::{FlowerId, OrderId, OrderItemRequest, OrderRequest};

use crate::error::GatewayError;

/// Records orders and their items.
pub trait OrderGateway {
    /// Creates the order header and returns the backend's id for it.
    fn create_order(&mut self, request: &OrderRequest) -> Result<OrderId, GatewayError>;

    /// Creates one order item under an existing order.
    fn create_order_item(&mut self, request: &OrderItemRequest) -> Result<(), GatewayError>;
}

/// Answer to a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Like state after the toggle, as the backend sees it.
    pub is_liked: bool,
    pub flower_id: FlowerId,
    pub user_id: String,
}

/// Flips a user's like on a flower.
pub trait LikeGateway {
    fn toggle_like(&mut self, flower: &FlowerId, user_id: &str) -> Result<LikeResponse, GatewayError>;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// REST implementation of the gateways.
pub struct RestGateway {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl RestGateway {
    /// Creates a gateway for an already normalised API base URL
    /// (see [`normalize_api_url`](crate::config::normalize_api_url)).
    pub fn new(api_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(RestGateway {
            client,
            api_url: api_url.into(),
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Full URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, GatewayError> {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "backend responded");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

impl OrderGateway for RestGateway {
    fn create_order(&mut self, request: &OrderRequest) -> Result<OrderId, GatewayError> {
        let body = self.post_json("orders/create", request)?;
        order_id_from_response(&body)
    }

    fn create_order_item(&mut self, request: &OrderItemRequest) -> Result<(), GatewayError> {
        self.post_json("order-items/create", request)?;
        Ok(())
    }
}

impl LikeGateway for RestGateway {
    fn toggle_like(&mut self, flower: &FlowerId, user_id: &str) -> Result<LikeResponse, GatewayError> {
        let body = self.post_json(&format!("flowers/{}/like", flower), &json!({ "userId": user_id }))?;
        decode(body)
    }
}

/// Pulls `order.id` out of an order-creation response. The backend sends it
/// as a string or a number.
pub(crate) fn order_id_from_response(body: &Value) -> Result<OrderId, GatewayError> {
    match body.get("order").and_then(|order| order.get("id")) {
        Some(Value::String(id)) if !id.is_empty() => Ok(OrderId(id.clone())),
        Some(Value::Number(id)) => Ok(OrderId(id.to_string())),
        _ => Err(GatewayError::MissingOrderId),
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, GatewayError> {
    serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))
}
