//! Payment gateway REST client
//!
//! Thin adapter over the gateway's checkout API: OAuth2 client-credentials
//! token exchange, order creation, and order capture. Amounts cross this
//! boundary as decimal strings and are converted to and from integer cents
//! here, so the rest of the system never touches floating-point money.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{ApiError, ApiResult};
use crate::loan::Currency;

/// Format integer cents as the gateway's decimal string ("1234" cents -> "12.34")
pub fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Parse a gateway decimal amount string into cents
pub fn parse_decimal_cents(value: &str) -> Option<i64> {
    let value: f64 = value.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

/// A created checkout order awaiting buyer approval
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: String,
    pub approval_url: String,
}

/// A captured payment
#[derive(Debug, Clone)]
pub struct CapturedPayment {
    pub capture_id: String,
    pub amount_cents: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<OrderLink>,
}

#[derive(Debug, Deserialize)]
struct Money {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Capture {
    amount: Money,
}

#[derive(Debug, Deserialize)]
struct Payments {
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct CapturedUnit {
    payments: Payments,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    id: String,
    status: String,
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    #[serde(default)]
    details: Vec<GatewayErrorDetail>,
}

impl GatewayErrorBody {
    fn best_message(self) -> String {
        self.details
            .into_iter()
            .find_map(|d| d.description)
            .or(self.message)
            .or(self.error_description)
            .unwrap_or_else(|| "Unknown gateway error".to_string())
    }
}

/// Payment gateway client
#[derive(Clone)]
pub struct PayPalClient {
    http: Client,
    config: GatewayConfig,
}

impl PayPalClient {
    /// Build a client from gateway configuration
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    /// Exchange client credentials for a bearer token
    async fn access_token(&self) -> ApiResult<String> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.config.api_base))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let body: GatewayErrorBody = response.json().await.unwrap_or(GatewayErrorBody {
                message: None,
                error_description: None,
                details: vec![],
            });
            return Err(ApiError::ExternalServiceError(format!(
                "Token exchange failed: {}",
                body.best_message()
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Create a checkout order and return its approval URL.
    ///
    /// `reference_id` travels in the order's custom_id so the callback can
    /// be correlated independently of our own records.
    pub async fn create_order(
        &self,
        amount_cents: i64,
        currency: Currency,
        description: &str,
        reference_id: &str,
    ) -> ApiResult<CreatedOrder> {
        let access_token = self.access_token().await?;

        let order_data = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": currency.code(),
                    "value": format_cents(amount_cents),
                },
                "description": description,
                "custom_id": reference_id,
            }],
            "application_context": {
                "brand_name": "Bundle",
                "landing_page": "NO_PREFERENCE",
                "user_action": "PAY_NOW",
                "return_url": self.config.return_url,
                "cancel_url": self.config.cancel_url,
                "shipping_preference": "NO_SHIPPING",
            },
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.config.api_base))
            .bearer_auth(&access_token)
            .header("PayPal-Request-Id", Uuid::new_v4().to_string())
            .json(&order_data)
            .send()
            .await?;

        if !response.status().is_success() {
            let body: GatewayErrorBody = response.json().await.unwrap_or(GatewayErrorBody {
                message: None,
                error_description: None,
                details: vec![],
            });
            return Err(ApiError::ExternalServiceError(format!(
                "Order creation failed: {}",
                body.best_message()
            )));
        }

        let order: OrderResponse = response.json().await?;

        let approval_url = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href)
            .ok_or_else(|| {
                ApiError::ExternalServiceError(
                    "No approval URL found in gateway response".to_string(),
                )
            })?;

        tracing::debug!(order_id = %order.id, "Gateway order created");

        Ok(CreatedOrder {
            order_id: order.id,
            approval_url,
        })
    }

    /// Capture an approved order, returning the captured amount
    pub async fn capture_order(&self, order_id: &str) -> ApiResult<CapturedPayment> {
        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.config.api_base, order_id
            ))
            .bearer_auth(&access_token)
            .header("Content-Type", "application/json")
            .header("PayPal-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let body: GatewayErrorBody = response.json().await.unwrap_or(GatewayErrorBody {
                message: None,
                error_description: None,
                details: vec![],
            });
            return Err(ApiError::ExternalServiceError(format!(
                "Payment capture failed: {}",
                body.best_message()
            )));
        }

        let capture: CaptureResponse = response.json().await?;

        let amount_value = capture
            .purchase_units
            .first()
            .and_then(|unit| unit.payments.captures.first())
            .map(|c| c.amount.value.as_str())
            .ok_or_else(|| {
                ApiError::ExternalServiceError(
                    "No capture amount found in gateway response".to_string(),
                )
            })?;

        let amount_cents = parse_decimal_cents(amount_value).ok_or_else(|| {
            ApiError::ExternalServiceError(format!(
                "Unparseable capture amount '{}'",
                amount_value
            ))
        })?;

        tracing::debug!(capture_id = %capture.id, amount_cents, "Gateway payment captured");

        Ok(CapturedPayment {
            capture_id: capture.id,
            amount_cents,
            status: capture.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(100), "1.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(1_000_000), "10000.00");
    }

    #[test]
    fn test_parse_decimal_cents() {
        assert_eq!(parse_decimal_cents("12.34"), Some(1234));
        assert_eq!(parse_decimal_cents("0.05"), Some(5));
        assert_eq!(parse_decimal_cents("10000.00"), Some(1_000_000));
        assert_eq!(parse_decimal_cents("garbage"), None);
        assert_eq!(parse_decimal_cents("-1.00"), None);
    }

    #[test]
    fn test_round_trip() {
        for cents in [1, 99, 100, 101, 123_456] {
            assert_eq!(parse_decimal_cents(&format_cents(cents)), Some(cents));
        }
    }

    #[test]
    fn test_gateway_error_message_priority() {
        let body = GatewayErrorBody {
            message: Some("generic".to_string()),
            error_description: None,
            details: vec![GatewayErrorDetail {
                description: Some("specific".to_string()),
            }],
        };
        assert_eq!(body.best_message(), "specific");

        let body = GatewayErrorBody {
            message: Some("generic".to_string()),
            error_description: None,
            details: vec![],
        };
        assert_eq!(body.best_message(), "generic");

        let body = GatewayErrorBody {
            message: None,
            error_description: None,
            details: vec![],
        };
        assert_eq!(body.best_message(), "Unknown gateway error");
    }
}
