//! Hosted checkout sessions at the payment provider.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{CoreError, OAuthError, Result};
use crate::premium::Plan;
use crate::storage::PaymentsConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

pub struct PaymentsClient {
    api_base: String,
    secret_key: String,
    currency: String,
    http: Client,
}

impl PaymentsClient {
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
            http: super::http_client(),
        }
    }

    /// Form fields of a recurring single-line checkout for `plan`.
    fn checkout_form(&self, user_id: &str, plan: Plan, frontend_url: &str) -> Vec<(String, String)> {
        let frontend = frontend_url.trim_end_matches('/');
        let mut label = plan.as_str().to_string();
        if let Some(first) = label.get_mut(..1) {
            first.make_ascii_uppercase();
        }
        [
            ("mode", "subscription".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", self.currency.clone()),
            ("line_items[0][price_data][unit_amount]", plan.price_minor().to_string()),
            ("line_items[0][price_data][recurring][interval]", plan.interval().to_string()),
            ("line_items[0][price_data][product_data][name]", format!("Poncik Premium - {label}")),
            (
                "line_items[0][price_data][product_data][description]",
                "Premium membership with exclusive features".to_string(),
            ),
            (
                "success_url",
                format!("{frontend}/premium/success?session_id={{CHECKOUT_SESSION_ID}}"),
            ),
            ("cancel_url", format!("{frontend}/premium/cancel")),
            ("client_reference_id", user_id.to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[plan]", plan.as_str().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    pub async fn create_checkout(&self, user_id: &str, plan: Plan, frontend_url: &str) -> Result<CheckoutSession> {
        if self.secret_key.is_empty() {
            return Err(OAuthError::CredentialsNotConfigured {
                service: "payments".into(),
            }
            .into());
        }

        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&self.checkout_form(user_id, plan, frontend_url))
            .send()
            .await
            .map_err(|e| CoreError::upstream("payments", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(%status, body = %text, "checkout session creation failed");
            return Err(CoreError::upstream("payments", format!("HTTP {status}")));
        }

        let session: CheckoutSession = resp
            .json()
            .await
            .map_err(|e| CoreError::upstream("payments", e))?;
        tracing::info!(user_id, plan = plan.as_str(), checkout = %session.id, "checkout session created");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PaymentsClient {
        PaymentsClient::new(&PaymentsConfig {
            secret_key: "sk_test".into(),
            ..PaymentsConfig::default()
        })
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> &'a str {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn checkout_form_carries_plan_metadata() {
        let form = client().checkout_form("user_1", Plan::Yearly, "https://app.example/");
        assert_eq!(field(&form, "metadata[user_id]"), "user_1");
        assert_eq!(field(&form, "metadata[plan]"), "yearly");
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), "19999");
        assert_eq!(field(&form, "line_items[0][price_data][recurring][interval]"), "year");
        assert_eq!(field(&form, "cancel_url"), "https://app.example/premium/cancel");
        assert!(field(&form, "line_items[0][price_data][product_data][name]").ends_with("Yearly"));
    }
}
