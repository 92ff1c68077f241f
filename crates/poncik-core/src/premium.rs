//! Premium plans and payment provider webhook handling.
//!
//! Webhook payloads are signed with the provider header scheme
//! `t=<unix seconds>,v1=<hex hmac>` where the MAC covers `"<t>.<body>"`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::signing::{constant_time_eq, hmac_hex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Monthly,
    Yearly,
}

impl Plan {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "monthly" => Ok(Plan::Monthly),
            "yearly" => Ok(Plan::Yearly),
            _ => Err(CoreError::invalid("Invalid plan")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }

    /// Price in minor currency units.
    pub fn price_minor(self) -> i64 {
        match self {
            Plan::Monthly => 2999,
            Plan::Yearly => 19999,
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Plan::Monthly => Duration::days(30),
            Plan::Yearly => Duration::days(365),
        }
    }

    /// Billing interval name understood by the provider.
    pub fn interval(self) -> &'static str {
        match self {
            Plan::Monthly => "month",
            Plan::Yearly => "year",
        }
    }

    pub fn expires_at(self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + self.duration()
    }
}

/// Verifies a webhook signature header against the raw request body.
pub fn verify_webhook_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<()> {
    let invalid = || CoreError::invalid("Invalid signature");

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => signatures.push(v),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(invalid)?;
    if now.timestamp().abs_diff(timestamp) > tolerance_secs.max(0) as u64 {
        return Err(invalid());
    }

    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);
    let expected = hmac_hex(secret.as_bytes(), &signed)?;

    if signatures.iter().any(|s| constant_time_eq(s, &expected)) {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Builds a header value for `body` signed at `timestamp`.
pub fn sign_webhook_payload(body: &[u8], secret: &str, timestamp: i64) -> Result<String> {
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);
    Ok(format!("t={timestamp},v1={}", hmac_hex(secret.as_bytes(), &signed)?))
}

/// Provider events the backend reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    CheckoutCompleted {
        user_id: String,
        plan: Plan,
        subscription_id: Option<String>,
    },
    SubscriptionDeleted {
        subscription_id: String,
    },
    Ignored(String),
}

impl ProviderEvent {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let event: Value = serde_json::from_slice(body)?;
        let kind = event["type"].as_str().unwrap_or_default().to_string();
        let object = &event["data"]["object"];

        match kind.as_str() {
            "checkout.session.completed" => {
                let metadata = &object["metadata"];
                let user_id = metadata["user_id"]
                    .as_str()
                    .ok_or_else(|| CoreError::invalid("Missing user_id metadata"))?;
                let plan = Plan::parse(metadata["plan"].as_str().unwrap_or_default())?;
                Ok(ProviderEvent::CheckoutCompleted {
                    user_id: user_id.to_string(),
                    plan,
                    subscription_id: object["subscription"].as_str().map(str::to_string),
                })
            }
            "customer.subscription.deleted" => {
                let id = object["id"]
                    .as_str()
                    .ok_or_else(|| CoreError::invalid("Missing subscription id"))?;
                Ok(ProviderEvent::SubscriptionDeleted {
                    subscription_id: id.to_string(),
                })
            }
            _ => Ok(ProviderEvent::Ignored(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_have_fixed_prices() {
        assert_eq!(Plan::parse("monthly").unwrap().price_minor(), 2999);
        assert_eq!(Plan::parse("yearly").unwrap().duration(), Duration::days(365));
        assert_eq!(Plan::parse("weekly").unwrap_err().to_string(), "Invalid plan");
    }

    #[test]
    fn signed_payload_verifies() {
        let now = Utc::now();
        let body = br#"{"type":"ping"}"#;
        let header = sign_webhook_payload(body, "whsec", now.timestamp()).unwrap();
        assert!(verify_webhook_signature(&header, body, "whsec", now, 300).is_ok());
        assert!(verify_webhook_signature(&header, body, "other", now, 300).is_err());
        assert!(verify_webhook_signature(&header, b"{}", "whsec", now, 300).is_err());
    }

    #[test]
    fn extreme_timestamps_are_rejected() {
        let now = Utc::now();
        for header in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
            let err = verify_webhook_signature(header, b"{}", "whsec", now, 300).unwrap_err();
            assert_eq!(err.to_string(), "Invalid signature");
        }
    }

    #[test]
    fn stale_signature_is_rejected() {
        let now = Utc::now();
        let body = b"{}";
        let header = sign_webhook_payload(body, "whsec", now.timestamp() - 301).unwrap();
        assert!(verify_webhook_signature(&header, body, "whsec", now, 300).is_err());
        assert!(verify_webhook_signature("garbage", body, "whsec", now, 300).is_err());
    }

    #[test]
    fn parses_checkout_completion() {
        let body = br#"{"type":"checkout.session.completed","data":{"object":{
            "subscription":"sub_1","metadata":{"user_id":"user_a","plan":"yearly"}}}}"#;
        assert_eq!(
            ProviderEvent::parse(body).unwrap(),
            ProviderEvent::CheckoutCompleted {
                user_id: "user_a".into(),
                plan: Plan::Yearly,
                subscription_id: Some("sub_1".into()),
            }
        );
    }

    #[test]
    fn parses_cancellation_and_ignores_others() {
        let body = br#"{"type":"customer.subscription.deleted","data":{"object":{"id":"sub_9"}}}"#;
        assert_eq!(
            ProviderEvent::parse(body).unwrap(),
            ProviderEvent::SubscriptionDeleted { subscription_id: "sub_9".into() }
        );
        let body = br#"{"type":"invoice.paid","data":{"object":{}}}"#;
        assert_eq!(
            ProviderEvent::parse(body).unwrap(),
            ProviderEvent::Ignored("invoice.paid".into())
        );
    }
}
