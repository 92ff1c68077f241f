//! Premium checkout, provider webhook and status.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use poncik_core::premium::{verify_webhook_signature, Plan, ProviderEvent};
use poncik_core::CoreError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// Header carrying the provider's `t=...,v1=...` signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan: String,
}

pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<Json<Value>> {
    let plan = Plan::parse(&body.plan)?;
    let checkout = state
        .payments
        .create_checkout(&user.user_id, plan, &state.config.server.frontend_url)
        .await?;
    Ok(Json(json!({ "checkout_url": checkout.url })))
}

/// Applies a signed provider event. Unknown event types are acknowledged
/// and ignored.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Json<Value>> {
    if state.config.payments.webhook_secret.is_empty() {
        tracing::warn!("webhook received but no webhook secret is configured");
        return Err(CoreError::invalid("Invalid signature").into());
    }
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::invalid("Invalid signature"))?;
    let now = Utc::now();
    verify_webhook_signature(
        signature,
        &body,
        &state.config.payments.webhook_secret,
        now,
        state.config.payments.webhook_tolerance_secs,
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "webhook signature rejected");
        e
    })?;

    match ProviderEvent::parse(&body)? {
        ProviderEvent::CheckoutCompleted {
            user_id,
            plan,
            subscription_id,
        } => {
            let activated = state
                .db
                .lock()
                .await
                .activate_premium(&user_id, plan, subscription_id.as_deref(), now)?;
            if !activated {
                tracing::warn!(user_id = %user_id, "checkout completed for unknown user");
            }
        }
        ProviderEvent::SubscriptionDeleted { subscription_id } => {
            let users = state
                .db
                .lock()
                .await
                .cancel_provider_subscription(&subscription_id)?;
            tracing::info!(subscription_id = %subscription_id, users = users.len(), "premium cancelled");
        }
        ProviderEvent::Ignored(kind) => {
            tracing::debug!(event = %kind, "ignoring provider event");
        }
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn status(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({
        "is_premium": user.has_active_premium(Utc::now()),
        "expires_at": user.premium_expires_at,
    }))
}
