//! Checkout initiation: request an order from the gateway and persist
//! the pending payment intent.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{CurrentUser, Json};
use crate::gateway::{CreateOrderRequest, OrderNotes};
use crate::models::{PaymentType, TaskType};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub task_type: String,
    /// The complaint or RTI this payment is for. Required for complaint
    /// filing; optional for RTI drafting (falls back to the most recent
    /// draft at confirmation time).
    #[serde(default)]
    pub artifact_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: &'static str,
    /// Public gateway key for the checkout widget.
    pub key_id: String,
}

pub async fn initiate_checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let task_type = TaskType::parse(&request.task_type);

    let (amount, payment_type) = match &task_type {
        TaskType::ComplaintFiling => (state.pricing.complaint_filing, PaymentType::Task),
        TaskType::RtiDrafting => (state.pricing.rti_drafting, PaymentType::Task),
        TaskType::DeveloperApiPro => (state.pricing.developer_api_pro, PaymentType::Subscription),
        TaskType::Other(other) => {
            return Err(AppError::BadRequest(format!("Unknown task type: {}", other)));
        }
    };

    // Validate artifact ownership before any money-side call.
    {
        let conn = state.db.get()?;
        match (&task_type, &request.artifact_id) {
            (TaskType::ComplaintFiling, Some(artifact_id)) => {
                let complaint = queries::get_complaint_by_id(&conn, artifact_id)?
                    .ok_or_else(|| AppError::NotFound("Complaint not found".into()))?;
                if complaint.user_id != user.user_id {
                    return Err(AppError::Forbidden(
                        "Complaint belongs to a different user".into(),
                    ));
                }
            }
            (TaskType::ComplaintFiling, None) => {
                return Err(AppError::BadRequest(
                    "artifact_id is required for complaint filing".into(),
                ));
            }
            (TaskType::RtiDrafting, Some(artifact_id)) => {
                let rti = queries::get_rti_by_id(&conn, artifact_id)?
                    .ok_or_else(|| AppError::NotFound("RTI request not found".into()))?;
                if rti.user_id != user.user_id {
                    return Err(AppError::Forbidden(
                        "RTI request belongs to a different user".into(),
                    ));
                }
            }
            _ => {}
        }
    }

    // Order creation fails closed: on gateway failure no intent row is
    // persisted and the caller may retry with a fresh order.
    let order = state
        .gateway
        .create_order(&CreateOrderRequest {
            amount,
            currency: "INR".to_string(),
            receipt: format!("janhit-{}", Uuid::new_v4().as_simple()),
            notes: OrderNotes {
                user_id: Some(user.user_id.clone()),
                task_type: Some(task_type.as_str().to_string()),
                artifact_id: request.artifact_id.clone(),
            },
        })
        .await?;

    let conn = state.db.get()?;
    let intent = queries::create_payment_intent(
        &conn,
        &queries::CreatePaymentIntent {
            user_id: &user.user_id,
            order_id: &order.id,
            payment_type,
            task_type: &task_type,
            amount,
        },
    )?;

    // Stamp the order id onto the artifact so confirmations can resolve
    // it without relying on the recency heuristic.
    if let Some(artifact_id) = &request.artifact_id {
        match &task_type {
            TaskType::ComplaintFiling => {
                queries::set_complaint_order(&conn, artifact_id, &order.id)?
            }
            TaskType::RtiDrafting => queries::set_rti_order(&conn, artifact_id, &order.id)?,
            _ => {}
        }
    }

    tracing::info!(
        intent_id = %intent.id,
        order_id = %order.id,
        task_type = %task_type.as_str(),
        amount,
        "Payment intent created"
    );

    Ok(Json(CheckoutResponse {
        order_id: order.id,
        amount,
        currency: "INR",
        key_id: state.gateway_key_id.clone(),
    }))
}
