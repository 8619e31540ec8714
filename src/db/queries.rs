use chrono::Utc;
use rusqlite::{params, Connection};

use crate::crypto::{generate_session_token, hash_secret};
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    query_one, API_CREDENTIAL_COLS, COMPLAINT_COLS, PAYMENT_INTENT_COLS, RTI_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users & Sessions ============

pub fn create_user(conn: &Connection, email: &str, name: &str) -> Result<User> {
    let id = EntityType::User.gen_id();
    let created_at = now();

    conn.execute(
        "INSERT INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, email, name, created_at],
    )?;

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        created_at,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

/// Create a session for a user, returning the plaintext bearer token.
/// Only the hash is stored.
pub fn create_session(conn: &Connection, user_id: &str, ttl_secs: i64) -> Result<String> {
    let token = generate_session_token();
    let created_at = now();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            EntityType::Session.gen_id(),
            user_id,
            hash_secret(&token),
            created_at,
            created_at + ttl_secs
        ],
    )?;

    Ok(token)
}

/// Resolve a bearer token to its user id, honoring expiry.
pub fn get_session_user(conn: &Connection, token: &str) -> Result<Option<String>> {
    let hash = hash_secret(token);
    let mut stmt = conn.prepare(
        "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
    )?;
    let mut rows = stmt.query(params![hash, now()])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

// ============ Payment Intents ============

pub struct CreatePaymentIntent<'a> {
    pub user_id: &'a str,
    pub order_id: &'a str,
    pub payment_type: PaymentType,
    pub task_type: &'a TaskType,
    pub amount: i64,
}

pub fn create_payment_intent(
    conn: &Connection,
    input: &CreatePaymentIntent<'_>,
) -> Result<PaymentIntent> {
    let id = EntityType::PaymentIntent.gen_id();
    let created_at = now();

    conn.execute(
        "INSERT INTO payment_intents (id, user_id, order_id, payment_id, payment_type, task_type, amount, status, created_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, 'pending', ?7)",
        params![
            &id,
            input.user_id,
            input.order_id,
            input.payment_type.as_str(),
            input.task_type.as_str(),
            input.amount,
            created_at
        ],
    )?;

    Ok(PaymentIntent {
        id,
        user_id: input.user_id.to_string(),
        order_id: input.order_id.to_string(),
        payment_id: None,
        payment_type: input.payment_type,
        task_type: input.task_type.clone(),
        amount: input.amount,
        status: IntentStatus::Pending,
        created_at,
    })
}

pub fn get_payment_intent_by_order(
    conn: &Connection,
    order_id: &str,
) -> Result<Option<PaymentIntent>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_intents WHERE order_id = ?1",
            PAYMENT_INTENT_COLS
        ),
        &[&order_id],
    )
}

pub fn get_payment_intent_by_payment(
    conn: &Connection,
    payment_id: &str,
) -> Result<Option<PaymentIntent>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_intents WHERE payment_id = ?1",
            PAYMENT_INTENT_COLS
        ),
        &[&payment_id],
    )
}

/// Atomically transition a payment intent from `pending` to `succeeded`,
/// backfilling the gateway payment id.
///
/// This is the sole synchronization primitive of the confirmation
/// pipeline: a single conditional UPDATE (compare-and-swap on the status
/// column), so two racing confirmations resolve at the storage layer even
/// across processes. Exactly one caller observes `Transitioned` and may
/// dispatch fulfillment; the other observes `AlreadySucceeded` and must
/// treat the confirmation as a success without re-dispatching.
///
/// A missing row is an error: callers are expected to have resolved the
/// intent (or chosen to no-op) before attempting the transition.
/// `payment_id` is optional because `order.paid` confirmations carry no
/// payment id; a later `payment.captured` delivery backfills it.
pub fn try_mark_succeeded(
    conn: &Connection,
    order_id: &str,
    payment_id: Option<&str>,
) -> Result<TransitionOutcome> {
    let affected = conn.execute(
        "UPDATE payment_intents SET status = 'succeeded', payment_id = COALESCE(?2, payment_id)
         WHERE order_id = ?1 AND status = 'pending'",
        params![order_id, payment_id],
    )?;

    if affected > 0 {
        return Ok(TransitionOutcome::Transitioned);
    }

    // Lost the race, or the intent never existed. A succeeded row is
    // immutable except for payment-id backfill.
    if get_payment_intent_by_order(conn, order_id)?.is_some() {
        if let Some(payment_id) = payment_id {
            conn.execute(
                "UPDATE payment_intents SET payment_id = ?2
                 WHERE order_id = ?1 AND payment_id IS NULL",
                params![order_id, payment_id],
            )?;
        }
        Ok(TransitionOutcome::AlreadySucceeded)
    } else {
        Err(AppError::NotFound(format!(
            "No payment intent for order {}",
            order_id
        )))
    }
}

// ============ Complaints ============

pub fn create_complaint(
    conn: &Connection,
    user_id: &str,
    input: &CreateComplaint,
) -> Result<Complaint> {
    let id = EntityType::Complaint.gen_id();
    let created_at = now();

    conn.execute(
        "INSERT INTO complaints (id, user_id, description, location, status, order_id, created_at, filed_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', NULL, ?5, NULL)",
        params![&id, user_id, &input.description, &input.location, created_at],
    )?;

    Ok(Complaint {
        id,
        user_id: user_id.to_string(),
        description: input.description.clone(),
        location: input.location.clone(),
        status: ComplaintStatus::Pending,
        order_id: None,
        created_at,
        filed_at: None,
    })
}

pub fn get_complaint_by_id(conn: &Connection, id: &str) -> Result<Option<Complaint>> {
    query_one(
        conn,
        &format!("SELECT {} FROM complaints WHERE id = ?1", COMPLAINT_COLS),
        &[&id],
    )
}

/// Fallback correlation: the most recent complaint of this user carrying
/// this order id. Explicit artifact ids from confirmation metadata are
/// preferred over this lookup.
pub fn latest_complaint_for_order(
    conn: &Connection,
    user_id: &str,
    order_id: &str,
) -> Result<Option<Complaint>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM complaints WHERE user_id = ?1 AND order_id = ?2
             ORDER BY created_at DESC LIMIT 1",
            COMPLAINT_COLS
        ),
        &[&user_id, &order_id],
    )
}

/// Stamp the gateway order id onto a complaint at checkout time.
pub fn set_complaint_order(conn: &Connection, id: &str, order_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE complaints SET order_id = ?2 WHERE id = ?1",
        params![id, order_id],
    )?;
    Ok(())
}

/// Mark a complaint as filed. Conditional on `pending` so a duplicate
/// fulfillment invocation cannot overwrite the original filing time.
pub fn mark_complaint_filed(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE complaints SET status = 'filed', filed_at = ?2
         WHERE id = ?1 AND status = 'pending'",
        params![id, now()],
    )?;
    Ok(affected > 0)
}

// ============ RTI Requests ============

pub fn create_rti_request(
    conn: &Connection,
    user_id: &str,
    input: &CreateRtiRequest,
) -> Result<RtiRequest> {
    let id = EntityType::RtiRequest.gen_id();
    let created_at = now();

    conn.execute(
        "INSERT INTO rti_requests (id, user_id, subject, department, body_text, status, order_id, document_path, created_at, paid_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'draft', NULL, NULL, ?6, NULL)",
        params![
            &id,
            user_id,
            &input.subject,
            &input.department,
            &input.body_text,
            created_at
        ],
    )?;

    Ok(RtiRequest {
        id,
        user_id: user_id.to_string(),
        subject: input.subject.clone(),
        department: input.department.clone(),
        body_text: input.body_text.clone(),
        status: RtiStatus::Draft,
        order_id: None,
        document_path: None,
        created_at,
        paid_at: None,
    })
}

pub fn get_rti_by_id(conn: &Connection, id: &str) -> Result<Option<RtiRequest>> {
    query_one(
        conn,
        &format!("SELECT {} FROM rti_requests WHERE id = ?1", RTI_COLS),
        &[&id],
    )
}

/// Fallback correlation: the most recent draft RTI of this user created
/// at-or-after the payment intent. Racy if a user drafts two RTIs before
/// paying either; explicit artifact ids from confirmation metadata are
/// preferred over this lookup.
pub fn latest_draft_rti_since(
    conn: &Connection,
    user_id: &str,
    since: i64,
) -> Result<Option<RtiRequest>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM rti_requests WHERE user_id = ?1 AND status = 'draft' AND created_at >= ?2
             ORDER BY created_at DESC LIMIT 1",
            RTI_COLS
        ),
        &[&user_id, &since],
    )
}

/// Explicit correlation: the RTI stamped with this order id at checkout.
pub fn get_rti_by_order(conn: &Connection, order_id: &str) -> Result<Option<RtiRequest>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM rti_requests WHERE order_id = ?1",
            RTI_COLS
        ),
        &[&order_id],
    )
}

pub fn set_rti_order(conn: &Connection, id: &str, order_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE rti_requests SET order_id = ?2 WHERE id = ?1",
        params![id, order_id],
    )?;
    Ok(())
}

/// Advance a draft RTI to `paid`. Conditional on `draft` so a duplicate
/// fulfillment invocation observes it already advanced.
pub fn mark_rti_paid(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE rti_requests SET status = 'paid', paid_at = ?2
         WHERE id = ?1 AND status = 'draft'",
        params![id, now()],
    )?;
    Ok(affected > 0)
}

/// Record the on-demand regeneration endpoint, only if none is set yet.
pub fn set_rti_document_path(conn: &Connection, id: &str, path: &str) -> Result<()> {
    conn.execute(
        "UPDATE rti_requests SET document_path = ?2
         WHERE id = ?1 AND document_path IS NULL",
        params![id, path],
    )?;
    Ok(())
}

// ============ Developer API Credentials ============

/// Mint (or rotate) the user's API credential and reset the quota window.
pub fn upsert_api_credential(
    conn: &Connection,
    user_id: &str,
    api_key: &str,
    plan: &str,
    monthly_quota: i64,
) -> Result<ApiCredential> {
    let ts = now();

    conn.execute(
        "INSERT INTO api_credentials (id, user_id, api_key, plan, monthly_quota, used_count, quota_reset_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
             api_key = excluded.api_key,
             plan = excluded.plan,
             monthly_quota = excluded.monthly_quota,
             used_count = 0,
             quota_reset_at = excluded.quota_reset_at,
             updated_at = excluded.updated_at",
        params![
            EntityType::ApiCredential.gen_id(),
            user_id,
            api_key,
            plan,
            monthly_quota,
            ts
        ],
    )?;

    get_api_credential_for_user(conn, user_id)?
        .ok_or_else(|| AppError::Internal("API credential upsert did not persist".into()))
}

pub fn get_api_credential_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<ApiCredential>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM api_credentials WHERE user_id = ?1",
            API_CREDENTIAL_COLS
        ),
        &[&user_id],
    )
}
