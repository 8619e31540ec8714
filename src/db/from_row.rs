//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, created_at";

pub const PAYMENT_INTENT_COLS: &str =
    "id, user_id, order_id, payment_id, payment_type, task_type, amount, status, created_at";

pub const COMPLAINT_COLS: &str =
    "id, user_id, description, location, status, order_id, created_at, filed_at";

pub const RTI_COLS: &str = "id, user_id, subject, department, body_text, status, order_id, document_path, created_at, paid_at";

pub const API_CREDENTIAL_COLS: &str = "id, user_id, api_key, plan, monthly_quota, used_count, quota_reset_at, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for PaymentIntent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentIntent {
            id: row.get(0)?,
            user_id: row.get(1)?,
            order_id: row.get(2)?,
            payment_id: row.get(3)?,
            payment_type: parse_enum(row, 4, "payment_type")?,
            task_type: TaskType::parse(&row.get::<_, String>(5)?),
            amount: row.get(6)?,
            status: parse_enum(row, 7, "status")?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for Complaint {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Complaint {
            id: row.get(0)?,
            user_id: row.get(1)?,
            description: row.get(2)?,
            location: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            order_id: row.get(5)?,
            created_at: row.get(6)?,
            filed_at: row.get(7)?,
        })
    }
}

impl FromRow for RtiRequest {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(RtiRequest {
            id: row.get(0)?,
            user_id: row.get(1)?,
            subject: row.get(2)?,
            department: row.get(3)?,
            body_text: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            order_id: row.get(6)?,
            document_path: row.get(7)?,
            created_at: row.get(8)?,
            paid_at: row.get(9)?,
        })
    }
}

impl FromRow for ApiCredential {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ApiCredential {
            id: row.get(0)?,
            user_id: row.get(1)?,
            api_key: row.get(2)?,
            plan: row.get(3)?,
            monthly_quota: row.get(4)?,
            used_count: row.get(5)?,
            quota_reset_at: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
