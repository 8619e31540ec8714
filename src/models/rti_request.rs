use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RtiStatus {
    Draft,
    Paid,
    /// Set by the response-tracking flow once the department replies;
    /// still counts as paid for document access.
    ResponseReceived,
}

impl RtiStatus {
    /// Whether the request has been paid for (document may be served).
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Draft)
    }
}

impl std::str::FromStr for RtiStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "paid" => Ok(Self::Paid),
            "response_received" => Ok(Self::ResponseReceived),
            _ => Err(()),
        }
    }
}

/// A drafted Right-to-Information request. `body_text` is the generated
/// legal text that gets rendered into the paginated document once paid.
#[derive(Debug, Clone, Serialize)]
pub struct RtiRequest {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub department: String,
    pub body_text: String,
    pub status: RtiStatus,
    pub order_id: Option<String>,
    /// On-demand regeneration endpoint path, set at fulfillment time.
    pub document_path: Option<String>,
    pub created_at: i64,
    pub paid_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRtiRequest {
    pub subject: String,
    pub department: String,
    pub body_text: String,
}
