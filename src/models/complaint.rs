use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Filed,
}

impl std::str::FromStr for ComplaintStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "filed" => Ok(Self::Filed),
            _ => Err(()),
        }
    }
}

/// A citizen complaint awaiting paid filing with the civic department.
/// Correlates to its payment intent via `order_id`, stamped at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Complaint {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub location: String,
    pub status: ComplaintStatus,
    pub order_id: Option<String>,
    pub created_at: i64,
    pub filed_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateComplaint {
    pub description: String,
    pub location: String,
}
