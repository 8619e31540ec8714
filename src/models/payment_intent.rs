use serde::{Deserialize, Serialize};

/// Whether the checkout is a one-off task fee or a recurring subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Task,
    Subscription,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Subscription => "subscription",
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "subscription" => Ok(Self::Subscription),
            _ => Err(()),
        }
    }
}

/// What a payment is buying. Open set: gateway metadata may carry task
/// types this build does not know, which must still confirm cleanly
/// (fulfillment logs and no-ops on them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskType {
    ComplaintFiling,
    RtiDrafting,
    DeveloperApiPro,
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ComplaintFiling => "complaint_filing",
            Self::RtiDrafting => "rti_drafting",
            Self::DeveloperApiPro => "developer_api_pro",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "complaint_filing" => Self::ComplaintFiling,
            "rti_drafting" => Self::RtiDrafting,
            "developer_api_pro" => Self::DeveloperApiPro,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Settlement status lattice. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Succeeded,
}

impl std::str::FromStr for IntentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            _ => Err(()),
        }
    }
}

/// Durable record of one checkout attempt.
///
/// `order_id` is assigned by the gateway when the order is created;
/// `payment_id` is backfilled by whichever confirmation path wins the
/// `pending -> succeeded` race. Rows are never deleted.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub user_id: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub payment_type: PaymentType,
    pub task_type: TaskType,
    pub amount: i64,
    pub status: IntentStatus,
    pub created_at: i64,
}

/// Outcome of the atomic conditional transition on a payment intent.
///
/// Only the caller that observes `Transitioned` may dispatch fulfillment;
/// `AlreadySucceeded` means another confirmation path won the race and
/// the overall operation is still a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Transitioned,
    AlreadySucceeded,
}
