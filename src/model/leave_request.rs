use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub team_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Workflow status stored in `leave_requests.status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Status a freshly submitted request starts in.
    pub fn initial(requires_approval: bool) -> Self {
        if requires_approval {
            LeaveStatus::Pending
        } else {
            LeaveStatus::Approved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_db_text() {
        assert_eq!(LeaveStatus::Approved.as_ref(), "approved");
        assert_eq!(LeaveStatus::from_str("rejected").unwrap(), LeaveStatus::Rejected);
        assert!(LeaveStatus::from_str("cancelled").is_err());
    }

    #[test]
    fn only_approval_free_types_start_approved() {
        assert_eq!(LeaveStatus::initial(true), LeaveStatus::Pending);
        assert_eq!(LeaveStatus::initial(false), LeaveStatus::Approved);
    }
}
