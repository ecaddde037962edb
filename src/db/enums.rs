use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Integer;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;

// Enums are stored as INTEGER ordinals so ORDER BY follows declaration order.

/// Lifecycle status shared by projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Integer)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    NotStarted = 0,
    InProgress = 1,
    Completed = 2,
    Paused = 3,
    Cancelled = 4,
}

impl WorkStatus {
    pub const ALL: [WorkStatus; 5] = [
        WorkStatus::NotStarted,
        WorkStatus::InProgress,
        WorkStatus::Completed,
        WorkStatus::Paused,
        WorkStatus::Cancelled,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(WorkStatus::NotStarted),
            1 => Some(WorkStatus::InProgress),
            2 => Some(WorkStatus::Completed),
            3 => Some(WorkStatus::Paused),
            4 => Some(WorkStatus::Cancelled),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "not_started",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
            WorkStatus::Paused => "paused",
            WorkStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "Not started",
            WorkStatus::InProgress => "In progress",
            WorkStatus::Completed => "Completed",
            WorkStatus::Paused => "Paused",
            WorkStatus::Cancelled => "Cancelled",
        }
    }
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::NotStarted
    }
}

impl FromSql<Integer, Pg> for WorkStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <i32 as FromSql<Integer, Pg>>::from_sql(bytes)?;
        WorkStatus::from_i32(value)
            .ok_or_else(|| format!("Unrecognized work status: {}", value).into())
    }
}

impl ToSql<Integer, Pg> for WorkStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&(*self as i32).to_be_bytes())?;
        Ok(IsNull::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Integer)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Urgent = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            3 => Some(Priority::Urgent),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl FromSql<Integer, Pg> for Priority {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <i32 as FromSql<Integer, Pg>>::from_sql(bytes)?;
        Priority::from_i32(value).ok_or_else(|| format!("Unrecognized priority: {}", value).into())
    }
}

impl ToSql<Integer, Pg> for Priority {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&(*self as i32).to_be_bytes())?;
        Ok(IsNull::No)
    }
}

/// Progress of a recorded media file through transcoding and transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Integer)]
#[serde(rename_all = "snake_case")]
pub enum ConvertStatus {
    Pending = 0,
    Converting = 1,
    Transcribing = 2,
    Completed = 3,
    Failed = 4,
}

impl ConvertStatus {
    pub const ALL: [ConvertStatus; 5] = [
        ConvertStatus::Pending,
        ConvertStatus::Converting,
        ConvertStatus::Transcribing,
        ConvertStatus::Completed,
        ConvertStatus::Failed,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ConvertStatus::Pending),
            1 => Some(ConvertStatus::Converting),
            2 => Some(ConvertStatus::Transcribing),
            3 => Some(ConvertStatus::Completed),
            4 => Some(ConvertStatus::Failed),
            _ => None,
        }
    }

    /// A job in one of these states is already running and must not be restarted.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ConvertStatus::Converting | ConvertStatus::Transcribing)
    }

    pub fn key(&self) -> &'static str {
        match self {
            ConvertStatus::Pending => "pending",
            ConvertStatus::Converting => "converting",
            ConvertStatus::Transcribing => "transcribing",
            ConvertStatus::Completed => "completed",
            ConvertStatus::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConvertStatus::Pending => "Pending",
            ConvertStatus::Converting => "Converting",
            ConvertStatus::Transcribing => "Transcribing",
            ConvertStatus::Completed => "Completed",
            ConvertStatus::Failed => "Failed",
        }
    }
}

impl Default for ConvertStatus {
    fn default() -> Self {
        ConvertStatus::Pending
    }
}

impl FromSql<Integer, Pg> for ConvertStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <i32 as FromSql<Integer, Pg>>::from_sql(bytes)?;
        ConvertStatus::from_i32(value)
            .ok_or_else(|| format!("Unrecognized convert status: {}", value).into())
    }
}

impl ToSql<Integer, Pg> for ConvertStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&(*self as i32).to_be_bytes())?;
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_round_trip_through_from_i32() {
        for status in WorkStatus::ALL {
            assert_eq!(WorkStatus::from_i32(status as i32), Some(status));
        }
        for priority in Priority::ALL {
            assert_eq!(Priority::from_i32(priority as i32), Some(priority));
        }
        assert_eq!(ConvertStatus::from_i32(99), None);
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&WorkStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(parsed, Priority::Urgent);
        assert_eq!(ConvertStatus::Transcribing.key(), "transcribing");
    }

    #[test]
    fn in_progress_states() {
        assert!(ConvertStatus::Converting.is_in_progress());
        assert!(ConvertStatus::Transcribing.is_in_progress());
        assert!(!ConvertStatus::Failed.is_in_progress());
    }
}
