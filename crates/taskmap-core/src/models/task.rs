//! Work items ("tasks") and their enumerated attributes.
//!
//! Status, review status, and priority travel over the wire as the integer codes
//! used by the task service; each enum also parses from its lowercase name.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::LatLng;
use crate::error::TaskmapError;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the collection (e.g. a challenge) that bounds a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user holding a task lock
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    Created,
    Fixed,
    FalsePositive,
    Skipped,
    Deleted,
    AlreadyFixed,
    TooHard,
    Disabled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 8] = [
        TaskStatus::Created,
        TaskStatus::Fixed,
        TaskStatus::FalsePositive,
        TaskStatus::Skipped,
        TaskStatus::Deleted,
        TaskStatus::AlreadyFixed,
        TaskStatus::TooHard,
        TaskStatus::Disabled,
    ];

    pub fn code(self) -> u8 {
        match self {
            TaskStatus::Created => 0,
            TaskStatus::Fixed => 1,
            TaskStatus::FalsePositive => 2,
            TaskStatus::Skipped => 3,
            TaskStatus::Deleted => 4,
            TaskStatus::AlreadyFixed => 5,
            TaskStatus::TooHard => 6,
            TaskStatus::Disabled => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Fixed => "fixed",
            TaskStatus::FalsePositive => "false_positive",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Deleted => "deleted",
            TaskStatus::AlreadyFixed => "already_fixed",
            TaskStatus::TooHard => "too_hard",
            TaskStatus::Disabled => "disabled",
        }
    }
}

impl TryFrom<u8> for TaskStatus {
    type Error = TaskmapError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TaskStatus::ALL.into_iter().find(|s| s.code() == code).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "task status", value: code.to_string() }
        })
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> u8 {
        status.code()
    }
}

impl FromStr for TaskStatus {
    type Err = TaskmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_name(s);
        TaskStatus::ALL.into_iter().find(|v| v.as_str() == normalized).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "task status", value: s.to_string() }
        })
    }
}

/// Review workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewStatus {
    Requested,
    Approved,
    Rejected,
    AssistedApproved,
    Disputed,
    Unnecessary,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 6] = [
        ReviewStatus::Requested,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
        ReviewStatus::AssistedApproved,
        ReviewStatus::Disputed,
        ReviewStatus::Unnecessary,
    ];

    pub fn code(self) -> u8 {
        match self {
            ReviewStatus::Requested => 0,
            ReviewStatus::Approved => 1,
            ReviewStatus::Rejected => 2,
            ReviewStatus::AssistedApproved => 3,
            ReviewStatus::Disputed => 4,
            ReviewStatus::Unnecessary => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Requested => "requested",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::AssistedApproved => "assisted_approved",
            ReviewStatus::Disputed => "disputed",
            ReviewStatus::Unnecessary => "unnecessary",
        }
    }
}

impl TryFrom<u8> for ReviewStatus {
    type Error = TaskmapError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ReviewStatus::ALL.into_iter().find(|s| s.code() == code).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "review status", value: code.to_string() }
        })
    }
}

impl From<ReviewStatus> for u8 {
    fn from(status: ReviewStatus) -> u8 {
        status.code()
    }
}

impl FromStr for ReviewStatus {
    type Err = TaskmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_name(s);
        ReviewStatus::ALL.into_iter().find(|v| v.as_str() == normalized).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "review status", value: s.to_string() }
        })
    }
}

/// Task priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn code(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = TaskmapError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Priority::ALL.into_iter().find(|p| p.code() == code).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "priority", value: code.to_string() }
        })
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority.code()
    }
}

impl FromStr for Priority {
    type Err = TaskmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_name(s);
        Priority::ALL.into_iter().find(|v| v.as_str() == normalized).ok_or_else(|| {
            TaskmapError::UnknownVariant { kind: "priority", value: s.to_string() }
        })
    }
}

fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// A map-located unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: TaskId,

    /// Collection the task belongs to
    pub parent_id: ScopeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LatLng>,

    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,

    #[serde(default)]
    pub priority: Priority,

    /// Holder of the task lock, if any
    #[serde(
        default,
        deserialize_with = "deserialize_lock_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub locked_by: Option<UserId>,
}

impl WorkItem {
    /// Create an unlocked, unreviewed task with default priority
    pub fn new(id: TaskId, parent_id: ScopeId, status: TaskStatus) -> Self {
        Self {
            id,
            parent_id,
            name: None,
            position: None,
            status,
            review_status: None,
            priority: Priority::default(),
            locked_by: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, position: LatLng) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_review_status(mut self, review_status: ReviewStatus) -> Self {
        self.review_status = Some(review_status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn locked_by(mut self, user: impl Into<UserId>) -> Self {
        self.locked_by = Some(user.into());
        self
    }

    /// Whether the task is locked by someone other than `current_user`.
    ///
    /// With no current user every lock counts as foreign.
    pub fn is_locked_by_other(&self, current_user: Option<&UserId>) -> bool {
        match &self.locked_by {
            None => false,
            Some(owner) => current_user != Some(owner),
        }
    }
}

/// Lock owners arrive as numbers or strings; anything else means "not locked"
fn deserialize_lock_owner<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => Some(UserId(n.to_string())),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(UserId(s)),
        _ => None,
    })
}
