//! Chore and assignment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settlement::MemberId;
use uuid::Uuid;

/// Recurring chore with a member rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chore {
    /// Chore ID
    pub id: Uuid,

    /// Name (1-100 chars)
    pub name: String,

    /// Cadence label ("daily", "weekly", ...)
    pub cadence: String,

    /// Members in rotation order, non-empty
    pub rotation_sequence: Vec<MemberId>,

    /// Position of the current assignee in `rotation_sequence`
    pub current_index: usize,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Inactive chores are hidden but kept for history
    pub is_active: bool,
}

impl Chore {
    /// Member the rotation currently points at
    pub fn current_assignee(&self) -> Option<&MemberId> {
        self.rotation_sequence.get(self.current_index)
    }
}

/// One instance of a chore assigned to a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreAssignment {
    /// Assignment ID
    pub id: Uuid,

    /// Parent chore
    pub chore_id: Uuid,

    /// Assignee
    pub assigned_to: MemberId,

    /// Due date
    pub due_date: DateTime<Utc>,

    /// Completion timestamp
    pub completed_at: Option<DateTime<Utc>>,

    /// Member who did the chore
    pub completed_by: Option<MemberId>,

    /// Completion disputed by another member
    pub is_disputed: bool,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl ChoreAssignment {
    /// Whether the assignment has been completed
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Rotation state handed to the sequencer
#[derive(Debug, Clone, Copy)]
pub struct RotationRequest<'a> {
    /// Members in rotation order
    pub sequence: &'a [MemberId],
    /// Current position
    pub current_index: usize,
}

/// Skip and override policies for one rotation step
#[derive(Debug, Clone, Default)]
pub struct RotationOptions {
    /// Members to pass over this time
    pub skip_members: Vec<MemberId>,
    /// Jump straight to this member
    pub override_member_id: Option<MemberId>,
}

/// Sequencer decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationResult {
    /// Next assignee
    pub member_id: MemberId,
    /// New `current_index`
    pub next_index: usize,
}
