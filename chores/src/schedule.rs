//! Chore workflows
//!
//! `ChoreBook` keeps chores and their assignments in two collections and
//! drives the rotation sequencer when assignments are completed.

use crate::{rotation::get_next_assignee, types::*, Error, Result};
use chrono::{DateTime, Utc};
use settlement::MemberId;
use std::sync::Arc;
use storage::{keys, Collection, KeyValueStore};
use uuid::Uuid;

/// Max chore name length
pub const MAX_CHORE_NAME_LEN: usize = 100;

/// New chore input
#[derive(Debug, Clone)]
pub struct ChoreDraft {
    /// Name
    pub name: String,
    /// Cadence label
    pub cadence: String,
    /// Members in rotation order
    pub rotation_sequence: Vec<MemberId>,
    /// Starting position, defaults to 0
    pub current_index: Option<usize>,
    /// Defaults to active
    pub is_active: Option<bool>,
}

/// Partial chore update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ChorePatch {
    /// Name
    pub name: Option<String>,
    /// Cadence label
    pub cadence: Option<String>,
    /// Members in rotation order
    pub rotation_sequence: Option<Vec<MemberId>>,
    /// Position in the rotation
    pub current_index: Option<usize>,
    /// Active flag
    pub is_active: Option<bool>,
}

/// Outcome of completing an assignment
#[derive(Debug, Clone)]
pub struct Completion {
    /// Completed assignment
    pub assignment: ChoreAssignment,
    /// Rotation decision for the parent chore
    pub next: RotationResult,
}

/// Chore book
#[derive(Debug, Clone)]
pub struct ChoreBook {
    chores: Collection<Chore>,
    assignments: Collection<ChoreAssignment>,
}

impl ChoreBook {
    /// Create chore book over a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            chores: Collection::new(Arc::clone(&store), keys::CHORES),
            assignments: Collection::new(store, keys::CHORE_ASSIGNMENTS),
        }
    }

    /// Create a chore
    pub fn create_chore(&self, draft: ChoreDraft) -> Result<Chore> {
        let chore = Chore {
            id: Uuid::new_v4(),
            name: draft.name,
            cadence: draft.cadence,
            rotation_sequence: draft.rotation_sequence,
            current_index: draft.current_index.unwrap_or(0),
            created_at: Utc::now(),
            is_active: draft.is_active.unwrap_or(true),
        };
        validate_chore(&chore)?;

        self.chores.update(|chores| {
            chores.push(chore.clone());
            Ok::<_, Error>(())
        })?;

        tracing::info!(
            chore_id = %chore.id,
            name = %chore.name,
            members = chore.rotation_sequence.len(),
            "Chore created"
        );
        Ok(chore)
    }

    /// Apply a partial update; the index must stay inside the sequence
    pub fn update_chore(&self, id: Uuid, patch: ChorePatch) -> Result<Chore> {
        let chore = self.with_chore(id, |chore| {
            let mut updated = chore.clone();
            if let Some(name) = patch.name {
                updated.name = name;
            }
            if let Some(cadence) = patch.cadence {
                updated.cadence = cadence;
            }
            if let Some(sequence) = patch.rotation_sequence {
                updated.rotation_sequence = sequence;
            }
            if let Some(index) = patch.current_index {
                updated.current_index = index;
            }
            if let Some(active) = patch.is_active {
                updated.is_active = active;
            }
            validate_chore(&updated)?;

            *chore = updated;
            Ok(chore.clone())
        })?;

        tracing::info!(chore_id = %id, "Chore updated");
        Ok(chore)
    }

    /// Soft-delete a chore
    pub fn deactivate_chore(&self, id: Uuid) -> Result<Chore> {
        let chore = self.with_chore(id, |chore| {
            chore.is_active = false;
            Ok(chore.clone())
        })?;

        tracing::info!(chore_id = %id, "Chore deactivated");
        Ok(chore)
    }

    /// Chores in insertion order
    pub fn list_chores(&self, include_inactive: bool) -> Result<Vec<Chore>> {
        let mut chores = self.chores.load()?;
        if !include_inactive {
            chores.retain(|c| c.is_active);
        }
        Ok(chores)
    }

    /// Get chore by ID
    pub fn get_chore(&self, id: Uuid) -> Result<Chore> {
        self.chores
            .load()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(Error::ChoreNotFound(id))
    }

    /// Assign a chore; the due date may not be in the past
    pub fn create_assignment(
        &self,
        chore_id: Uuid,
        assigned_to: MemberId,
        due_date: DateTime<Utc>,
    ) -> Result<ChoreAssignment> {
        let now = Utc::now();
        if due_date < now {
            return Err(Error::validation("dueDate", "must not be in the past"));
        }
        self.get_chore(chore_id)?;

        let assignment = ChoreAssignment {
            id: Uuid::new_v4(),
            chore_id,
            assigned_to,
            due_date,
            completed_at: None,
            completed_by: None,
            is_disputed: false,
            created_at: now,
        };

        self.assignments.update(|assignments| {
            assignments.push(assignment.clone());
            Ok::<_, Error>(())
        })?;

        tracing::info!(
            assignment_id = %assignment.id,
            chore_id = %chore_id,
            assigned_to = %assignment.assigned_to,
            "Chore assigned"
        );
        Ok(assignment)
    }

    /// Mark an assignment done and rotate its chore
    ///
    /// The completer defaults to the assignee. If the rotation fails the
    /// completion is rolled back and the rotation error returned.
    pub fn complete_assignment(
        &self,
        id: Uuid,
        completed_by: Option<MemberId>,
    ) -> Result<Completion> {
        let assignment = self.with_assignment(id, |assignment| {
            if assignment.is_completed() {
                return Err(Error::AssignmentCompleted(id));
            }
            assignment.completed_at = Some(Utc::now());
            assignment.completed_by =
                Some(completed_by.unwrap_or_else(|| assignment.assigned_to.clone()));
            Ok(assignment.clone())
        })?;

        let next = match self.rotate_chore(assignment.chore_id, &RotationOptions::default()) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(
                    assignment_id = %id,
                    error = %err,
                    "Rotation failed, rolling back completion"
                );
                self.with_assignment(id, |assignment| {
                    assignment.completed_at = None;
                    assignment.completed_by = None;
                    Ok(())
                })?;
                return Err(err);
            }
        };

        tracing::info!(
            assignment_id = %id,
            next_assignee = %next.member_id,
            "Chore completed"
        );
        Ok(Completion { assignment, next })
    }

    /// Advance a chore's rotation and persist the new index
    pub fn rotate_chore(
        &self,
        chore_id: Uuid,
        options: &RotationOptions,
    ) -> Result<RotationResult> {
        let result = self.with_chore(chore_id, |chore| {
            let result = get_next_assignee(
                &RotationRequest {
                    sequence: &chore.rotation_sequence,
                    current_index: chore.current_index,
                },
                options,
            )?;
            chore.current_index = result.next_index;
            Ok(result)
        })?;

        tracing::info!(
            chore_id = %chore_id,
            next_assignee = %result.member_id,
            current_index = result.next_index,
            "Chore rotated"
        );
        Ok(result)
    }

    /// Jump the rotation to `index`
    pub fn skip_to_index(&self, chore_id: Uuid, index: usize) -> Result<RotationResult> {
        let result = self.with_chore(chore_id, |chore| {
            let member_id = chore
                .rotation_sequence
                .get(index)
                .cloned()
                .ok_or(Error::InvalidIndex {
                    index,
                    len: chore.rotation_sequence.len(),
                })?;
            chore.current_index = index;
            Ok(RotationResult {
                member_id,
                next_index: index,
            })
        })?;

        tracing::info!(chore_id = %chore_id, current_index = index, "Chore rotation moved");
        Ok(result)
    }

    /// Reassign an open assignment without touching the rotation
    pub fn override_assignment(
        &self,
        id: Uuid,
        new_assignee: MemberId,
    ) -> Result<ChoreAssignment> {
        let assignment = self.with_assignment(id, |assignment| {
            if assignment.is_completed() {
                return Err(Error::AssignmentCompleted(id));
            }
            assignment.assigned_to = new_assignee;
            Ok(assignment.clone())
        })?;

        tracing::info!(
            assignment_id = %id,
            assigned_to = %assignment.assigned_to,
            "Assignment overridden"
        );
        Ok(assignment)
    }

    /// Flag a completed assignment as disputed
    pub fn dispute_assignment(&self, id: Uuid) -> Result<ChoreAssignment> {
        let assignment = self.with_assignment(id, |assignment| {
            if !assignment.is_completed() {
                return Err(Error::AssignmentOpen(id));
            }
            assignment.is_disputed = true;
            Ok(assignment.clone())
        })?;

        tracing::info!(assignment_id = %id, "Assignment disputed");
        Ok(assignment)
    }

    /// Assignments, newest first, optionally for one chore
    pub fn list_assignments(&self, chore_id: Option<Uuid>) -> Result<Vec<ChoreAssignment>> {
        let mut assignments = self.assignments.load()?;
        if let Some(chore_id) = chore_id {
            assignments.retain(|a| a.chore_id == chore_id);
        }
        // Stable sort: equal timestamps keep reverse insertion order
        assignments.reverse();
        assignments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assignments)
    }

    fn with_chore<R>(&self, id: Uuid, f: impl FnOnce(&mut Chore) -> Result<R>) -> Result<R> {
        self.chores.update(|chores| {
            let chore = chores
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(Error::ChoreNotFound(id))?;
            f(chore)
        })
    }

    fn with_assignment<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut ChoreAssignment) -> Result<R>,
    ) -> Result<R> {
        self.assignments.update(|assignments| {
            let assignment = assignments
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(Error::AssignmentNotFound(id))?;
            f(assignment)
        })
    }
}

fn validate_chore(chore: &Chore) -> Result<()> {
    let name_len = chore.name.chars().count();
    if name_len == 0 || name_len > MAX_CHORE_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("must be 1-{} characters", MAX_CHORE_NAME_LEN),
        ));
    }
    if chore.cadence.is_empty() {
        return Err(Error::validation("cadence", "must not be empty"));
    }
    if chore.rotation_sequence.is_empty() {
        return Err(Error::EmptySequence);
    }
    if chore.current_index >= chore.rotation_sequence.len() {
        return Err(Error::InvalidIndex {
            index: chore.current_index,
            len: chore.rotation_sequence.len(),
        });
    }
    Ok(())
}
