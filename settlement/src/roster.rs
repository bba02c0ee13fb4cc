//! Household member roster

use crate::{
    config::RosterConfig,
    types::*,
    validation::validate_member_fields,
    Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use storage::{keys, Collection, KeyValueStore};

/// Partial member update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    /// New display name
    pub name: Option<String>,
    /// New color
    pub color: Option<String>,
    /// New share ratio
    pub share_ratio: Option<Decimal>,
}

/// Member roster
#[derive(Debug, Clone)]
pub struct MemberRoster {
    members: Collection<Member>,
    config: RosterConfig,
}

impl MemberRoster {
    /// Create roster over a store
    pub fn new(store: Arc<dyn KeyValueStore>, config: RosterConfig) -> Self {
        Self {
            members: Collection::new(store, keys::MEMBERS),
            config,
        }
    }

    /// Add a new active member
    pub fn add_member(&self, name: &str, color: &str, share_ratio: Decimal) -> Result<Member> {
        validate_member_fields(name, color, share_ratio)?;
        let name = name.trim();

        let member = self.members.update(|members| {
            let active = members.iter().filter(|m| m.is_active).count();
            if active >= self.config.max_active_members {
                return Err(Error::MemberLimitReached(self.config.max_active_members));
            }
            ensure_unique_name(members, name, None)?;

            let member = Member {
                id: MemberId::generate(),
                name: name.to_string(),
                color: color.to_string(),
                share_ratio,
                created_at: Utc::now(),
                is_active: true,
            };
            members.push(member.clone());
            Ok(member)
        })?;

        tracing::info!(member_id = %member.id, name = %member.name, "Member added");
        Ok(member)
    }

    /// Apply a partial update to an existing member
    pub fn update_member(&self, id: &MemberId, patch: MemberPatch) -> Result<Member> {
        let member = self.members.update(|members| {
            let index = members
                .iter()
                .position(|m| &m.id == id)
                .ok_or_else(|| Error::MemberNotFound(id.clone()))?;

            let mut updated = members[index].clone();
            if let Some(name) = patch.name {
                updated.name = name.trim().to_string();
            }
            if let Some(color) = patch.color {
                updated.color = color;
            }
            if let Some(share_ratio) = patch.share_ratio {
                updated.share_ratio = share_ratio;
            }

            validate_member_fields(&updated.name, &updated.color, updated.share_ratio)?;
            if updated.is_active {
                ensure_unique_name(members, &updated.name, Some(id))?;
            }

            members[index] = updated.clone();
            Ok::<_, Error>(updated)
        })?;

        tracing::info!(member_id = %member.id, "Member updated");
        Ok(member)
    }

    /// Soft-delete a member; history keeps referencing them
    pub fn deactivate_member(&self, id: &MemberId) -> Result<Member> {
        let member = self.members.update(|members| {
            let member = members
                .iter_mut()
                .find(|m| &m.id == id)
                .ok_or_else(|| Error::MemberNotFound(id.clone()))?;
            member.is_active = false;
            Ok::<_, Error>(member.clone())
        })?;

        tracing::info!(member_id = %member.id, "Member deactivated");
        Ok(member)
    }

    /// Members in insertion order
    pub fn list(&self, include_inactive: bool) -> Result<Vec<Member>> {
        let mut members = self.members.load()?;
        if !include_inactive {
            members.retain(|m| m.is_active);
        }
        Ok(members)
    }

    /// Get member by ID
    pub fn get(&self, id: &MemberId) -> Result<Member> {
        self.members
            .load()?
            .into_iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| Error::MemberNotFound(id.clone()))
    }
}

fn ensure_unique_name(members: &[Member], name: &str, except: Option<&MemberId>) -> Result<()> {
    let taken = members.iter().any(|m| {
        m.is_active && Some(&m.id) != except && m.name.to_lowercase() == name.to_lowercase()
    });
    if taken {
        return Err(Error::DuplicateMemberName(name.to_string()));
    }
    Ok(())
}
