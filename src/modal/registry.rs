//! Dialog registry
//!
//! The registry owns every open dialog record in insertion order and keeps
//! the activation bookkeeping:
//! - at most one record is active, and exactly one while the registry is non-empty
//! - destroying a record takes its whole group with it
//! - after a destroy, the last active record (or the newest one) takes over
//!
//! Mutations are recorded as [`RegistryChange`]s which the controller drains
//! to drive presentation. A registry used without a controller keeps
//! accumulating them until [`DialogRegistry::take_changes`] is called, so
//! standalone owners must drain it, or call [`DialogRegistry::clear_changes`]
//! when they do not care about the log.

use super::types::{DialogId, DialogRecord, DialogView, ModalError, ModalResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// A single observable registry mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryChange {
    Inserted(DialogId),
    Activated(DialogId),
    Deactivated(DialogId),
    Removed(DialogView),
}

/// Ordered, id-keyed set of dialog records
#[derive(Debug, Default)]
pub struct DialogRegistry {
    /// Records in insertion order
    records: Vec<DialogRecord>,

    /// Map of dialog IDs to their position in `records`
    id_map: HashMap<DialogId, usize>,

    /// Most recently active record, looked up by id when reactivating
    last_active: Option<DialogId>,

    /// Changes not yet drained by the owner
    ///
    /// Grows with every mutation until [`DialogRegistry::take_changes`] is called.
    changes: Vec<RegistryChange>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, applying the activation policy
    ///
    /// A record that asks to be active takes over from the current active
    /// record, which is remembered as the last active one. The first record
    /// of an empty registry is always active.
    pub fn add(&mut self, mut record: DialogRecord) -> ModalResult<DialogId> {
        if self.id_map.contains_key(&record.id) {
            return Err(ModalError::AlreadyExists(record.id.clone()));
        }

        if record.is_active {
            if let Some(index) = self.active_index() {
                let current = &mut self.records[index];
                current.is_active = false;
                self.last_active = Some(current.id.clone());
                self.changes.push(RegistryChange::Deactivated(current.id.clone()));
            }
        } else if self.records.is_empty() {
            record.is_active = true;
        }

        let id = record.id.clone();
        let active = record.is_active;

        self.id_map.insert(id.clone(), self.records.len());
        self.records.push(record);
        self.changes.push(RegistryChange::Inserted(id.clone()));
        if active {
            self.changes.push(RegistryChange::Activated(id.clone()));
        }

        debug!(dialog_id = %id, active, "dialog added");
        Ok(id)
    }

    /// Get the active record
    pub fn active(&self) -> Option<&DialogRecord> {
        self.active_index().map(|index| &self.records[index])
    }

    pub fn active_id(&self) -> Option<&DialogId> {
        self.active().map(DialogRecord::id)
    }

    pub fn has_active(&self) -> bool {
        self.records.iter().any(|record| record.is_active)
    }

    pub fn get(&self, id: &DialogId) -> Option<&DialogRecord> {
        self.id_map.get(id).and_then(|&index| self.records.get(index))
    }

    pub(crate) fn get_mut(&mut self, id: &DialogId) -> Option<&mut DialogRecord> {
        match self.id_map.get(id) {
            Some(&index) => self.records.get_mut(index),
            None => None,
        }
    }

    pub fn contains(&self, id: &DialogId) -> bool {
        self.id_map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<DialogId> {
        self.records.iter().map(|record| record.id.clone()).collect()
    }

    /// The remembered last active id, if it still names a live record
    pub fn last_active(&self) -> Option<&DialogId> {
        self.last_active.as_ref().filter(|id| self.contains(id))
    }

    /// Every record sharing the group of `id`, itself included
    ///
    /// Empty when the record has no group or does not exist.
    pub fn group_of(&self, id: &DialogId) -> Vec<&DialogRecord> {
        let Some(group) = self.get(id).and_then(|record| record.group.as_deref()) else {
            return Vec::new();
        };

        self.records
            .iter()
            .filter(|record| record.group.as_deref() == Some(group))
            .collect()
    }

    /// Remove a record and its whole group, then reactivate
    ///
    /// Returns the removed records, `id` first. Unknown ids remove nothing.
    pub fn destroy(&mut self, id: &DialogId) -> Vec<DialogRecord> {
        if !self.contains(id) {
            return Vec::new();
        }

        let mut doomed = vec![id.clone()];
        doomed.extend(
            self.group_of(id)
                .into_iter()
                .map(|record| record.id.clone())
                .filter(|member| member != id),
        );

        let mut removed = Vec::with_capacity(doomed.len());
        for member in &doomed {
            if let Some(index) = self.id_map.remove(member) {
                let record = self.records.remove(index);
                self.update_id_map_after_removal(index);
                self.changes.push(RegistryChange::Removed(record.view()));
                removed.push(record);
            }
        }

        debug!(dialog_id = %id, removed = removed.len(), "dialog destroyed");
        self.reactivate();
        removed
    }

    /// Pick the record to show after the active one went away
    ///
    /// Does nothing while a record is still active. Otherwise prefers the
    /// last active record if it is still live, then the newest record.
    pub fn reactivate(&mut self) {
        if self.has_active() {
            return;
        }

        let target = self
            .last_active()
            .cloned()
            .or_else(|| self.records.last().map(|record| record.id.clone()));

        if let Some(id) = target {
            debug!(dialog_id = %id, "reactivating dialog");
            self.set_active(&id);
        }
    }

    /// Move activation from `from` to `to`, remembering `from` as last active
    ///
    /// Only the active record can hand activation over. When `from` is no
    /// longer active (another dialog interrupted it, or it was never active)
    /// nothing changes and `Ok(false)` is returned. A missing `to` is an error.
    pub fn switch(&mut self, from: &DialogId, to: &DialogId) -> ModalResult<bool> {
        if self.active_id() != Some(from) {
            debug!(from = %from, to = %to, "switch from inactive dialog dropped");
            return Ok(false);
        }
        if !self.contains(to) {
            return Err(ModalError::NotFound(to.clone()));
        }

        self.set_active(to);
        self.last_active = Some(from.clone());
        debug!(from = %from, to = %to, "dialog switched");
        Ok(true)
    }

    /// Drain the recorded changes
    pub fn take_changes(&mut self) -> Vec<RegistryChange> {
        std::mem::take(&mut self.changes)
    }

    /// Drop the recorded changes without looking at them
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Number of changes waiting to be drained
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            dialogs: self
                .records
                .iter()
                .map(|record| DialogSummary {
                    id: record.id.clone(),
                    active: record.is_active,
                    group: record.group.clone(),
                })
                .collect(),
            last_active: self.last_active().cloned(),
        }
    }

    fn active_index(&self) -> Option<usize> {
        self.records.iter().position(|record| record.is_active)
    }

    fn set_active(&mut self, id: &DialogId) {
        if let Some(index) = self.active_index() {
            if self.records[index].id == *id {
                return;
            }
            self.records[index].is_active = false;
            let previous = self.records[index].id.clone();
            self.changes.push(RegistryChange::Deactivated(previous));
        }

        if let Some(record) = self.get_mut(id) {
            record.is_active = true;
            self.changes.push(RegistryChange::Activated(id.clone()));
        }
    }

    /// Update ID map after removing a record at the given index
    fn update_id_map_after_removal(&mut self, removed_index: usize) {
        for index in self.id_map.values_mut() {
            if *index > removed_index {
                *index -= 1;
            }
        }
    }
}

/// Serializable view of the registry state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub dialogs: Vec<DialogSummary>,
    pub last_active: Option<DialogId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogSummary {
    pub id: DialogId,
    pub active: bool,
    pub group: Option<String>,
}
