//! Bounded linear undo/redo over structural category edits.
//!
//! Entries are plain data ([`Command`]) rather than captured closures, so the
//! history can be inspected and serialized. Each command knows how to apply
//! and invert itself against a [`CategoryService`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::core::services::{CategoryService, ServiceError, ServiceResult};
use crate::domain::{CategoryPatch, CategoryRecord, NewCategory};
use crate::errors::EngineResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Rename,
    Move,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Create => "create",
            OperationKind::Rename => "rename",
            OperationKind::Move => "move",
            OperationKind::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Create {
        fields: NewCategory,
        created_id: Option<Uuid>,
    },
    Rename {
        id: Uuid,
        old_name: String,
        new_name: String,
    },
    Move {
        id: Uuid,
        old_parent: Option<Uuid>,
        new_parent: Option<Uuid>,
    },
    /// Undo re-creates the category, which necessarily gets a new id.
    Delete { record: CategoryRecord },
}

/// What the backend returned for one forward or reverse step.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Created(CategoryRecord),
    Updated(CategoryRecord),
    Deleted(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRemap {
    pub old: Uuid,
    pub new: Uuid,
}

struct Applied {
    output: CommandOutput,
    remap: Option<IdRemap>,
}

impl Command {
    pub fn create(fields: NewCategory, created: &CategoryRecord) -> Self {
        Command::Create {
            fields,
            created_id: Some(created.id),
        }
    }

    pub fn rename(id: Uuid, old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Command::Rename {
            id,
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    pub fn move_to(id: Uuid, old_parent: Option<Uuid>, new_parent: Option<Uuid>) -> Self {
        Command::Move {
            id,
            old_parent,
            new_parent,
        }
    }

    pub fn delete(record: CategoryRecord) -> Self {
        Command::Delete { record }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Command::Create { .. } => OperationKind::Create,
            Command::Rename { .. } => OperationKind::Rename,
            Command::Move { .. } => OperationKind::Move,
            Command::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Command::Create { fields, .. } => format!("Create category `{}`", fields.name),
            Command::Rename {
                old_name, new_name, ..
            } => format!("Rename `{}` to `{}`", old_name, new_name),
            Command::Move { id, new_parent, .. } => match new_parent {
                Some(parent) => format!("Move {} under {}", id, parent),
                None => format!("Move {} to the top level", id),
            },
            Command::Delete { record } => format!("Delete category `{}`", record.name),
        }
    }

    /// Runs the forward step. Re-running a create yields a fresh id, reported
    /// as a remap.
    async fn apply(&self, service: &dyn CategoryService) -> ServiceResult<Applied> {
        match self {
            Command::Create { fields, created_id } => {
                let record = service.create(fields.clone()).await?;
                let remap = created_id
                    .filter(|old| *old != record.id)
                    .map(|old| IdRemap {
                        old,
                        new: record.id,
                    });
                Ok(Applied {
                    output: CommandOutput::Created(record),
                    remap,
                })
            }
            Command::Rename { id, new_name, .. } => {
                let record = service.update(*id, CategoryPatch::rename(new_name)).await?;
                Ok(Applied::updated(record))
            }
            Command::Move { id, new_parent, .. } => {
                let record = service
                    .update(*id, CategoryPatch::reparent(*new_parent))
                    .await?;
                Ok(Applied::updated(record))
            }
            Command::Delete { record } => {
                service.delete(record.id).await?;
                Ok(Applied::deleted(record.id))
            }
        }
    }

    async fn invert(&self, service: &dyn CategoryService) -> ServiceResult<Applied> {
        match self {
            Command::Create { created_id, .. } => {
                let id = created_id.ok_or_else(|| {
                    ServiceError::NotFound("created category id was never recorded".into())
                })?;
                service.delete(id).await?;
                Ok(Applied::deleted(id))
            }
            Command::Rename { id, old_name, .. } => {
                let record = service.update(*id, CategoryPatch::rename(old_name)).await?;
                Ok(Applied::updated(record))
            }
            Command::Move { id, old_parent, .. } => {
                let record = service
                    .update(*id, CategoryPatch::reparent(*old_parent))
                    .await?;
                Ok(Applied::updated(record))
            }
            Command::Delete { record } => {
                let recreated = service.create(NewCategory::from(record)).await?;
                let remap = IdRemap {
                    old: record.id,
                    new: recreated.id,
                };
                Ok(Applied {
                    output: CommandOutput::Created(recreated),
                    remap: Some(remap),
                })
            }
        }
    }

    /// Rewrites every reference to `remap.old`.
    fn remap(&mut self, remap: IdRemap) {
        let swap = |id: &mut Uuid| {
            if *id == remap.old {
                *id = remap.new;
            }
        };
        let swap_parent = |parent: &mut Option<Uuid>| {
            if *parent == Some(remap.old) {
                *parent = Some(remap.new);
            }
        };
        match self {
            Command::Create { fields, created_id } => {
                swap_parent(created_id);
                swap_parent(&mut fields.parent);
            }
            Command::Rename { id, .. } => swap(id),
            Command::Move {
                id,
                old_parent,
                new_parent,
            } => {
                swap(id);
                swap_parent(old_parent);
                swap_parent(new_parent);
            }
            Command::Delete { record } => {
                swap(&mut record.id);
                swap_parent(&mut record.parent);
            }
        }
    }
}

impl Applied {
    fn updated(record: CategoryRecord) -> Self {
        Self {
            output: CommandOutput::Updated(record),
            remap: None,
        }
    }

    fn deleted(id: Uuid) -> Self {
        Self {
            output: CommandOutput::Deleted(id),
            remap: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub kind: OperationKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub command: Command,
}

impl HistoryEntry {
    pub fn new(command: Command) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: command.kind(),
            description: command.describe(),
            timestamp: Utc::now(),
            command,
        }
    }
}

/// Result of a successful undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryOutcome {
    pub entry: HistoryEntry,
    pub output: CommandOutput,
    pub remapped: Option<IdRemap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_length: usize,
    /// Index of the last applied entry; `None` when everything is undone.
    pub current_index: Option<usize>,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    in_flight: bool,
    generation: u64,
}

impl HistoryState {
    fn remap(&mut self, remap: IdRemap) {
        for entry in self.entries.iter_mut() {
            entry.command.remap(remap);
        }
    }
}

#[derive(Clone, Copy)]
enum Step {
    Undo,
    Redo,
}

/// Shared, process-local history. Methods take `&self` so a history can be
/// observed while one of its own operations is running.
#[derive(Debug)]
pub struct OperationHistory {
    state: Mutex<HistoryState>,
    max_size: usize,
}

impl OperationHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            max_size: max_size.max(1),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Records an already-executed edit. Discards the redo branch and evicts
    /// the oldest entry past the bound. Ignored (returns `false`) while an
    /// undo or redo is running.
    pub fn push(&self, entry: HistoryEntry) -> bool {
        let mut state = self.lock();
        if state.in_flight {
            debug!(description = %entry.description, "push ignored during undo/redo");
            return false;
        }
        let keep = state.cursor.map_or(0, |cursor| cursor + 1);
        state.entries.truncate(keep);
        state.entries.push_back(entry);
        if state.entries.len() > self.max_size {
            state.entries.pop_front();
        }
        state.cursor = Some(state.entries.len() - 1);
        true
    }

    pub fn push_command(&self, command: Command) -> bool {
        self.push(HistoryEntry::new(command))
    }

    /// Runs the reverse step of the entry at the cursor. The cursor moves only
    /// if it succeeds.
    pub async fn undo(&self, service: &dyn CategoryService) -> EngineResult<Option<HistoryOutcome>> {
        self.step(Step::Undo, service).await
    }

    pub async fn redo(&self, service: &dyn CategoryService) -> EngineResult<Option<HistoryOutcome>> {
        self.step(Step::Redo, service).await
    }

    async fn step(
        &self,
        step: Step,
        service: &dyn CategoryService,
    ) -> EngineResult<Option<HistoryOutcome>> {
        let (position, command, generation) = {
            let mut state = self.lock();
            if state.in_flight {
                debug!("undo/redo already running");
                return Ok(None);
            }
            let position = match step {
                Step::Undo => state.cursor,
                Step::Redo => {
                    let next = state.cursor.map_or(0, |cursor| cursor + 1);
                    (next < state.entries.len()).then_some(next)
                }
            };
            let Some(position) = position else {
                return Ok(None);
            };
            let command = state.entries[position].command.clone();
            state.in_flight = true;
            (position, command, state.generation)
        };

        let guard = InFlight { history: self };
        let applied = match step {
            Step::Undo => command.invert(service).await,
            Step::Redo => command.apply(service).await,
        };
        drop(guard);
        let applied = applied?;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("history cleared while an undo/redo was running");
            return Ok(None);
        }
        if let Some(remap) = applied.remap {
            state.remap(remap);
        }
        if let (Step::Redo, Command::Create { created_id, .. }) =
            (step, &mut state.entries[position].command)
        {
            if let CommandOutput::Created(record) = &applied.output {
                *created_id = Some(record.id);
            }
        }
        state.cursor = match step {
            Step::Undo => position.checked_sub(1),
            Step::Redo => Some(position),
        };
        debug!(cursor = ?state.cursor, length = state.entries.len(), "history cursor moved");
        Ok(Some(HistoryOutcome {
            entry: state.entries[position].clone(),
            output: applied.output,
            remapped: applied.remap,
        }))
    }

    /// Drops every entry. Called on logout or full data reset.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.cursor = None;
        state.generation += 1;
    }

    pub fn status(&self) -> HistoryStatus {
        let state = self.lock();
        let next = state.cursor.map_or(0, |cursor| cursor + 1);
        HistoryStatus {
            can_undo: state.cursor.is_some(),
            can_redo: next < state.entries.len(),
            history_length: state.entries.len(),
            current_index: state.cursor,
        }
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag even if the step future is dropped early.
struct InFlight<'a> {
    history: &'a OperationHistory,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.history.lock().in_flight = false;
    }
}
