// crates/savepoint-core/src/runtime/memory.rs
// ============================================================================
// Module: Savepoint In-Memory Catalog
// Description: Simple in-memory save state catalog for tests and examples.
// Purpose: Provide a deterministic catalog implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`SaveStateCatalog`] for tests and local demos. It is not intended for
//! production use; the durable implementation lives in
//! `savepoint-store-sqlite`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CheatId;
use crate::core::CheatRecord;
use crate::core::GameId;
use crate::core::SaveStateId;
use crate::core::SaveStateRecord;
use crate::core::Timestamp;
use crate::interfaces::CatalogError;
use crate::interfaces::SaveStateCatalog;

// ============================================================================
// SECTION: In-Memory Catalog
// ============================================================================

/// In-memory save state catalog for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    /// Save state records keyed by identifier.
    states: Arc<Mutex<BTreeMap<SaveStateId, SaveStateRecord>>>,
    /// Cheat records keyed by `(game_id, code)`.
    cheats: Arc<Mutex<BTreeMap<(String, String), CheatRecord>>>,
}

impl InMemoryCatalog {
    /// Creates a new empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orders records newest first, identifier descending as tiebreaker.
fn newest_first(records: &mut [SaveStateRecord]) {
    records.sort_by(|a, b| {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    });
}

impl SaveStateCatalog for InMemoryCatalog {
    fn insert_save_state(&self, record: &SaveStateRecord) -> Result<(), CatalogError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Write("catalog mutex poisoned".to_string()))?;
        if guard.contains_key(&record.id) {
            return Err(CatalogError::Write(format!("duplicate save state id: {}", record.id)));
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn save_state(&self, id: &SaveStateId) -> Result<Option<SaveStateRecord>, CatalogError> {
        let guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Invalid("catalog mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    fn update_last_opened(&self, id: &SaveStateId, at: Timestamp) -> Result<(), CatalogError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Write("catalog mutex poisoned".to_string()))?;
        let Some(record) = guard.get_mut(id) else {
            return Err(CatalogError::NotFound(id.to_string()));
        };
        record.last_opened = Some(at);
        Ok(())
    }

    fn delete_save_state(&self, id: &SaveStateId) -> Result<Option<SaveStateRecord>, CatalogError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Delete("catalog mutex poisoned".to_string()))?;
        Ok(guard.remove(id))
    }

    fn list_save_states(&self, game: &GameId) -> Result<Vec<SaveStateRecord>, CatalogError> {
        let guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Invalid("catalog mutex poisoned".to_string()))?;
        let mut records: Vec<SaveStateRecord> =
            guard.values().filter(|record| record.game_id == *game).cloned().collect();
        newest_first(&mut records);
        Ok(records)
    }

    fn prune_autosaves(
        &self,
        game: &GameId,
        keep: usize,
    ) -> Result<Vec<SaveStateRecord>, CatalogError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|_| CatalogError::Delete("catalog mutex poisoned".to_string()))?;
        let mut autosaves: Vec<SaveStateRecord> = guard
            .values()
            .filter(|record| record.game_id == *game && record.is_autosave)
            .cloned()
            .collect();
        newest_first(&mut autosaves);
        let mut removed: Vec<SaveStateRecord> = autosaves.split_off(autosaves.len().min(keep));
        removed.reverse();
        for record in &removed {
            guard.remove(&record.id);
        }
        Ok(removed)
    }

    fn upsert_cheat(&self, record: &CheatRecord) -> Result<CheatId, CatalogError> {
        let mut guard = self
            .cheats
            .lock()
            .map_err(|_| CatalogError::Write("catalog mutex poisoned".to_string()))?;
        let key = (record.game_id.to_string(), record.code.clone());
        if let Some(existing) = guard.get_mut(&key) {
            existing.core_id = record.core_id.clone();
            existing.kind = record.kind.clone();
            existing.enabled = record.enabled;
            existing.state_path = record.state_path.clone();
            return Ok(existing.id.clone());
        }
        guard.insert(key, record.clone());
        Ok(record.id.clone())
    }

    fn list_cheats(&self, game: &GameId) -> Result<Vec<CheatRecord>, CatalogError> {
        let guard = self
            .cheats
            .lock()
            .map_err(|_| CatalogError::Invalid("catalog mutex poisoned".to_string()))?;
        Ok(guard.values().filter(|record| record.game_id == *game).cloned().collect())
    }
}
