// crates/savepoint-session/src/coordinator.rs
// ============================================================================
// Module: Session Coordinator
// Description: Orchestrates saves, loads, deletes, and cheats for one session.
// Purpose: Enforce blob/record ordering and the single in-flight save rule.
// Dependencies: savepoint-core, log
// ============================================================================

//! ## Overview
//! One coordinator exists per play session and pins one game to one running
//! core. Capability support is read from the bridge once at construction;
//! a core that declared no save state support fails every save and load for
//! the whole session. Creation writes the blob before the record; deletion
//! removes the record before the blob, so a crash between the two steps can
//! only ever leave an orphan file, never a record pointing at nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use savepoint_core::AutosaveInput;
use savepoint_core::AutosavePolicy;
use savepoint_core::AutosaveVerdict;
use savepoint_core::CheatId;
use savepoint_core::CheatRecord;
use savepoint_core::CoreId;
use savepoint_core::GameId;
use savepoint_core::SaveStateId;
use savepoint_core::SaveStateRecord;
use savepoint_core::Timestamp;
use savepoint_core::interfaces::ArtifactStore;
use savepoint_core::interfaces::CoreBridge;
use savepoint_core::interfaces::CoreCapabilities;
use savepoint_core::interfaces::CoreRegistry;
use savepoint_core::interfaces::FrameSource;
use savepoint_core::interfaces::GameRegistry;
use savepoint_core::interfaces::SaveStateCatalog;
use savepoint_core::normalize_cheat_code;

use crate::errors::CheatError;
use crate::errors::SaveStateError;

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// External collaborators composed by the coordinator.
pub struct SessionDeps {
    /// Bridge to the running emulation core.
    pub bridge: Arc<dyn CoreBridge>,
    /// Metadata catalog for records.
    pub catalog: Arc<dyn SaveStateCatalog>,
    /// Durable file layout for blobs and screenshots.
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Read-only game registry.
    pub games: Arc<dyn GameRegistry>,
    /// Read-only core registry.
    pub cores: Arc<dyn CoreRegistry>,
    /// Optional rendering surface for screenshot capture.
    pub frames: Option<Arc<dyn FrameSource>>,
}

/// Version handling policy for loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Surface a version mismatch before any core call.
    Strict,
    /// Proceed across a version mismatch (caller acknowledgment).
    AcceptMismatch,
}

/// Timestamps of the most recent saves within this session.
#[derive(Debug, Clone, Copy, Default)]
struct SessionMarks {
    /// When the last autosave completed.
    last_autosave_at: Option<Timestamp>,
    /// When the last manual save completed.
    last_manual_save_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Per-session orchestrator for save state and cheat persistence.
///
/// # Invariants
/// - At most one save is in flight at a time; concurrent callers receive
///   [`SaveStateError::SaveInProgress`].
/// - Create order is blob first, record second; delete order is record
///   first, blob second.
pub struct SessionCoordinator {
    /// Game pinned to this session.
    game_id: GameId,
    /// Core pinned to this session.
    core_id: CoreId,
    /// External collaborators.
    deps: SessionDeps,
    /// Capability descriptor read once at session start.
    capabilities: CoreCapabilities,
    /// Autosave policy thresholds.
    policy: AutosavePolicy,
    /// Single in-flight save token.
    save_gate: Mutex<()>,
    /// Recent save timestamps feeding the autosave policy.
    marks: Mutex<SessionMarks>,
}

impl SessionCoordinator {
    /// Creates a coordinator for one game/core pairing.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::NoCoreFound`] when the core identifier is
    /// not registered.
    pub fn new(
        game_id: GameId,
        core_id: CoreId,
        deps: SessionDeps,
        policy: AutosavePolicy,
    ) -> Result<Self, SaveStateError> {
        if deps.cores.core(&core_id).is_none() {
            return Err(SaveStateError::NoCoreFound(core_id.as_str().to_string()));
        }
        let capabilities = deps.bridge.capabilities();
        Ok(Self {
            game_id,
            core_id,
            deps,
            capabilities,
            policy,
            save_gate: Mutex::new(()),
            marks: Mutex::new(SessionMarks::default()),
        })
    }

    /// Returns the game pinned to this session.
    #[must_use]
    pub const fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Returns the capability descriptor read at session start.
    #[must_use]
    pub const fn capabilities(&self) -> CoreCapabilities {
        self.capabilities
    }

    /// Returns the autosave policy in effect for this session.
    #[must_use]
    pub const fn policy(&self) -> &AutosavePolicy {
        &self.policy
    }

    /// Captures the current frame when a source is attached.
    ///
    /// Runs synchronously on the caller's thread; worker dispatch happens
    /// after capture so the frame matches the moment the save was requested.
    #[must_use]
    pub fn capture_frame(&self) -> Option<Vec<u8>> {
        self.deps.frames.as_ref().and_then(|frames| frames.capture_frame())
    }

    // ------------------------------------------------------------------
    // Save states
    // ------------------------------------------------------------------

    /// Creates a new save state, optionally with a screenshot sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError`] when the core, artifact store, or catalog
    /// fails. Screenshot failures are logged and never fail the save.
    pub fn create_save_state(
        &self,
        auto: bool,
        screenshot: bool,
    ) -> Result<SaveStateId, SaveStateError> {
        let image = if screenshot { self.capture_frame() } else { None };
        self.create_with_image(auto, image)
    }

    /// Creates a save state from a pre-captured frame.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError`] when the core, artifact store, or catalog
    /// fails.
    pub fn create_with_image(
        &self,
        auto: bool,
        image: Option<Vec<u8>>,
    ) -> Result<SaveStateId, SaveStateError> {
        let _gate = self.save_gate.try_lock().map_err(|_| SaveStateError::SaveInProgress)?;
        if !self.capabilities.save_states {
            return Err(SaveStateError::UnsupportedByCore);
        }
        let now = Timestamp::now();

        let image_path = image.and_then(|bytes| {
            match self.deps.artifacts.write_image(&self.game_id, &bytes) {
                Ok(path) => Some(path),
                Err(err) => {
                    log::warn!("screenshot write failed for {}: {err}", self.game_id);
                    None
                }
            }
        });

        let slot = self.deps.artifacts.stage_blob(&self.game_id)?;
        if let Err(err) = self.deps.bridge.save_state_to_file(&slot.temp_path) {
            self.deps.artifacts.abort_blob(&slot);
            self.discard_artifact(image_path.as_deref());
            return Err(err.into());
        }
        let blob_path = match self.deps.artifacts.commit_blob(&slot) {
            Ok(path) => path,
            Err(err) => {
                self.deps.artifacts.abort_blob(&slot);
                self.discard_artifact(image_path.as_deref());
                return Err(err.into());
            }
        };

        let record = SaveStateRecord {
            id: slot.save_state_id(),
            game_id: self.game_id.clone(),
            core_id: self.core_id.clone(),
            blob_path: blob_path.clone(),
            image_path: image_path.clone(),
            is_autosave: auto,
            created_at: now,
            last_opened: None,
            created_with_core_version: self.deps.bridge.project_version().to_string(),
        };
        if let Err(err) = self.deps.catalog.insert_save_state(&record) {
            // Compensate: the blob exists but the record never did.
            self.discard_artifact(Some(blob_path.as_path()));
            self.discard_artifact(image_path.as_deref());
            return Err(SaveStateError::MetadataWrite(err.to_string()));
        }

        if auto {
            self.prune_autosaves();
        }
        self.mark_saved(auto, now);
        Ok(record.id)
    }

    /// Replaces an existing save state with a fresh one.
    ///
    /// The new state is created first; the prior record is deleted only
    /// after the new insert succeeds, so a failure can never lose the save.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::NotFound`] when the prior record does not
    /// exist, or any creation error.
    pub fn overwrite_save_state(
        &self,
        id: &SaveStateId,
        screenshot: bool,
    ) -> Result<SaveStateId, SaveStateError> {
        let prior = self
            .deps
            .catalog
            .save_state(id)
            .map_err(|err| SaveStateError::MetadataWrite(err.to_string()))?
            .ok_or_else(|| SaveStateError::NotFound(id.as_str().to_string()))?;
        let new_id = self.create_save_state(prior.is_autosave, screenshot)?;
        if let Err(err) = self.delete_save_state(id) {
            log::warn!("stale save state {id} left pending cleanup: {err}");
        }
        Ok(new_id)
    }

    /// Loads a save state into the running core.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::VersionMismatch`] under
    /// [`VersionPolicy::Strict`] before any core call when the record was
    /// created by a different core version.
    pub fn load_save_state(
        &self,
        id: &SaveStateId,
        version_policy: VersionPolicy,
    ) -> Result<(), SaveStateError> {
        if !self.capabilities.save_states {
            return Err(SaveStateError::UnsupportedByCore);
        }
        let record = self
            .deps
            .catalog
            .save_state(id)
            .map_err(|err| SaveStateError::MetadataWrite(err.to_string()))?
            .ok_or_else(|| SaveStateError::NotFound(id.as_str().to_string()))?;
        let running = self.deps.bridge.project_version();
        if record.created_with_core_version != running {
            match version_policy {
                VersionPolicy::Strict => {
                    return Err(SaveStateError::VersionMismatch {
                        created_with: record.created_with_core_version,
                        running: running.to_string(),
                    });
                }
                VersionPolicy::AcceptMismatch => {
                    log::warn!(
                        "loading save state {id} created with core version {} on {running}",
                        record.created_with_core_version
                    );
                }
            }
        }
        if let Err(err) = self.deps.catalog.update_last_opened(id, Timestamp::now()) {
            log::warn!("failed to stamp last_opened on {id}: {err}");
        }
        self.deps.bridge.load_state_from_file(&record.blob_path).map_err(SaveStateError::from)
    }

    /// Deletes a save state, record first, then its files.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::NotFound`] when no record exists, or
    /// [`SaveStateError::MetadataDelete`] when the catalog delete fails.
    pub fn delete_save_state(&self, id: &SaveStateId) -> Result<(), SaveStateError> {
        let removed = self
            .deps
            .catalog
            .delete_save_state(id)
            .map_err(|err| SaveStateError::MetadataDelete(err.to_string()))?
            .ok_or_else(|| SaveStateError::NotFound(id.as_str().to_string()))?;
        // Record is gone; a failed file delete only leaves an orphan blob.
        self.discard_artifact(Some(removed.blob_path.as_path()));
        self.discard_artifact(removed.image_path.as_deref());
        Ok(())
    }

    /// Lists all save states for the session's game, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::MetadataWrite`] when the catalog query
    /// fails.
    pub fn list_save_states(&self) -> Result<Vec<SaveStateRecord>, SaveStateError> {
        self.deps
            .catalog
            .list_save_states(&self.game_id)
            .map_err(|err| SaveStateError::MetadataWrite(err.to_string()))
    }

    // ------------------------------------------------------------------
    // Autosave paths
    // ------------------------------------------------------------------

    /// Runs one policy-checked autosave attempt.
    ///
    /// Returns `Ok(None)` when the policy skipped the save.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError`] when the policy fired and the save failed.
    pub fn autosave(&self) -> Result<Option<SaveStateId>, SaveStateError> {
        match self.policy.should_autosave(&self.autosave_input(), Timestamp::now()) {
            AutosaveVerdict::Skip(reason) => {
                log::debug!("autosave skipped for {}: {reason:?}", self.game_id);
                Ok(None)
            }
            AutosaveVerdict::Fire => self.create_save_state(true, true).map(Some),
        }
    }

    /// Lifecycle hook: the front-end is moving to the background.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError`] when the policy fired and the save failed.
    pub fn on_background(&self) -> Result<Option<SaveStateId>, SaveStateError> {
        self.autosave()
    }

    /// Lifecycle hook: the session is ending.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError`] when a requested final save failed.
    pub fn shutdown(&self, save: bool) -> Result<Option<SaveStateId>, SaveStateError> {
        if save { self.autosave() } else { Ok(None) }
    }

    /// One best-effort emergency save for the fault path.
    ///
    /// Bypasses the time gates but not the capability check; never captures
    /// a screenshot and never panics.
    pub fn emergency_save(&self) {
        if !self.capabilities.save_states {
            return;
        }
        match self.create_with_image(true, None) {
            Ok(id) => log::info!("emergency save {id} written for {}", self.game_id),
            Err(SaveStateError::SaveInProgress) => {
                log::warn!("emergency save skipped: a save is already in flight");
            }
            Err(err) => log::error!("emergency save failed for {}: {err}", self.game_id),
        }
    }

    // ------------------------------------------------------------------
    // Cheats
    // ------------------------------------------------------------------

    /// Applies a cheat to the running core and persists it on acceptance.
    ///
    /// # Errors
    ///
    /// Returns [`CheatError::Rejected`] when the core declines the code;
    /// nothing is persisted in that case.
    pub fn apply_cheat(
        &self,
        code: &str,
        kind: &str,
        enabled: bool,
    ) -> Result<CheatId, CheatError> {
        if !self.capabilities.cheats {
            return Err(CheatError::UnsupportedByCore);
        }
        let normalized = normalize_cheat_code(code);
        if normalized.is_empty() {
            return Err(CheatError::Rejected(code.to_string()));
        }
        let accepted = self
            .deps
            .bridge
            .set_cheat(&normalized, kind, enabled)
            .map_err(|err| CheatError::Core(err.to_string()))?;
        if !accepted {
            return Err(CheatError::Rejected(normalized));
        }
        let record = CheatRecord {
            id: CheatId::new(format!(
                "{}.{}",
                self.game_id.as_str(),
                Timestamp::now().as_unix_millis()
            )),
            game_id: self.game_id.clone(),
            core_id: self.core_id.clone(),
            code: normalized,
            kind: kind.to_string(),
            enabled,
            state_path: None,
        };
        self.deps
            .catalog
            .upsert_cheat(&record)
            .map_err(|err| CheatError::MetadataWrite(err.to_string()))
    }

    /// Lists all cheats recorded for the session's game.
    ///
    /// # Errors
    ///
    /// Returns [`CheatError::MetadataWrite`] when the catalog query fails.
    pub fn list_cheats(&self) -> Result<Vec<CheatRecord>, CheatError> {
        self.deps
            .catalog
            .list_cheats(&self.game_id)
            .map_err(|err| CheatError::MetadataWrite(err.to_string()))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Builds the policy input from the registry and session marks.
    fn autosave_input(&self) -> AutosaveInput {
        let marks = self.marks.lock().map_or_else(|_| SessionMarks::default(), |guard| *guard);
        AutosaveInput {
            save_states_supported: self.capabilities.save_states,
            last_played_at: self
                .deps
                .games
                .game(&self.game_id)
                .and_then(|game| game.last_played_at),
            last_autosave_at: marks.last_autosave_at,
            last_manual_save_at: marks.last_manual_save_at,
        }
    }

    /// Records a completed save in the session marks.
    fn mark_saved(&self, auto: bool, at: Timestamp) {
        if let Ok(mut marks) = self.marks.lock() {
            if auto {
                marks.last_autosave_at = Some(at);
            } else {
                marks.last_manual_save_at = Some(at);
            }
        }
    }

    /// Enforces the autosave retention ceiling; failures are non-fatal.
    fn prune_autosaves(&self) {
        match self.deps.catalog.prune_autosaves(&self.game_id, self.policy.keep_autosaves) {
            Ok(removed) => {
                for record in removed {
                    self.discard_artifact(Some(record.blob_path.as_path()));
                    self.discard_artifact(record.image_path.as_deref());
                }
            }
            Err(err) => {
                log::warn!("autosave pruning failed for {}: {err}", self.game_id);
            }
        }
    }

    /// Deletes an artifact file, logging instead of failing.
    fn discard_artifact(&self, path: Option<&std::path::Path>) {
        if let Some(path) = path
            && let Err(err) = self.deps.artifacts.delete(path)
        {
            log::warn!("failed to remove artifact {}: {err}", path.display());
        }
    }
}
