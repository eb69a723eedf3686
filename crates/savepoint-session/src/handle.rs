// crates/savepoint-session/src/handle.rs
// ============================================================================
// Module: Session Worker Handle
// Description: Dedicated worker thread running coordinator operations.
// Purpose: Keep save and load work off the caller's thread with completions.
// Dependencies: savepoint-core, log, thiserror
// ============================================================================

//! ## Overview
//! [`SessionHandle`] owns a worker thread that executes mutating operations
//! in arrival order. Each request hands back a [`Completion`] the caller can
//! wait on. Screenshot capture is the one synchronous pre-step: the frame is
//! grabbed on the calling thread before dispatch so it matches the moment
//! the save was requested, not the moment the worker got around to it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use savepoint_core::CheatId;
use savepoint_core::SaveStateId;
use thiserror::Error;

use crate::coordinator::SessionCoordinator;
use crate::coordinator::VersionPolicy;
use crate::errors::CheatError;
use crate::errors::SaveStateError;

// ============================================================================
// SECTION: Completion
// ============================================================================

/// Error waiting on a dispatched operation.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The worker thread terminated before replying.
    #[error("session worker terminated before completing the request")]
    WorkerGone,
}

/// Receiver for the result of a dispatched operation.
#[derive(Debug)]
pub struct Completion<T> {
    /// Reply channel from the worker.
    receiver: mpsc::Receiver<T>,
}

impl<T> Completion<T> {
    /// Blocks until the worker replies.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::WorkerGone`] when the worker exited
    /// without replying.
    pub fn wait(self) -> Result<T, CompletionError> {
        self.receiver.recv().map_err(|_| CompletionError::WorkerGone)
    }
}

/// Creates a completion and its reply sender.
fn completion<T>() -> (mpsc::Sender<T>, Completion<T>) {
    let (sender, receiver) = mpsc::channel();
    (sender, Completion {
        receiver,
    })
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Operations executed on the worker thread.
enum SessionCommand {
    /// Create a save state from a pre-captured frame.
    Save {
        /// Autosave flag for the new record.
        auto: bool,
        /// Pre-captured screenshot bytes, if any.
        image: Option<Vec<u8>>,
        /// Reply channel.
        reply: mpsc::Sender<Result<SaveStateId, SaveStateError>>,
    },
    /// Replace an existing save state.
    Overwrite {
        /// Identifier of the record being replaced.
        id: SaveStateId,
        /// Capture a screenshot for the replacement.
        screenshot: bool,
        /// Reply channel.
        reply: mpsc::Sender<Result<SaveStateId, SaveStateError>>,
    },
    /// Load a save state into the core.
    Load {
        /// Identifier of the record to load.
        id: SaveStateId,
        /// Version handling policy.
        version_policy: VersionPolicy,
        /// Reply channel.
        reply: mpsc::Sender<Result<(), SaveStateError>>,
    },
    /// Delete a save state.
    Delete {
        /// Identifier of the record to delete.
        id: SaveStateId,
        /// Reply channel.
        reply: mpsc::Sender<Result<(), SaveStateError>>,
    },
    /// Apply a cheat to the core.
    ApplyCheat {
        /// Raw cheat code.
        code: String,
        /// Cheat kind label.
        kind: String,
        /// Enable or disable the cheat.
        enabled: bool,
        /// Reply channel.
        reply: mpsc::Sender<Result<CheatId, CheatError>>,
    },
    /// Run one policy-checked autosave attempt.
    Autosave {
        /// Reply channel.
        reply: mpsc::Sender<Result<Option<SaveStateId>, SaveStateError>>,
    },
    /// Final save and worker shutdown.
    Shutdown {
        /// Run a policy-checked save before exiting.
        save: bool,
        /// Reply channel.
        reply: mpsc::Sender<Result<Option<SaveStateId>, SaveStateError>>,
    },
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Handle to the session worker thread.
///
/// # Invariants
/// - Commands execute in arrival order; the worker naturally serializes
///   queued requests.
pub struct SessionHandle {
    /// Shared coordinator executing the operations.
    coordinator: Arc<SessionCoordinator>,
    /// Command channel into the worker.
    commands: mpsc::Sender<SessionCommand>,
    /// Worker join handle, taken on shutdown.
    worker: Option<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Spawns the worker thread for a coordinator.
    #[must_use]
    pub fn spawn(coordinator: Arc<SessionCoordinator>) -> Self {
        let (commands, inbox) = mpsc::channel::<SessionCommand>();
        let executor = Arc::clone(&coordinator);
        let worker = thread::spawn(move || {
            while let Ok(command) = inbox.recv() {
                if run_command(&executor, command) {
                    break;
                }
            }
        });
        Self {
            coordinator,
            commands,
            worker: Some(worker),
        }
    }

    /// Returns the coordinator backing this handle.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    /// Dispatches a save, capturing the screenshot before handoff.
    #[must_use]
    pub fn save(&self, auto: bool, screenshot: bool) -> Completion<Result<SaveStateId, SaveStateError>> {
        let image = if screenshot { self.coordinator.capture_frame() } else { None };
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Save {
            auto,
            image,
            reply,
        });
        waiter
    }

    /// Dispatches an overwrite of an existing save state.
    #[must_use]
    pub fn overwrite(
        &self,
        id: SaveStateId,
        screenshot: bool,
    ) -> Completion<Result<SaveStateId, SaveStateError>> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Overwrite {
            id,
            screenshot,
            reply,
        });
        waiter
    }

    /// Dispatches a load into the running core.
    #[must_use]
    pub fn load(
        &self,
        id: SaveStateId,
        version_policy: VersionPolicy,
    ) -> Completion<Result<(), SaveStateError>> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Load {
            id,
            version_policy,
            reply,
        });
        waiter
    }

    /// Dispatches a delete.
    #[must_use]
    pub fn delete(&self, id: SaveStateId) -> Completion<Result<(), SaveStateError>> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Delete {
            id,
            reply,
        });
        waiter
    }

    /// Dispatches a cheat application.
    #[must_use]
    pub fn apply_cheat(
        &self,
        code: &str,
        kind: &str,
        enabled: bool,
    ) -> Completion<Result<CheatId, CheatError>> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::ApplyCheat {
            code: code.to_string(),
            kind: kind.to_string(),
            enabled,
            reply,
        });
        waiter
    }

    /// Dispatches one policy-checked autosave attempt.
    #[must_use]
    pub fn autosave(&self) -> Completion<Result<Option<SaveStateId>, SaveStateError>> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Autosave {
            reply,
        });
        waiter
    }

    /// Shuts the worker down, optionally running a final save first.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::WorkerGone`] when the worker already
    /// exited; the final save result is returned otherwise.
    pub fn shutdown(
        mut self,
        save: bool,
    ) -> Result<Result<Option<SaveStateId>, SaveStateError>, CompletionError> {
        let (reply, waiter) = completion();
        self.dispatch(SessionCommand::Shutdown {
            save,
            reply,
        });
        let outcome = waiter.wait();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::warn!("session worker thread panicked during shutdown");
        }
        outcome
    }

    /// Sends a command, logging when the worker is gone.
    fn dispatch(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("session worker is gone; request dropped");
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let (reply, _waiter) = completion();
            let _ = self.commands.send(SessionCommand::Shutdown {
                save: false,
                reply,
            });
            if worker.join().is_err() {
                log::warn!("session worker thread panicked");
            }
        }
    }
}

/// Executes one command; returns true when the worker should exit.
fn run_command(coordinator: &SessionCoordinator, command: SessionCommand) -> bool {
    match command {
        SessionCommand::Save {
            auto,
            image,
            reply,
        } => {
            let _ = reply.send(coordinator.create_with_image(auto, image));
            false
        }
        SessionCommand::Overwrite {
            id,
            screenshot,
            reply,
        } => {
            let _ = reply.send(coordinator.overwrite_save_state(&id, screenshot));
            false
        }
        SessionCommand::Load {
            id,
            version_policy,
            reply,
        } => {
            let _ = reply.send(coordinator.load_save_state(&id, version_policy));
            false
        }
        SessionCommand::Delete {
            id,
            reply,
        } => {
            let _ = reply.send(coordinator.delete_save_state(&id));
            false
        }
        SessionCommand::ApplyCheat {
            code,
            kind,
            enabled,
            reply,
        } => {
            let _ = reply.send(coordinator.apply_cheat(&code, &kind, enabled));
            false
        }
        SessionCommand::Autosave {
            reply,
        } => {
            let _ = reply.send(coordinator.autosave());
            false
        }
        SessionCommand::Shutdown {
            save,
            reply,
        } => {
            let _ = reply.send(coordinator.shutdown(save));
            true
        }
    }
}
