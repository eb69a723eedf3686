// crates/savepoint-session/tests/common/mod.rs
// ============================================================================
// Module: Session Test Fixtures
// Description: Mock core bridge, registries, and coordinator builders.
// Purpose: Shared wiring for session integration tests.
// ============================================================================

//! Shared fixtures for the session test suite.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;

use savepoint_artifacts::FsArtifactStore;
use savepoint_core::AutosavePolicy;
use savepoint_core::CoreDescriptor;
use savepoint_core::CoreId;
use savepoint_core::Game;
use savepoint_core::GameId;
use savepoint_core::InMemoryCatalog;
use savepoint_core::SystemId;
use savepoint_core::Timestamp;
use savepoint_core::interfaces::CoreBridge;
use savepoint_core::interfaces::CoreCapabilities;
use savepoint_core::interfaces::CoreError;
use savepoint_core::interfaces::CoreRegistry;
use savepoint_core::interfaces::FrameSource;
use savepoint_core::interfaces::GameRegistry;
use savepoint_session::SessionCoordinator;
use savepoint_session::SessionDeps;

/// Content hash used by the fixture game.
pub const GAME_HASH: &str = "cafebabe0123";
/// Core identifier used by the fixture core.
pub const CORE_ID: &str = "core.mock";

/// Scriptable core bridge for session tests.
pub struct MockBridge {
    /// Capability descriptor declared at registration.
    pub caps: CoreCapabilities,
    /// Reported project version.
    pub version: String,
    /// When set, every save call fails.
    pub fail_save: AtomicBool,
    /// When present, save calls block until the channel is dropped or fed.
    pub save_barrier: Mutex<Option<mpsc::Receiver<()>>>,
    /// Paths passed to `load_state_from_file`.
    pub loads: Mutex<Vec<PathBuf>>,
    /// Cheat calls observed by the core.
    pub cheats: Mutex<Vec<(String, String, bool)>>,
    /// When set, every cheat is declined without erroring.
    pub reject_cheats: AtomicBool,
}

impl MockBridge {
    pub fn supporting_everything(version: &str) -> Self {
        Self {
            caps: CoreCapabilities {
                save_states: true,
                cheats: true,
            },
            version: version.to_string(),
            fail_save: AtomicBool::new(false),
            save_barrier: Mutex::new(None),
            loads: Mutex::new(Vec::new()),
            cheats: Mutex::new(Vec::new()),
            reject_cheats: AtomicBool::new(false),
        }
    }

    pub fn without_capabilities() -> Self {
        let mut bridge = Self::supporting_everything("1.0");
        bridge.caps = CoreCapabilities::default();
        bridge
    }
}

impl CoreBridge for MockBridge {
    fn capabilities(&self) -> CoreCapabilities {
        self.caps
    }

    fn project_version(&self) -> &str {
        &self.version
    }

    fn save_state_to_file(&self, path: &std::path::Path) -> Result<(), CoreError> {
        let barrier = self.save_barrier.lock().ok().and_then(|mut guard| guard.take());
        if let Some(barrier) = barrier {
            let _ = barrier.recv();
        }
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(CoreError::Save("scripted failure".to_string()));
        }
        fs::write(path, b"serialized-state").map_err(|err| CoreError::Save(err.to_string()))
    }

    fn load_state_from_file(&self, path: &std::path::Path) -> Result<(), CoreError> {
        if !path.is_file() {
            return Err(CoreError::Load(format!("missing blob: {}", path.display())));
        }
        if let Ok(mut loads) = self.loads.lock() {
            loads.push(path.to_path_buf());
        }
        Ok(())
    }

    fn set_cheat(&self, code: &str, kind: &str, enabled: bool) -> Result<bool, CoreError> {
        if let Ok(mut cheats) = self.cheats.lock() {
            cheats.push((code.to_string(), kind.to_string(), enabled));
        }
        Ok(!self.reject_cheats.load(Ordering::SeqCst))
    }
}

/// Registry returning one fixed game.
pub struct OneGame(pub Game);

impl GameRegistry for OneGame {
    fn game(&self, id: &GameId) -> Option<Game> {
        (id == &self.0.id).then(|| self.0.clone())
    }
}

/// Registry returning one fixed core.
pub struct OneCore(pub CoreDescriptor);

impl CoreRegistry for OneCore {
    fn core(&self, id: &CoreId) -> Option<CoreDescriptor> {
        (id == &self.0.id).then(|| self.0.clone())
    }
}

/// Frame source yielding a fixed JPEG-ish payload.
pub struct FixedFrame;

impl FrameSource for FixedFrame {
    fn capture_frame(&self) -> Option<Vec<u8>> {
        Some(b"frame-bytes".to_vec())
    }
}

/// Returns a game whose session started two hours ago.
pub fn long_running_game() -> Game {
    Game {
        id: GameId::new(GAME_HASH),
        title: "Fixture Quest".to_string(),
        system: SystemId::new("sys.test"),
        last_played_at: Some(Timestamp::from_unix_millis(
            Timestamp::now().as_unix_millis() - 2 * 60 * 60 * 1_000,
        )),
    }
}

/// Fully wired fixture for coordinator tests.
pub struct Fixture {
    pub coordinator: Arc<SessionCoordinator>,
    pub catalog: Arc<InMemoryCatalog>,
    pub artifacts: Arc<FsArtifactStore>,
    pub bridge: Arc<MockBridge>,
    pub game_id: GameId,
    pub _dir: tempfile::TempDir,
}

/// Builds a coordinator around the given bridge and policy.
pub fn fixture_with(bridge: MockBridge, policy: AutosavePolicy) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Arc::new(InMemoryCatalog::new());
    let artifacts = Arc::new(FsArtifactStore::new(dir.path()));
    let bridge = Arc::new(bridge);
    let game = long_running_game();
    let game_id = game.id.clone();
    let core_id = CoreId::new(CORE_ID);
    let deps = SessionDeps {
        bridge: Arc::clone(&bridge) as Arc<dyn CoreBridge>,
        catalog: Arc::clone(&catalog) as Arc<dyn savepoint_core::SaveStateCatalog>,
        artifacts: Arc::clone(&artifacts) as Arc<dyn savepoint_core::interfaces::ArtifactStore>,
        games: Arc::new(OneGame(game)),
        cores: Arc::new(OneCore(CoreDescriptor {
            id: core_id.clone(),
            project_version: bridge.version.clone(),
        })),
        frames: Some(Arc::new(FixedFrame)),
    };
    let coordinator = Arc::new(
        SessionCoordinator::new(game_id.clone(), core_id, deps, policy).expect("coordinator"),
    );
    Fixture {
        coordinator,
        catalog,
        artifacts,
        bridge,
        game_id,
        _dir: dir,
    }
}

/// Builds the default fixture with a fully capable core.
pub fn fixture() -> Fixture {
    fixture_with(MockBridge::supporting_everything("1.0"), AutosavePolicy::default())
}
