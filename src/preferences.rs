//! Persisted chat preferences.
//!
//! The selections a user makes in the chat view (provider, model, search
//! provider, plan mode, role, ...) survive restarts. [`PersistedPreferences`]
//! loads them from a [`PreferenceStore`] once and writes them back whenever
//! they change.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::client::{ChatRequest, LlmConfig};
use crate::error::ChatError;

/// Knowledge base searched when knowledge retrieval is switched on
pub const PROMPTS_KNOWLEDGE_BASE: &str = "prompts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_provider")]
    pub llm_provider: String,
    #[serde(default = "default_model")]
    pub llm_model: String,
    #[serde(default = "default_search_provider")]
    pub search_provider: String,
    #[serde(default)]
    pub use_knowledge: bool,
    #[serde(default)]
    pub deep_reasoning: bool,
    #[serde(default)]
    pub plan_mode_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
}

fn default_provider() -> String {
    "dashscope".to_string()
}

fn default_model() -> String {
    "qwen3-vl-plus".to_string()
}

fn default_search_provider() -> String {
    "tavily".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            llm_provider: default_provider(),
            llm_model: default_model(),
            search_provider: default_search_provider(),
            use_knowledge: false,
            deep_reasoning: false,
            plan_mode_enabled: false,
            role_id: None,
        }
    }
}

impl Preferences {
    /// Fill the options `request` leaves unset from these preferences.
    ///
    /// Knowledge retrieval only applies when no role is selected; roles carry
    /// their own prompts.
    pub fn apply_to(&self, mut request: ChatRequest) -> ChatRequest {
        if request.llm_config.is_none() {
            request.llm_config = Some(LlmConfig::new(&self.llm_provider, &self.llm_model));
        }
        if request.role_id.is_none() {
            request.role_id = self.role_id.clone();
        }
        if request.plan_mode.is_none() {
            request.plan_mode = Some(self.plan_mode_enabled);
        }
        if request.search_provider.is_none() {
            request.search_provider = Some(self.search_provider.clone());
        }
        if request.deep_reasoning.is_none() {
            request.deep_reasoning = Some(self.deep_reasoning);
        }
        if request.use_knowledge_base.is_none() && self.use_knowledge && request.role_id.is_none() {
            request.use_knowledge_base = Some(PROMPTS_KNOWLEDGE_BASE.to_string());
        }
        request
    }
}

/// Key-value boundary the preferences are persisted through
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences, `None` if nothing was saved yet
    fn load(&self) -> Result<Option<Preferences>, ChatError>;

    fn save(&self, preferences: &Preferences) -> Result<(), ChatError>;
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform configuration directory
    pub fn at_default_location() -> Self {
        Self::new(default_preferences_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, ChatError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ChatError::Preferences(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, preferences: &Preferences) -> Result<(), ChatError> {
        let json = serde_json::to_vec_pretty(preferences)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// `preferences.json` in the platform config directory, or the working
/// directory when none can be determined
pub fn default_preferences_path() -> PathBuf {
    let Some(dirs) = ProjectDirs::from("ai", "agentmind", "agentmind") else {
        return Path::new("agentmind-preferences.json").to_path_buf();
    };
    dirs.config_dir().join("preferences.json")
}

/// In-memory store, for tests and embedders without a filesystem
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    saved: Mutex<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved preferences
    pub fn snapshot(&self) -> Option<Preferences> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, ChatError> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| ChatError::Preferences("memory store poisoned".to_string()))?;
        Ok(saved.clone())
    }

    fn save(&self, preferences: &Preferences) -> Result<(), ChatError> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| ChatError::Preferences("memory store poisoned".to_string()))?;
        *saved = Some(preferences.clone());
        Ok(())
    }
}

/// Preferences loaded once from a store and written back on change
#[derive(Debug)]
pub struct PersistedPreferences<S> {
    store: S,
    current: Preferences,
}

impl<S: PreferenceStore> PersistedPreferences<S> {
    /// Load from `store`, falling back to defaults when nothing usable is stored
    pub fn load(store: S) -> Self {
        let current = match store.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => Preferences::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load preferences, using defaults");
                Preferences::default()
            }
        };
        Self { store, current }
    }

    pub fn get(&self) -> &Preferences {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Change preferences and persist them if anything changed
    pub fn update(&mut self, change: impl FnOnce(&mut Preferences)) -> Result<(), ChatError> {
        let mut next = self.current.clone();
        change(&mut next);
        if next == self.current {
            return Ok(());
        }
        self.store.save(&next)?;
        self.current = next;
        Ok(())
    }

    pub fn set_plan_mode(&mut self, enabled: bool) -> Result<(), ChatError> {
        self.update(|prefs| prefs.plan_mode_enabled = enabled)
    }

    pub fn toggle_plan_mode(&mut self) -> Result<(), ChatError> {
        self.update(|prefs| prefs.plan_mode_enabled = !prefs.plan_mode_enabled)
    }

    /// Select a provider together with one of its models
    pub fn set_provider(&mut self, provider: impl Into<String>, model: impl Into<String>) -> Result<(), ChatError> {
        let provider = provider.into();
        let model = model.into();
        self.update(|prefs| {
            prefs.llm_provider = provider;
            prefs.llm_model = model;
        })
    }

    pub fn set_role(&mut self, role_id: Option<String>) -> Result<(), ChatError> {
        self.update(|prefs| prefs.role_id = role_id)
    }
}
