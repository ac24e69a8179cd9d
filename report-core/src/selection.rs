use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt::Debug, fs, path::PathBuf, sync::Arc};

/// Fixed key the last chosen city is persisted under.
pub const SELECTED_CITY_KEY: &str = "selectedCity";

/// Injected key-value capability backing the persisted selection.
///
/// Modeled as a trait rather than an ambient global so tests can substitute
/// an in-memory fake. Writes are idempotent, single-writer, single-key.
pub trait KvStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Durable store: a small TOML table in the platform config directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `state.toml` in the platform config dir.
    pub fn in_config_dir() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "weather-report", "weather-report")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(Self::at(dirs.config_dir().join("state.toml")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_table(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            // First run: nothing persisted yet.
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))
    }

    fn write_table(&self, table: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(table).context("Failed to serialize state to TOML")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_table()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut table = self.read_table()?;
        table.insert(key.to_string(), value.to_string());
        self.write_table(&table)
    }
}

/// In-memory fake for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The city currently chosen by the user; source of truth for what to fetch.
///
/// Every `set` writes through to the store; `restore` reads it once at
/// startup. Setting the same value twice still counts as a change event
/// that callers may trigger a fetch on.
#[derive(Debug)]
pub struct Selection {
    store: Arc<dyn KvStore>,
    current: Mutex<Option<String>>,
}

impl Selection {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            current: Mutex::new(None),
        }
    }

    /// Update the active selection and persist it, overwriting any prior value.
    pub fn set(&self, city: &str) -> Result<()> {
        *self.current.lock() = Some(city.to_string());
        self.store.set(SELECTED_CITY_KEY, city)
    }

    /// Read the persisted selection and make it current. `None` if nothing
    /// was ever persisted.
    pub fn restore(&self) -> Result<Option<String>> {
        let value = self.store.get(SELECTED_CITY_KEY)?;
        *self.current.lock() = value.clone();
        Ok(value)
    }

    /// Selection at this moment, as the refresh timer sees it when it fires.
    pub fn current(&self) -> Option<String> {
        self.current.lock().clone()
    }
}
