//! Module registry
//!
//! Holds every registered policy module in registration order together with
//! its enabled flag. All mutations happen under a write lock and every read
//! returns an owned snapshot, so an evaluation round that took a snapshot is
//! never affected by a reconfiguration that completes while it runs.

use parking_lot::RwLock;
use regguard_core::{Error, ModuleConfig, Result};
use regguard_modules::PolicyModule;
use std::sync::Arc;
use tracing::{debug, info};

struct Entry {
    name: String,
    module: Arc<dyn PolicyModule>,
    enabled: bool,
}

/// Registry of policy modules keyed by name
#[derive(Default)]
pub struct ModuleRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module already registered under `name`
    pub fn register(&self, name: impl Into<String>, module: Arc<dyn PolicyModule>) {
        let mut entries = self.entries.write();
        upsert(&mut entries, name.into(), module);
    }

    /// Register a module. With `overwrite` unset, an existing name is an error.
    ///
    /// A replaced entry keeps its position and its enabled flag; a new entry
    /// is appended and enabled.
    pub fn register_with(
        &self,
        name: impl Into<String>,
        module: Arc<dyn PolicyModule>,
        overwrite: bool,
    ) -> Result<()> {
        let name = name.into();
        let mut entries = self.entries.write();

        if !overwrite && entries.iter().any(|e| e.name == name) {
            return Err(Error::DuplicateName(name));
        }
        upsert(&mut entries, name, module);
        Ok(())
    }

    /// Enable or disable a module. Unknown names are ignored.
    ///
    /// Returns whether the name was registered.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                if entry.enabled != enabled {
                    info!(module = %name, enabled, "module toggled");
                }
                entry.enabled = enabled;
                true
            }
            None => {
                debug!(module = %name, "ignoring toggle of unknown module");
                false
            }
        }
    }

    /// Rebuild a module from new options and swap it in, keeping its
    /// enabled flag. The old instance stays in place if construction fails.
    ///
    /// Construction runs without the lock held. If the entry was replaced
    /// in the meantime, the new occupant is rebuilt instead, so a concurrent
    /// registration is never overwritten by a copy of the module it replaced.
    pub fn reconfigure(&self, name: &str, config: &ModuleConfig) -> Result<()> {
        let mut current = self
            .get(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;

        loop {
            let rebuilt = current.reconfigured(config)?;

            let mut entries = self.entries.write();
            let entry = entries
                .iter_mut()
                .find(|e| e.name == name)
                .ok_or_else(|| Error::UnknownModule(name.to_string()))?;

            if Arc::ptr_eq(&entry.module, &current) {
                entry.module = rebuilt;
                info!(module = %name, "module reconfigured");
                return Ok(());
            }

            debug!(module = %name, "module replaced during reconfigure, rebuilding");
            current = Arc::clone(&entry.module);
        }
    }

    /// Current instance registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn PolicyModule>> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| Arc::clone(&e.module))
    }

    /// Names of enabled modules, in registration order
    pub fn enabled_names(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Enabled modules with their names, taken under a single read lock
    pub fn enabled_modules(&self) -> Vec<(String, Arc<dyn PolicyModule>)> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.enabled)
            .map(|e| (e.name.clone(), Arc::clone(&e.module)))
            .collect()
    }

    /// Every registered name, in registration order
    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.name.clone()).collect()
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().iter().any(|e| e.name == name)
    }

    /// Whether a registered module is enabled; `None` for unknown names
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.enabled)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Replace the module under `name` in place, or append a new enabled entry
fn upsert(entries: &mut Vec<Entry>, name: String, module: Arc<dyn PolicyModule>) {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(entry) => {
            debug!(module = %name, "replacing registered module");
            entry.module = module;
        }
        None => {
            info!(module = %name, "registered module");
            entries.push(Entry {
                name,
                module,
                enabled: true,
            });
        }
    }
}
