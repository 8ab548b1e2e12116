use serde::Serialize;
use tracing::debug;

/// Human-visible settings and status lines registered by patches
///
/// Entries are plain strings handed on to whatever builds the settings
/// screen, e.g. `"PREFERENCE: GENERAL_SETTINGS"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsRegistry {
    preferences: Vec<String>,
    patch_status: Vec<String>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register preference entries, skipping ones already present
    pub fn add_preference<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for entry in entries {
            let entry = entry.into();
            if !self.preferences.contains(&entry) {
                debug!("Registering preference {}", entry);
                self.preferences.push(entry);
            }
        }
    }

    /// Record that a patch was applied
    pub fn update_patch_status(&mut self, patch: impl Into<String>) {
        let patch = patch.into();
        if !self.patch_status.contains(&patch) {
            self.patch_status.push(patch);
        }
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    pub fn patch_status(&self) -> &[String] {
        &self.patch_status
    }
}
