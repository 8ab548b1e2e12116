use serde::{Deserialize, Serialize};

/// Integrations class the general patches call into
pub const DEFAULT_GENERAL_CLASS: &str =
    "Lapp/revanced/integrations/youtube/patches/general/GeneralPatch;";
/// Integrations class receiving video information callbacks
pub const DEFAULT_VIDEO_CLASS: &str =
    "Lapp/revanced/integrations/music/video/VideoInformation;";

/// Configuration shared by every patch in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Class descriptor of the general integrations hooks
    pub general_class: String,
    /// Class descriptor of the video information hooks
    pub video_class: String,
    /// Fail a patch when a resource it needs is missing instead of
    /// injecting `-1`
    pub strict_resources: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            general_class: DEFAULT_GENERAL_CLASS.to_string(),
            video_class: DEFAULT_VIDEO_CLASS.to_string(),
            strict_resources: true,
        }
    }
}

impl PatchConfig {
    /// Create a new configuration builder
    pub fn builder() -> PatchConfigBuilder {
        PatchConfigBuilder::default()
    }
}

/// Builder for PatchConfig
#[derive(Debug, Clone, Default)]
pub struct PatchConfigBuilder {
    general_class: Option<String>,
    video_class: Option<String>,
    strict_resources: Option<bool>,
}

impl PatchConfigBuilder {
    pub fn general_class(mut self, descriptor: impl Into<String>) -> Self {
        self.general_class = Some(descriptor.into());
        self
    }

    pub fn video_class(mut self, descriptor: impl Into<String>) -> Self {
        self.video_class = Some(descriptor.into());
        self
    }

    /// Enable or disable failing on missing resources
    pub fn strict_resources(mut self, strict: bool) -> Self {
        self.strict_resources = Some(strict);
        self
    }

    /// Build the configuration
    pub fn build(self) -> PatchConfig {
        let default = PatchConfig::default();
        PatchConfig {
            general_class: self.general_class.unwrap_or(default.general_class),
            video_class: self.video_class.unwrap_or(default.video_class),
            strict_resources: self.strict_resources.unwrap_or(default.strict_resources),
        }
    }
}
