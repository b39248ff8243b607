use anyhow::{Context, Result};
use appherd_managed_process::{default_associations, AssociationResolver, ReleasePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod validation;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_RULES_FILE: &str = "apps_to_manage.txt";

/// Supervisor settings, persisted as pretty-printed JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Start every managed entry when a session opens
    pub run_all_at_startup: bool,

    /// Kill every managed entry when a session closes.
    /// Also decides what happens to running trees when their handles are released.
    pub kill_all_on_close: bool,

    /// Managed-path list file, one path per line
    pub rules_path: String,

    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,

    /// How long a "not running" observation is trusted before asking the OS again
    #[serde(with = "duration_serde")]
    pub liveness_requery_interval: Duration,

    /// Extension (with leading dot) to command template
    pub associations: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_all_at_startup: false,
            kill_all_on_close: false,
            rules_path: DEFAULT_RULES_FILE.to_string(),
            poll_interval: default_poll_interval(),
            liveness_requery_interval: default_liveness_requery_interval(),
            associations: default_association_table(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, failing on read, parse or validation errors
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load settings from a JSON string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(content).context("Failed to parse JSON configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or broken.
    ///
    /// The parent directory is created if needed. A file that cannot be read
    /// or parsed is overwritten with the defaults. A file that parses but
    /// fails validation is an error.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| {
                serde_json::from_str::<Settings>(&content).map_err(anyhow::Error::from)
            });

        match parsed {
            Ok(settings) => {
                settings
                    .validate()
                    .with_context(|| format!("Invalid configuration in {}", path.display()))?;
                debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!(
                    "Could not load settings from {} ({}), writing defaults",
                    path.display(),
                    e
                );
                let settings = Settings::default();
                settings.save(path)?;
                Ok(settings)
            }
        }
    }

    /// Save settings atomically (temp file, then rename)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename settings file into {}", path.display()))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Write a fresh settings file whose path list lives next to it
    pub fn init_config<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let rules_path = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(DEFAULT_RULES_FILE),
            _ => PathBuf::from(DEFAULT_RULES_FILE),
        };

        let settings = Settings {
            rules_path: rules_path.to_string_lossy().into_owned(),
            ..Settings::default()
        };
        settings.save(path)?;

        info!("Created new config {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_settings(self)
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        if self.kill_all_on_close {
            ReleasePolicy::KillOnRelease
        } else {
            ReleasePolicy::Detach
        }
    }

    /// Command resolver built from the association table
    pub fn resolver(&self) -> AssociationResolver {
        self.associations
            .iter()
            .fold(AssociationResolver::new(), |resolver, (ext, template)| {
                resolver.associate(ext, template.clone())
            })
    }

    pub fn rules_path(&self) -> &Path {
        Path::new(&self.rules_path)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

// Default value functions
fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_liveness_requery_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_association_table() -> BTreeMap<String, String> {
    default_associations()
        .into_iter()
        .map(|(ext, template)| (ext.to_string(), template.to_string()))
        .collect()
}

// Custom serialization for Duration
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // "ms" before "s": "ms" ends with 's'
        if let Some(num_str) = s.strip_suffix("ms") {
            let millis: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num_str) = s.strip_suffix('s') {
            let secs: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if let Some(num_str) = s.strip_suffix('m') {
            let mins: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(mins * 60))
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}
