//! Configuration types shared across crates.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Chunk intake configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Root directory for in-flight upload session directories.
    pub chunk_root: PathBuf,
    /// Retention window for abandoned sessions in seconds. Sessions older
    /// than this are reported by the stale-session scan; the sweep itself
    /// is an external scheduler's job.
    #[serde(default = "default_session_retention_secs")]
    pub session_retention_secs: u64,
    /// How long a merge tombstone is kept, in seconds. Within this window a
    /// repeat merge is reported as already-merged rather than not-found.
    #[serde(default = "default_merge_ledger_ttl_secs")]
    pub merge_ledger_ttl_secs: u64,
}

/// Integrity verification configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Media probe binary (ffprobe or compatible).
    #[serde(default = "default_probe_binary")]
    pub probe_binary: String,
    /// Probe timeout in seconds. A probe that exceeds this is treated as
    /// failed, never allowed to hang a release.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Default duration tolerance in seconds.
    #[serde(default = "default_duration_tolerance_secs")]
    pub duration_tolerance_secs: f64,
}

/// Key material source for the reference vault.
///
/// The secret is read once at startup; the vault derives its cipher and
/// legacy keys from it and never re-reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum KeyMaterialConfig {
    /// Read the secret from a file.
    File { path: PathBuf },
    /// Read the secret from an environment variable.
    Env { var: String },
    /// Inline secret. Not recommended outside tests.
    Value { secret: String },
}

/// Reference vault configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Root directory for verified media, split by category.
    pub media_root: PathBuf,
    /// Key material for reference wrapping.
    pub key: KeyMaterialConfig,
}

/// Release assembler configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Root directory for per-release working directories.
    pub work_root: PathBuf,
    /// Grace delay before a delivered working directory is deleted, in
    /// seconds. In-flight reads of the container must not race the delete.
    #[serde(default = "default_cleanup_grace_secs")]
    pub cleanup_grace_secs: u64,
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub intake: IntakeConfig,
    pub verify: VerifyConfig,
    pub vault: VaultConfig,
    pub assembler: AssemblerConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file merged with
    /// `PRESSROOM_`-prefixed environment variables (`__` as separator).
    pub fn load(config_path: Option<&Path>) -> crate::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("PRESSROOM_").split("__"))
            .extract()
            .map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Create a test configuration rooted under the given directory.
    ///
    /// **For testing only.** Uses an inline secret and short grace delays.
    pub fn for_testing(root: &Path) -> Self {
        Self {
            intake: IntakeConfig {
                chunk_root: root.join("chunks"),
                session_retention_secs: 3600,
                merge_ledger_ttl_secs: 60,
            },
            verify: VerifyConfig {
                probe_binary: default_probe_binary(),
                probe_timeout_secs: 5,
                duration_tolerance_secs: default_duration_tolerance_secs(),
            },
            vault: VaultConfig {
                media_root: root.join("media"),
                key: KeyMaterialConfig::Value {
                    secret: "test-vault-secret".to_string(),
                },
            },
            assembler: AssemblerConfig {
                work_root: root.join("work"),
                cleanup_grace_secs: 0,
            },
        }
    }
}

fn default_session_retention_secs() -> u64 {
    86400 // 24 hours
}

fn default_merge_ledger_ttl_secs() -> u64 {
    900 // 15 minutes
}

fn default_probe_binary() -> String {
    "ffprobe".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_duration_tolerance_secs() -> f64 {
    crate::DEFAULT_DURATION_TOLERANCE_SECS
}

fn default_cleanup_grace_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_testing_roots_under_dir() {
        let config = AppConfig::for_testing(Path::new("/tmp/pressroom-test"));
        assert!(config.intake.chunk_root.starts_with("/tmp/pressroom-test"));
        assert!(config.vault.media_root.starts_with("/tmp/pressroom-test"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pressroom.toml");
        std::fs::write(
            &path,
            r#"
[intake]
chunk_root = "/var/lib/pressroom/chunks"

[verify]
probe_timeout_secs = 10

[vault]
media_root = "/var/lib/pressroom/media"
key = { source = "env", var = "PRESSROOM_SECRET" }

[assembler]
work_root = "/var/lib/pressroom/work"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.verify.probe_timeout_secs, 10);
        assert_eq!(config.intake.session_retention_secs, 86400);
        assert!(matches!(config.vault.key, KeyMaterialConfig::Env { .. }));
    }
}
