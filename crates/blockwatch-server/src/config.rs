//! Server configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Moderation settings
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Attached-media settings
    #[serde(default)]
    pub media: MediaConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(secret) = &cli.secret {
            config.auth.secret = secret.clone();
        }

        if let Some(timeout) = cli.moderation_timeout {
            config.moderation.timeout_secs = timeout;
        }

        Ok(config)
    }
}

/// Bearer-token authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret for bearer tokens
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Lifetime of issued tokens, in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

/// Moderation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Classification deadline, in seconds; elapsed deadlines reject
    #[serde(default = "default_moderation_timeout")]
    pub timeout_secs: u64,

    /// Override for the text classifier's blocked-term list
    #[serde(default)]
    pub blocked_terms: Option<Vec<String>>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_moderation_timeout(),
            blocked_terms: None,
        }
    }
}

/// Attached-media settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory blobs are written to
    #[serde(default = "default_media_dir")]
    pub dir: PathBuf,

    /// Base URL uploads are served under
    #[serde(default = "default_media_base_url")]
    pub public_base_url: String,

    /// Maximum upload size in bytes
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
            public_base_url: default_media_base_url(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

fn default_secret() -> String {
    "dev-secret-change-me".to_string()
}

fn default_token_ttl() -> u64 {
    86_400
}

fn default_moderation_timeout() -> u64 {
    10
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_base_url() -> String {
    "http://localhost:8080/media".to_string()
}

fn default_max_upload() -> usize {
    10 * 1024 * 1024
}
