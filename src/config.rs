use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::internal::polling::PollConfig;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub pending: PendingConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the article API, e.g. "https://abc.execute-api.ap-southeast-1.amazonaws.com/prod"
    pub base_url: String,
    /// Web app origin used to open a post in the browser ("{web_base_url}/posts/{id}")
    pub web_base_url: Option<String>,
    /// Sent as `Authorization: Bearer <id_token>` when set
    pub id_token: Option<String>,
    /// Sent as `X-User-Id` when set
    pub user_id: Option<String>,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            web_base_url: None,
            id_token: None,
            user_id: None,
            page_size: 10,
        }
    }
}

/// New posts polling. `interval_ms` and `max_retries` must be non-zero.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub max_retries: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            max_retries: 3,
        }
    }
}

impl PollingConfig {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.interval_ms),
            enabled: self.enabled,
            max_retries: self.max_retries,
        }
    }
}

/// Watching the user's own posts while they await moderation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PendingConfig {
    pub interval_ms: u64,
    pub max_duration_ms: u64,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 20_000,
            max_duration_ms: 120_000,
        }
    }
}

impl PendingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Rows before the end of the list at which the next page is requested
    pub scroll_margin: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { scroll_margin: 3 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_directory: Option<String>,
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            module_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive string: the base level plus per-module overrides.
    pub fn filter_directives(&self) -> String {
        let mut filter = self.level.clone();
        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{}={}", module, level));
        }
        filter
    }
}

impl AppConfig {
    pub fn load() -> Self {
        // Look for config.ron in current directory or next to executable
        let mut candidates = vec![PathBuf::from("config.ron")];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join("config.ron"));
        }

        for path in candidates {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match ron::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse config at {}: {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn save(&self) {
        self.save_to(PathBuf::from("config.ron"));
    }

    /// Write the config to `path`. An existing file is edited in place so
    /// comments and layout survive. A file without a `polling.enabled`
    /// entry is rewritten in full.
    pub fn save_to(&self, path: PathBuf) {
        let existing_content = fs::read_to_string(&path).unwrap_or_default();

        // Only the polling toggle changes at runtime.
        let edited = match existing_content.is_empty() {
            true => None,
            false => set_polling_enabled(&existing_content, self.polling.enabled),
        };
        let Some(new_content) = edited else {
            if !existing_content.is_empty() {
                tracing::info!(
                    "No polling.enabled entry in {}; rewriting the whole file",
                    path.display()
                );
            }
            self.write_pretty(&path);
            return;
        };

        if let Err(e) = fs::write(&path, new_content) {
            tracing::error!("Failed to update config at {}: {}", path.display(), e);
        } else {
            tracing::info!("Updated config at {} (preserving comments)", path.display());
        }
    }

    fn write_pretty(&self, path: &Path) {
        let pretty = ron::ser::PrettyConfig::default().depth_limit(3);

        match ron::ser::to_string_pretty(self, pretty) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    tracing::error!("Failed to write config to {}: {}", path.display(), e);
                } else {
                    tracing::info!("Saved config to {}", path.display());
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize config: {}", e);
            }
        }
    }
}

/// Rewrite the `enabled` value inside the `polling: (...)` block.
/// `None` when there is no such block or it has no `enabled` entry.
fn set_polling_enabled(content: &str, enabled: bool) -> Option<String> {
    let code = mask_comments_and_strings(content);
    let block = Regex::new(r"\bpolling\s*:\s*\(").ok()?.find(&code)?;

    let mut depth = 1usize;
    let mut block_end = None;
    for (offset, byte) in code.as_bytes()[block.end()..].iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    block_end = Some(block.end() + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let body = block.end()..block_end?;

    let entry = Regex::new(r"\benabled\s*:\s*(true|false)\b").ok()?;
    let value = entry.captures(&code[body.clone()])?.get(1)?;
    let range = body.start + value.start()..body.start + value.end();

    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..range.start]);
    updated.push_str(if enabled { "true" } else { "false" });
    updated.push_str(&content[range.end..]);
    Some(updated)
}

/// Copy of `content` with comments and string literals blanked out, byte for
/// byte, so offsets into it are valid offsets into `content`.
fn mask_comments_and_strings(content: &str) -> String {
    enum State {
        Code,
        Str,
        LineComment,
        BlockComment,
    }

    let bytes = content.as_bytes();
    let mut masked = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (byte, next) {
                (b'/', Some(b'/')) => state = State::LineComment,
                (b'/', Some(b'*')) => state = State::BlockComment,
                (b'"', _) => state = State::Str,
                _ => {}
            },
            State::Str => match byte {
                b'\\' => {
                    masked.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                b'"' => state = State::Code,
                _ => {}
            },
            State::LineComment => {
                if byte == b'\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if byte == b'*' && next == Some(b'/') {
                    masked.extend_from_slice(b"  ");
                    i += 2;
                    state = State::Code;
                    continue;
                }
            }
        }
        let keep = matches!(state, State::Code) || byte == b'\n';
        masked.push(if keep && byte.is_ascii() { byte } else { b' ' });
        i += 1;
    }
    masked.truncate(bytes.len());
    String::from_utf8(masked).unwrap_or_default()
}
