use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Provider-specific configuration for one speaker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// OpenAI-compatible chat completions endpoint (SSE streaming)
    #[serde(rename = "openai")]
    OpenAi {
        /// API key for authentication
        api_key: String,
        /// Model name (e.g., "gpt-4o-mini")
        model: String,
        /// Base URL for the API
        #[serde(default = "default_openai_base_url")]
        base_url: String,
    },
    /// Ollama native chat endpoint (NDJSON streaming)
    #[serde(rename = "ollama")]
    Ollama {
        /// Model name (e.g., "gemma3:27b")
        model: String,
        /// Base URL for the API
        #[serde(default = "default_ollama_base_url")]
        base_url: String,
    },
    /// Scripted responses for tests and offline demos
    #[serde(rename = "mock")]
    Mock {
        /// TOML file with scripted turns; built-in placeholder when absent
        #[serde(default)]
        responses_file: Option<String>,
    },
}

impl ProviderConfig {
    /// The model identifier shown in panel subtitles and status output.
    pub fn model_label(&self) -> &str {
        match self {
            ProviderConfig::OpenAi { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
            ProviderConfig::Mock { .. } => "mock",
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

/// One dialogue participant: display name, persona, and model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakerConfig {
    /// Display name used in headers and panel titles
    pub name: String,

    /// System prompt establishing the speaker's persona
    pub persona: String,

    /// Provider and model selection
    pub provider: ProviderConfig,
}

/// The two dialogue participants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakersConfig {
    pub first: SpeakerConfig,
    pub second: SpeakerConfig,
}

/// Seed prompts that bootstrap the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// The fixed question posed to the first speaker on turn one
    #[serde(default = "default_opening_question")]
    pub opening_question: String,

    /// Framing appended to the first answer when handing it to the second
    /// speaker on turn two
    #[serde(default = "default_handoff_framing")]
    pub handoff_framing: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            opening_question: default_opening_question(),
            handoff_framing: default_handoff_framing(),
        }
    }
}

fn default_opening_question() -> String {
    "In a few paragraphs, state the core of your position as you yourself would.".to_string()
}

fn default_handoff_framing() -> String {
    "Having heard your interlocutor's brief account of their position, please now present \
     your own concise overview. Then respond thoughtfully to what they said—reflect on what \
     resonates, what you would challenge, and where your perspectives diverge or converge."
        .to_string()
}

/// Stage geometry knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Rows added to the tallest persona text when sizing the setup region
    #[serde(default = "default_setup_padding")]
    pub setup_padding: u16,

    /// Fixed height of the seed-prompt region
    #[serde(default = "default_seed_height")]
    pub seed_height: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { setup_padding: default_setup_padding(), seed_height: default_seed_height() }
    }
}

fn default_setup_padding() -> u16 {
    2
}

fn default_seed_height() -> u16 {
    7
}

/// Logging section of symposium.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default log level (like `RUST_LOG` directives)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write JSON logs to a file; required to see logs while the TUI owns
    /// the terminal
    #[serde(default)]
    pub file: bool,

    /// Log directory override (default: ~/.symposium/logs)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: default_log_level(), file: false, directory: None }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Root configuration structure for symposium.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    pub speakers: SpeakersConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| crate::Error::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        use crate::Error;

        for (label, speaker) in [("first", &self.speakers.first), ("second", &self.speakers.second)] {
            if speaker.name.trim().is_empty() {
                return Err(Error::Config(format!("speaker '{}' has an empty name", label)));
            }
            if speaker.persona.trim().is_empty() {
                return Err(Error::Config(format!(
                    "speaker '{}' ({}) has an empty persona",
                    label, speaker.name
                )));
            }
            if let ProviderConfig::OpenAi { api_key, .. } = &speaker.provider
                && api_key.trim().is_empty()
            {
                return Err(Error::Config(format!(
                    "speaker '{}' ({}) uses the openai provider without an api_key",
                    label, speaker.name
                )));
            }
        }

        if self.speakers.first.name == self.speakers.second.name {
            return Err(Error::Config(format!(
                "both speakers are named '{}'; names must be distinct",
                self.speakers.first.name
            )));
        }

        Ok(())
    }

    /// Example configuration written on first run
    pub fn example() -> &'static str {
        r#"# Symposium configuration
#
# Two speakers take turns indefinitely; each sees the other's previous
# answer as its next prompt. Stop with Ctrl+C, q, or Esc.

[session]
# opening_question = "In a few paragraphs, state the core of your position as you yourself would."
# handoff_framing = "Having heard your interlocutor's brief account of their position, ..."

[speakers.first]
name = "Nietzsche"
persona = """
Assume the role of Friedrich Nietzsche, the 19th-century philosopher.
Respond in character, in first person, with his combative intellectual
rigor. Never break role.
"""

[speakers.first.provider]
provider = "ollama"
model = "gemma3:27b"
base_url = "http://localhost:11434"

[speakers.second]
name = "Heidegger"
persona = """
Assume the role of Martin Heidegger, the 20th-century philosopher of
Being and Time. Respond in character, measured and ontological, in
first person. Never break role.
"""

[speakers.second.provider]
provider = "ollama"
model = "gpt-oss:20b"
base_url = "http://localhost:11434"

[layout]
setup_padding = 2
seed_height = 7

[logging]
level = "warn"
file = false
"#
    }
}
