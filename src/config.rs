use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Language-model settings for the answering service.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            base_url: None,
            api_key_env: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}

impl LlmConfig {
    pub fn model_name(&self) -> &str {
        match (&self.model, self.provider.as_str()) {
            (Some(model), _) => model.as_str(),
            (None, "openai") => "gpt-4o-mini",
            (None, _) => "gemini-2.5-flash",
        }
    }

    pub fn endpoint(&self) -> &str {
        match (&self.base_url, self.provider.as_str()) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, "openai") => "https://api.openai.com/v1",
            (None, _) => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn api_key_var(&self) -> &str {
        match (&self.api_key_env, self.provider.as_str()) {
            (Some(var), _) => var.as_str(),
            (None, "openai") => "OPENAI_API_KEY",
            (None, _) => "GEMINI_API_KEY",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: PathBuf,
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: default_tesseract_cmd(),
            language: default_ocr_language(),
        }
    }
}

fn default_tesseract_cmd() -> PathBuf {
    PathBuf::from("tesseract")
}
fn default_ocr_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_cmd")]
    pub ffmpeg_cmd: PathBuf,
    /// Sample rate of the intermediate WAV handed to speech recognition.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_cmd: default_ffmpeg_cmd(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_ffmpeg_cmd() -> PathBuf {
    PathBuf::from("ffmpeg")
}
fn default_sample_rate() -> u32 {
    16_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_provider")]
    pub provider: String,
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    #[serde(default = "default_speech_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: default_speech_provider(),
            base_url: default_speech_base_url(),
            model: default_speech_model(),
            api_key_env: default_speech_api_key_env(),
            language: None,
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

fn default_speech_provider() -> String {
    "openai".to_string()
}
fn default_speech_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_speech_model() -> String {
    "whisper-1".to_string()
}
fn default_speech_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_speech_timeout_secs() -> u64 {
    300
}

impl SpeechConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Configuration with every section at its default, pointing at `db_path`.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            llm: LlmConfig::default(),
            ocr: OcrConfig::default(),
            media: MediaConfig::default(),
            speech: SpeechConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.llm.provider.as_str() {
        "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be gemini or openai.",
            other
        ),
    }

    if config.llm.timeout_secs == 0 {
        anyhow::bail!("llm.timeout_secs must be > 0");
    }

    match config.speech.provider.as_str() {
        "openai" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown speech provider: '{}'. Must be openai or disabled.",
            other
        ),
    }

    if config.speech.timeout_secs == 0 {
        anyhow::bail!("speech.timeout_secs must be > 0");
    }

    if config.media.sample_rate == 0 {
        anyhow::bail!("media.sample_rate must be > 0");
    }

    if config.ocr.language.trim().is_empty() {
        anyhow::bail!("ocr.language must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let config = parse("[db]\npath = \"./data/kb.sqlite\"\n").unwrap();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.model_name(), "gemini-2.5-flash");
        assert_eq!(config.llm.api_key_var(), "GEMINI_API_KEY");
        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert_eq!(config.media.sample_rate, 16_000);
        assert!(config.speech.is_enabled());
        assert_eq!(config.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn openai_provider_switches_defaults() {
        let config = parse(
            "[db]\npath = \"kb.sqlite\"\n[llm]\nprovider = \"openai\"\nbase_url = \"http://localhost:8080/v1/\"\n",
        )
        .unwrap();
        assert_eq!(config.llm.model_name(), "gpt-4o-mini");
        assert_eq!(config.llm.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(config.llm.endpoint(), "http://localhost:8080/v1");
    }

    #[test]
    fn unknown_llm_provider_is_rejected() {
        let err = parse("[db]\npath = \"kb.sqlite\"\n[llm]\nprovider = \"markov\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let err = parse("[db]\npath = \"kb.sqlite\"\n[media]\nsample_rate = 0\n").unwrap_err();
        assert!(err.to_string().contains("sample_rate"));
    }

    #[test]
    fn example_config_is_valid() {
        let config = parse(include_str!("../config/docqa.example.toml")).unwrap();
        assert_eq!(config.db.path, PathBuf::from("./data/docqa.sqlite"));
        assert_eq!(config.speech.model, "whisper-1");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/docqa.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/docqa.toml"));
    }
}
