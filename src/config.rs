use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub engines: EnginesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub fragments_path: String,
    pub exports_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Upload ceiling per fragment, in bytes.
    pub max_fragment_bytes: usize,

    /// Recording ceiling per plan, in minutes.
    pub free_max_duration_minutes: u32,
    pub premium_max_duration_minutes: u32,

    /// How long end-of-recording waits for in-flight uploads to land.
    pub upload_barrier_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnginesConfig {
    pub transcription: TranscriptionEngineConfig,
    pub summarization: SummarizationEngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionEngineConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizationEngineConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Config {
    /// Load configuration: built-in defaults, overridden by an optional
    /// config file, overridden by `MEETING_MINUTES__*` environment
    /// variables (API keys are expected to arrive this way).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "meeting-minutes")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080_i64)?
            .set_default("storage.fragments_path", "data/fragments")?
            .set_default("storage.exports_path", "data/exports")?
            .set_default("limits.max_fragment_bytes", 26_214_400_i64)? // 25 MiB
            .set_default("limits.free_max_duration_minutes", 30_i64)?
            .set_default("limits.premium_max_duration_minutes", 120_i64)?
            .set_default("limits.upload_barrier_secs", 30_i64)?
            .set_default("engines.transcription.base_url", "https://api.openai.com/v1")?
            .set_default("engines.transcription.api_key", "")?
            .set_default("engines.transcription.model", "whisper-1")?
            .set_default("engines.summarization.base_url", "https://api.openai.com/v1")?
            .set_default("engines.summarization.api_key", "")?
            .set_default("engines.summarization.model", "gpt-3.5-turbo")?
            .set_default("engines.summarization.max_tokens", 1000_i64)?
            .set_default("engines.summarization.temperature", 0.3_f64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MEETING_MINUTES").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
