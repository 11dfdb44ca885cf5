//! Configuration loading and validation for Amparo.
//!
//! Loads configuration from `amparo.toml` (or the path in `AMPARO_CONFIG`)
//! with environment variable overrides for secrets and data paths.
//! Validates all settings at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `amparo.toml`. Every field has a default so an empty
/// file (or no file at all) yields a runnable configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Primary completion backend (Groq)
    #[serde(default)]
    pub groq: GroqConfig,

    /// Fallback completion backend (Ollama Cloud)
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Knowledge corpus settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Admin endpoint settings
    #[serde(default)]
    pub admin: AdminConfig,

    /// Specialization domains; the shipped set covers the six practice
    /// areas of the reference deployment
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("groq", &self.groq)
            .field("ollama", &self.ollama)
            .field("knowledge", &self.knowledge)
            .field("session", &self.session)
            .field("admin", &self.admin)
            .field("domains", &self.domains)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["https://defensamendoza.gob.ar".into()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// API key; absent means the fallback backend is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_groq_model")]
    pub model: String,

    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_groq_base_url() -> String {
    "https://api.groq.com".into()
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_groq_model(),
            base_url: default_groq_base_url(),
        }
    }
}

impl std::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Bearer token for Ollama Cloud; local servers ignore it
    #[serde(default = "default_ollama_api_key")]
    pub api_key: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_ollama_host")]
    pub host: String,
}

fn default_ollama_api_key() -> String {
    "local".into()
}
fn default_ollama_model() -> String {
    "gpt-oss:120b".into()
}
fn default_ollama_host() -> String {
    "https://ollama.com".into()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_key: default_ollama_api_key(),
            model: default_ollama_model(),
            host: default_ollama_host(),
        }
    }
}

impl std::fmt::Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("host", &self.host)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path of the JSON corpus file
    #[serde(default = "default_knowledge_file")]
    pub file: String,

    /// Passages requested from the index per query
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,
}

fn default_knowledge_file() -> String {
    "data/knowledge.json".into()
}
fn default_search_top_k() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            file: default_knowledge_file(),
            search_top_k: default_search_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// SQLite database path for the durable store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Session time-to-live, refreshed on every append
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

fn default_db_path() -> String {
    "data/sessions.db".into()
}
fn default_session_ttl() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ttl_secs: default_session_ttl(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Key for the corpus reload endpoint; unset disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// One specialization domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Stable id, also the routing key (e.g. "familia")
    pub id: String,

    /// Display name for listings; falls back to the id
    #[serde(default)]
    pub title: String,

    /// Corpus tag the domain's documents carry; falls back to the id
    #[serde(default)]
    pub tag: String,

    /// Domain-specific instructions folded into the system prompt
    #[serde(default)]
    pub guidance: String,
}

impl DomainConfig {
    pub fn title(&self) -> &str {
        if self.title.is_empty() { &self.id } else { &self.title }
    }

    pub fn tag(&self) -> &str {
        if self.tag.is_empty() { &self.id } else { &self.tag }
    }
}

fn domain(id: &str, title: &str, tag: &str, guidance: &str) -> DomainConfig {
    DomainConfig {
        id: id.into(),
        title: title.into(),
        tag: tag.into(),
        guidance: guidance.into(),
    }
}

fn default_domains() -> Vec<DomainConfig> {
    vec![
        domain(
            "general",
            "Consultas Generales",
            "general",
            "Orientá sobre ubicaciones, horarios, contactos y qué fuero corresponde \
             a cada problema. Si la consulta es específica de un fuero, sugerí \
             consultarlo. Todos los servicios son GRATUITOS.",
        ),
        domain(
            "civil",
            "Fuero Civil",
            "civil",
            "Especialidad: desalojos y alquileres, reclamos civiles y comerciales, \
             cobros, cuestiones laborales, daños y perjuicios, sucesiones. Explicá \
             los requisitos documentales y enfatizá actuar rápido ante \
             notificaciones judiciales.",
        ),
        domain(
            "familia",
            "Fuero de Familia",
            "familia",
            "Especialidad: divorcios, cuota alimentaria, régimen de comunicación, \
             cuidado personal, violencia familiar y medidas de protección. En casos \
             de violencia priorizá la URGENCIA (Línea 144, guardia 24/7) y aclará \
             que no hace falta denuncia policial previa. Mencioná siempre el \
             interés superior del niño.",
        ),
        domain(
            "penal",
            "Fuero Penal",
            "penal",
            "Especialidad: defensa de personas imputadas, derechos del imputado, \
             prisión preventiva, medidas alternativas. La Defensa actúa para el \
             imputado, no para víctimas; si consulta una víctima derivá a la \
             Fiscalía o a la Asesoría de Víctimas.",
        ),
        domain(
            "penal_juvenil",
            "Fuero Penal Juvenil",
            "penal-juvenil",
            "Especialidad: defensa de adolescentes en conflicto con la ley penal. \
             El sistema prioriza la reinserción social; usá lenguaje adaptado para \
             adolescentes y sus familias.",
        ),
        domain(
            "nna_pcr",
            "Asesoría de NNA y PCR",
            "NNA",
            "Especialidad: protección de derechos de niños, niñas y adolescentes, \
             curatela y tutela, capacidad restringida. Priorizá el interés superior \
             del niño y el respeto a la autonomía progresiva de la persona.",
        ),
    ]
}

impl AppConfig {
    /// Load configuration from `AMPARO_CONFIG` or `./amparo.toml`.
    ///
    /// Environment variables override file values for secrets and paths:
    /// - `GROQ_API_KEY`
    /// - `OLLAMA_API_KEY`
    /// - `AMPARO_ADMIN_KEY`
    /// - `AMPARO_KNOWLEDGE_FILE`
    /// - `AMPARO_DB_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AMPARO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("amparo.toml"));
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path, with env overrides.
    ///
    /// Same pipeline as [`AppConfig::load`], but the path comes from the
    /// caller (the CLI `--config` flag) instead of `AMPARO_CONFIG`.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                self.groq.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("OLLAMA_API_KEY") {
            if !key.is_empty() {
                self.ollama.api_key = key;
            }
        }
        if let Ok(key) = std::env::var("AMPARO_ADMIN_KEY") {
            if !key.is_empty() {
                self.admin.api_key = Some(key);
            }
        }
        if let Ok(file) = std::env::var("AMPARO_KNOWLEDGE_FILE") {
            if !file.is_empty() {
                self.knowledge.file = file;
            }
        }
        if let Ok(path) = std::env::var("AMPARO_DB_PATH") {
            if !path.is_empty() {
                self.session.db_path = path;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".into(),
            ));
        }

        if self.knowledge.search_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.search_top_k must be at least 1".into(),
            ));
        }

        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session.ttl_secs must be at least 1".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for domain in &self.domains {
            if domain.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "domain id must not be empty".into(),
                ));
            }
            if !seen.insert(domain.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate domain id: {}",
                    domain.id
                )));
            }
        }

        Ok(())
    }

    /// Whether the primary backend has a credential.
    pub fn has_groq_key(&self) -> bool {
        self.groq
            .api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
            knowledge: KnowledgeConfig::default(),
            session: SessionConfig::default(),
            admin: AdminConfig::default(),
            domains: default_domains(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
