//! Settings loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml` + `config.<env>.toml`,
//! the flat variables understood by earlier deployments (`OLLAMA_BASE_URL`,
//! `CHUNK_SIZE`, ...) and finally `APP_*` env vars (`APP_SERVER__PORT=9000`).
//! The result is an immutable [`Settings`] value handed to each component.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub vector: VectorSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Swap the HTTP embedder for the deterministic hashed one.
    #[serde(deserialize_with = "flag")]
    pub use_fake: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Falls back to `embedding.base_url` when unset.
    pub base_url: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSettings {
    pub url: String,
    pub collection: String,
    pub recreate_on_mismatch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    pub docs_dir: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings { host: "0.0.0.0".to_string(), port: 8000 },
            embedding: EmbeddingSettings {
                base_url: "http://localhost:11434".to_string(),
                model: "nomic-embed-text".to_string(),
                timeout_secs: 120,
                use_fake: false,
            },
            generation: GenerationSettings {
                base_url: None,
                model: "llama3:8b-instruct-q4_K_M".to_string(),
            },
            vector: VectorSettings {
                url: "http://localhost:6333".to_string(),
                collection: "docs".to_string(),
                recreate_on_mismatch: false,
            },
            ingest: IngestSettings {
                docs_dir: "/app/docs".to_string(),
                chunk_size: 800,
                chunk_overlap: 200,
                embed_concurrency: 1,
            },
        }
    }
}

/// Boolean switch that also accepts `1`/`0` and `yes`/`no`, so shell-style
/// `APP_EMBEDDING__USE_FAKE=1` works.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Int(0) => Ok(false),
        Raw::Int(1) => Ok(true),
        Raw::Int(n) => Err(serde::de::Error::custom(format!("expected 0 or 1, found {n}"))),
        Raw::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected a boolean, found '{other}'"))),
        },
    }
}

/// Flat variable names accepted for compatibility with existing deployments.
fn legacy_key(key: &str) -> Option<&'static str> {
    match key.to_ascii_uppercase().as_str() {
        "OLLAMA_BASE_URL" => Some("embedding.base_url"),
        "EMBEDDING_MODEL" => Some("embedding.model"),
        "GENERATION_MODEL" => Some("generation.model"),
        "QDRANT_URL" => Some("vector.url"),
        "COLLECTION_NAME" => Some("vector.collection"),
        "DOCS_DIR" => Some("ingest.docs_dir"),
        "CHUNK_SIZE" => Some("ingest.chunk_size"),
        "CHUNK_OVERLAP" => Some("ingest.chunk_overlap"),
        _ => None,
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().filter_map(|key| legacy_key(key.as_str()).map(Into::into)))
            .merge(Env::prefixed("APP_").split("__"));

        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size <= self.ingest.chunk_overlap {
            return Err(Error::InvalidConfig(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                self.ingest.chunk_size, self.ingest.chunk_overlap
            )));
        }
        if self.ingest.embed_concurrency == 0 {
            return Err(Error::InvalidConfig("embed_concurrency must be at least 1".to_string()));
        }
        if self.vector.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn docs_root(&self) -> PathBuf {
        expand_path(&self.ingest.docs_dir)
    }

    pub fn generation_base_url(&self) -> &str {
        self.generation.base_url.as_deref().unwrap_or(&self.embedding.base_url)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment_with(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml))
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_figment(&figment_with("")).expect("defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.generation_base_url(), "http://localhost:11434");
    }

    #[test]
    fn toml_overrides_nested_values() {
        let settings = Settings::from_figment(&figment_with(
            "[ingest]\nchunk_size = 64\nchunk_overlap = 8\n[generation]\nbase_url = \"http://gen:11434\"\n",
        ))
        .expect("settings");
        assert_eq!(settings.ingest.chunk_size, 64);
        assert_eq!(settings.ingest.chunk_overlap, 8);
        assert_eq!(settings.generation_base_url(), "http://gen:11434");
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let err = Settings::from_figment(&figment_with("[ingest]\nchunk_size = 100\nchunk_overlap = 100\n"))
            .expect_err("must reject");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Settings::from_figment(&figment_with("[ingest]\nembed_concurrency = 0\n"))
            .expect_err("must reject");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn legacy_names_map_to_sections() {
        assert_eq!(legacy_key("CHUNK_SIZE"), Some("ingest.chunk_size"));
        assert_eq!(legacy_key("qdrant_url"), Some("vector.url"));
        assert_eq!(legacy_key("PATH"), None);
    }

    #[test]
    fn use_fake_accepts_numeric_and_textual_switches() {
        for (raw, expected) in [("1", true), ("0", false), ("true", true), ("\"yes\"", true), ("false", false)] {
            let settings = Settings::from_figment(&figment_with(&format!("[embedding]\nuse_fake = {raw}\n")))
                .unwrap_or_else(|e| panic!("use_fake = {raw}: {e}"));
            assert_eq!(settings.embedding.use_fake, expected, "use_fake = {raw}");
        }
        let err = Settings::from_figment(&figment_with("[embedding]\nuse_fake = 7\n")).expect_err("must reject");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_reads_app_switches_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_EMBEDDING__USE_FAKE", "1");
            jail.set_env("APP_SERVER__PORT", "9000");
            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert!(settings.embedding.use_fake);
            assert_eq!(settings.server.port, 9000);
            Ok(())
        });
    }

    #[test]
    fn load_layers_file_legacy_and_prefixed_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[ingest]\nchunk_size = 500\nchunk_overlap = 50\n[vector]\ncollection = \"from-file\"\n",
            )?;
            jail.set_env("CHUNK_SIZE", "321");
            jail.set_env("CHUNK_OVERLAP", "21");
            jail.set_env("QDRANT_URL", "http://qdrant:6333");
            jail.set_env("COLLECTION_NAME", "legacy");
            jail.set_env("APP_VECTOR__COLLECTION", "prefixed");

            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert_eq!(settings.ingest.chunk_size, 321);
            assert_eq!(settings.ingest.chunk_overlap, 21);
            assert_eq!(settings.vector.url, "http://qdrant:6333");
            // APP_* is the last layer
            assert_eq!(settings.vector.collection, "prefixed");
            Ok(())
        });
    }

    #[test]
    fn resolve_relative_against_base() {
        let base = Path::new("/srv");
        assert_eq!(resolve_with_base(base, "docs"), PathBuf::from("/srv/docs"));
        assert_eq!(resolve_with_base(base, "/abs/docs"), PathBuf::from("/abs/docs"));
    }
}
