//! Configuration management for the server.

use folio_engine::{PaginatorConfig, Schema, SortPolicy, StoreSnapshot};
use std::env;
use std::path::{Path, PathBuf};

/// Where records are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL `records` table
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// In-process store, optionally seeded from a snapshot file
    Memory,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Record store backend
    pub backend: StoreBackend,
    /// JSON schema file; a built-in schema is used when unset
    pub schema_path: Option<PathBuf>,
    /// JSON snapshot loaded at startup
    pub seed_path: Option<PathBuf>,
    /// Scheme and host pagination links are built on; the request's Host
    /// header is used when unset
    pub public_url: Option<String>,
    /// Fields callers may not sort by
    pub forbidden_sort_fields: Vec<String>,
    /// Query keys understood by the paginator
    pub paginator: PaginatorConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidMaxConnections)?,
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        Ok(Self {
            host,
            port,
            backend,
            schema_path: lookup("SCHEMA_PATH").map(PathBuf::from),
            seed_path: lookup("SEED_PATH").map(PathBuf::from),
            public_url: lookup("PUBLIC_URL"),
            forbidden_sort_fields: lookup("FORBIDDEN_SORT_FIELDS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            paginator: paginator_config(&lookup),
        })
    }

    /// Sort policy for collection endpoints.
    pub fn sort_policy(&self) -> SortPolicy {
        SortPolicy::forbid(self.forbidden_sort_fields.iter().cloned())
    }

    /// The configured schema, or the built-in one.
    pub fn load_schema(&self) -> Result<Schema, ConfigError> {
        match &self.schema_path {
            Some(path) => {
                let raw = read(path)?;
                serde_json::from_str(&raw).map_err(|source| ConfigError::InvalidSchema {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(default_schema()),
        }
    }

    /// The seed snapshot, if one is configured.
    pub fn load_seed(&self) -> Result<Option<StoreSnapshot>, ConfigError> {
        let Some(path) = &self.seed_path else {
            return Ok(None);
        };
        let raw = read(path)?;
        StoreSnapshot::from_json(&raw)
            .map(Some)
            .map_err(|source| ConfigError::InvalidSeed {
                path: path.clone(),
                source,
            })
    }
}

/// Paginator key overrides; unset keys keep their defaults.
fn paginator_config(lookup: &impl Fn(&str) -> Option<String>) -> PaginatorConfig {
    let mut config = PaginatorConfig::default();
    let keys: [(&str, &mut String); 6] = [
        ("ORDER_KEY", &mut config.sort.order_key),
        ("ORDER_BY_KEY", &mut config.sort.order_by_key),
        ("LIMIT_KEY", &mut config.pagination.limit_key),
        ("STARTING_AFTER_KEY", &mut config.pagination.starting_after_key),
        ("ENDING_BEFORE_KEY", &mut config.pagination.ending_before_key),
        ("SOFT_DELETE_KEY", &mut config.soft_delete_key),
    ];
    for (var, slot) in keys {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            *slot = value;
        }
    }
    if let Some(raw) = lookup("DESCENDING_VALUES") {
        let values = split_list(&raw);
        if !values.is_empty() {
            config.sort.descending_values = values;
        }
    }
    config
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Schema served when no schema file is configured.
fn default_schema() -> Schema {
    use folio_engine::{CollectionSchema, FieldDef, FieldType};

    Schema::new(1)
        .with_collection(CollectionSchema::new(
            "authors",
            vec![
                FieldDef::required("name", FieldType::String),
                FieldDef::optional("email", FieldType::String).unsortable(),
                FieldDef::optional("deletedAt", FieldType::Timestamp),
            ],
        ))
        .with_collection(CollectionSchema::new(
            "articles",
            vec![
                FieldDef::required("title", FieldType::String),
                FieldDef::optional("views", FieldType::Int),
                FieldDef::optional("publishedAt", FieldType::Timestamp),
                FieldDef::optional("draft", FieldType::Bool),
                FieldDef::reference("author", "authors"),
                FieldDef::optional("deletedAt", FieldType::Timestamp),
            ],
        ))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required for the postgres backend")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid DATABASE_MAX_CONNECTIONS value")]
    InvalidMaxConnections,

    #[error("Invalid STORE_BACKEND '{0}', expected postgres or memory")]
    InvalidBackend(String),

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid schema file {}: {source}", path.display())]
    InvalidSchema {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid seed file {}: {source}", path.display())]
    InvalidSeed {
        path: PathBuf,
        source: folio_engine::Error,
    },
}
