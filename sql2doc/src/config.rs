use std::fmt::{Display, Formatter};

use serde::Deserialize;
use url::Url;

use crate::resolver::{QueryCatalog, WorkMode};
use crate::sink::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub connection_uri: String,
    /// inferred from `connection_uri` when absent
    pub dialect: Option<Dialect>,
    /// tables left out of a full database transfer
    pub skip: Option<Vec<String>>,
    /// named queries; when set, only these are transferred
    pub queries: Option<QueryCatalog>,
}

impl SourceConfig {
    pub fn connection_uri(&self) -> Result<SourceUri, ConfigError> {
        let uri = substitute_env_var(self.connection_uri.as_str())?;

        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => infer_dialect(uri.as_str())?,
        };

        match dialect {
            Dialect::Mysql => Ok(SourceUri::Mysql(uri)),
            Dialect::SqlServer => Ok(SourceUri::SqlServer(uri)),
            Dialect::Firebird => Ok(SourceUri::Firebird(uri)),
        }
    }

    pub fn work_mode(&self) -> WorkMode {
        match &self.queries {
            Some(queries) => WorkMode::Catalog(queries.clone()),
            None => WorkMode::FullDatabase {
                skip: self.skip.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DestinationConfig {
    pub connection_uri: String,
    /// defaults to the database named in `connection_uri`
    pub database: Option<String>,
    pub collection: String,
    pub batch_size: Option<usize>,
}

impl DestinationConfig {
    pub fn connection_uri(&self) -> Result<DestinationUri, ConfigError> {
        let uri = substitute_env_var(self.connection_uri.as_str())?;

        match scheme(uri.as_str())?.as_str() {
            "mongodb" | "mongodb+srv" => Ok(DestinationUri::MongoDB(uri)),
            scheme => Err(ConfigError::UnsupportedScheme(scheme.to_string())),
        }
    }

    pub fn batch_size(&self) -> Result<usize, ConfigError> {
        match self.batch_size {
            Some(0) => Err(ConfigError::InvalidBatchSize),
            Some(batch_size) => Ok(batch_size),
            None => Ok(DEFAULT_BATCH_SIZE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    #[serde(alias = "mssql")]
    SqlServer,
    Firebird,
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Firebird => write!(f, "firebird"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    Mysql(String),
    /// ADO or JDBC connection string
    SqlServer(String),
    Firebird(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationUri {
    MongoDB(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingEnvVar(String),
    MissingScheme,
    UnsupportedScheme(String),
    InvalidBatchSize,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingEnvVar(key) => {
                write!(f, "environment variable '{}' is missing", key)
            }
            ConfigError::MissingScheme => write!(f, "missing URI scheme"),
            ConfigError::UnsupportedScheme(scheme) => write!(f, "'{}' not supported", scheme),
            ConfigError::InvalidBatchSize => write!(f, "batch_size must be greater than 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn scheme(uri: &str) -> Result<String, ConfigError> {
    match Url::parse(uri) {
        Ok(url) => Ok(url.scheme().to_lowercase()),
        Err(_) => Err(ConfigError::MissingScheme),
    }
}

fn is_ado_string(uri: &str) -> bool {
    uri.split(';').any(|pair| {
        let key = pair.split('=').next().unwrap_or_default();
        matches!(
            key.trim().to_lowercase().as_str(),
            "server" | "data source" | "address" | "addr"
        )
    })
}

fn infer_dialect(uri: &str) -> Result<Dialect, ConfigError> {
    let lowercase_uri = uri.to_lowercase();

    if lowercase_uri.starts_with("jdbc:sqlserver://") || is_ado_string(uri) {
        return Ok(Dialect::SqlServer);
    }

    match scheme(uri)?.as_str() {
        "mysql" => Ok(Dialect::Mysql),
        "firebird" => Ok(Dialect::Firebird),
        scheme => Err(ConfigError::UnsupportedScheme(scheme.to_string())),
    }
}

/// take as input $KEY_ENV_VAR and convert it into a real value if the env var does exist
/// otherwise return an Error
fn substitute_env_var(env_var: &str) -> Result<String, ConfigError> {
    match env_var {
        "" => Ok(String::new()),
        env_var if env_var.starts_with('$') && env_var.len() > 1 => {
            let key = &env_var[1..];
            match std::env::var(key) {
                Ok(value) => Ok(value),
                Err(_) => Err(ConfigError::MissingEnvVar(key.to_string())),
            }
        }
        x => Ok(x.to_string()),
    }
}
