//! Query configuration.
//!
//! [`QueryConfig`] can be loaded from `config/undertow.toml` or environment
//! variables using `QueryConfig::load()`, or built in code.

use crate::error::Result;
use config::{Config, ConfigError, Environment, File, FileFormat};
use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder, Values};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/undertow.toml";
const ENV_PREFIX: &str = "UNDERTOW";

/// SQL dialect statements are rendered for
///
/// Behaviors that implement [`QueryAware`](crate::behavior::QueryAware) see the
/// dialect once when they are attached and may switch themselves off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
    Mysql,
}

impl Dialect {
    /// Render a statement with values inlined
    pub fn render(&self, statement: &SelectStatement) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
            Dialect::Mysql => statement.to_string(MysqlQueryBuilder),
        }
    }

    /// Quote an identifier for use inside raw SQL fragments
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Dialect::Mysql => format!("`{}`", identifier.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    /// Render a statement with placeholders and collect its bound values
    pub fn build(&self, statement: &SelectStatement) -> (String, Values) {
        match self {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::Sqlite => statement.build(SqliteQueryBuilder),
            Dialect::Mysql => statement.build(MysqlQueryBuilder),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default = "default_alias_separator")]
    pub alias_separator: String,
    #[serde(default)]
    pub log_statements: bool,
}

fn default_alias_separator() -> String {
    "_".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            alias_separator: default_alias_separator(),
            log_statements: false,
        }
    }
}

impl QueryConfig {
    /// Load the query configuration from `config/undertow.toml`, falling back to env vars.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Parse a TOML document containing a `[query]` table
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self> {
        match settings.get::<QueryConfig>("query") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Query configuration could not be loaded from file or environment: {}",
                e
            ))
            .into()),
        }
    }

    /// Fold a dotted relation path into a table alias (`office.employee` -> `office_employee`)
    pub fn alias_for(&self, path: &str) -> String {
        path.replace('.', &self.alias_separator)
    }

    /// Alias of a projected column (`office_employee` + `name` -> `office_employee_name`)
    pub fn column_alias(&self, table_alias: &str, column: &str) -> String {
        format!("{}{}{}", table_alias, self.alias_separator, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.alias_for("office.employee.department"), "office_employee_department");
        assert_eq!(config.column_alias("office_employee", "name"), "office_employee_name");
        assert!(!config.log_statements);
    }

    #[test]
    fn test_quote() {
        assert_eq!(Dialect::Postgres.quote("office_employee"), "\"office_employee\"");
        assert_eq!(Dialect::Mysql.quote("office"), "`office`");
    }

    #[test]
    fn test_from_toml_str() {
        let config = QueryConfig::from_toml_str(
            r#"
            [query]
            dialect = "sqlite"
            alias_separator = "__"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.alias_for("a.b"), "a__b");
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = QueryConfig::from_toml_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(config.alias_separator, "_");
    }

    #[test]
    fn test_invalid_dialect_is_an_error() {
        let err = QueryConfig::from_toml_str("[query]\ndialect = \"oracle\"\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Invalid);
    }
}
