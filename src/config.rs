use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context};
use bb8_postgres::tokio_postgres;
use clap::Parser;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_PROTOCOL: &str = "tcp";

#[derive(Parser, Clone)]
#[clap(name = "reservation-service", about = "HTTP CRUD service for reservations")]
pub struct Config {
    #[clap(env, long, default_value = DEFAULT_DB_HOST)]
    pub db_servername: String,
    #[clap(env, long)]
    pub db_username: Option<String>,
    #[clap(env, long, default_value = "")]
    pub db_password: String,
    #[clap(env, long)]
    pub db_name: Option<String>,
    #[clap(env, long, default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,
    #[clap(env, long, default_value = DEFAULT_DB_PROTOCOL)]
    pub db_protocol: String,
    #[clap(env, long)]
    pub db_pool_size: Option<u32>,

    /// key:value file replacing the DB_* environment variables
    #[clap(env, long)]
    pub config_file: Option<PathBuf>,

    #[clap(env, long, default_value = "127.0.0.1")]
    pub listen_addr: IpAddr,
    #[clap(env, long, default_value_t = 8080)]
    pub port: u16,

    #[clap(env, long)]
    pub log_file: Option<PathBuf>,
    #[clap(env, long, default_value = "info")]
    pub log_level: tracing::Level,

    #[clap(env, long, default_value = "")]
    pub origin_urls: String,

    /// Reject creates whose license plate is already stored (409).
    #[clap(env, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub enforce_unique_plate: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_servername", &self.db_servername)
            .field("db_username", &self.db_username)
            .field("db_password", &"***")
            .field("db_name", &self.db_name)
            .field("db_port", &self.db_port)
            .field("db_protocol", &self.db_protocol)
            .field("db_pool_size", &self.db_pool_size)
            .field("config_file", &self.config_file)
            .field("listen_addr", &self.listen_addr)
            .field("port", &self.port)
            .field("log_file", &self.log_file)
            .field("log_level", &self.log_level)
            .field("origin_urls", &self.origin_urls)
            .field("enforce_unique_plate", &self.enforce_unique_plate)
            .finish()
    }
}

impl Config {
    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }

    pub fn pool_size(&self) -> u32 {
        self.db_pool_size
            .unwrap_or_else(|| num_cpus::get() as u32)
            .max(1)
    }

    /// Resolves database settings from the config file when one is given,
    /// otherwise from the DB_* variables.
    pub fn database_settings(&self) -> anyhow::Result<DatabaseSettings> {
        match &self.config_file {
            Some(path) => FileSettingsSource::new(path).database_settings(),
            None => EnvSettingsSource::new(self).database_settings(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub protocol: String,
    pub database_name: String,
}

impl DatabaseSettings {
    /// The DSN with the password masked, for logging.
    pub fn redacted_dsn(&self) -> String {
        self.format_dsn("***")
    }

    /// `user:password@proto(host:port)/dbname`
    fn format_dsn(&self, password: &str) -> String {
        format!(
            "{}:{}@{}({}:{})/{}",
            self.username,
            password,
            self.protocol,
            self.host,
            self.port,
            self.database_name,
        )
    }

    pub fn postgres_config(&self) -> tokio_postgres::Config {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .dbname(&self.database_name);
        if !self.password.is_empty() {
            pg_config.password(&self.password);
        }
        pg_config
    }
}

/// Where database credentials come from. The handlers never see this; only
/// startup asks a source for its settings.
pub trait DatabaseSettingsSource {
    fn database_settings(&self) -> anyhow::Result<DatabaseSettings>;
}

pub struct EnvSettingsSource<'a> {
    config: &'a Config,
}

impl<'a> EnvSettingsSource<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl DatabaseSettingsSource for EnvSettingsSource<'_> {
    fn database_settings(&self) -> anyhow::Result<DatabaseSettings> {
        let username = self
            .config
            .db_username
            .clone()
            .ok_or_else(|| anyhow!("DB_USERNAME must be set when no config file is given"))?;
        let database_name = self
            .config
            .db_name
            .clone()
            .ok_or_else(|| anyhow!("DB_NAME must be set when no config file is given"))?;

        Ok(DatabaseSettings {
            host: self.config.db_servername.clone(),
            port: self.config.db_port,
            username,
            password: self.config.db_password.clone(),
            protocol: self.config.db_protocol.clone(),
            database_name,
        })
    }
}

/// Reads a `key: value` per line file with the keys `username`, `password`,
/// `connectionmethod`, `ip`, `port` and `databaseName`.
pub struct FileSettingsSource {
    path: PathBuf,
}

impl FileSettingsSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatabaseSettingsSource for FileSettingsSource {
    fn database_settings(&self) -> anyhow::Result<DatabaseSettings> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Error when opening config file: {}", self.path.display()))?;
        let mut values = parse_key_values(&contents);
        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        let host = take("ip");
        let port = take("port");
        let protocol = take("connectionmethod");
        let port = if port.is_empty() {
            DEFAULT_DB_PORT
        } else {
            port.parse()
                .with_context(|| format!("Invalid port in config file: {}", port))?
        };

        Ok(DatabaseSettings {
            host: non_empty_or(host, DEFAULT_DB_HOST),
            port,
            username: take("username"),
            password: take("password"),
            protocol: non_empty_or(protocol, DEFAULT_DB_PROTOCOL),
            database_name: take("databaseName"),
        })
    }
}

/// Splits each line on its first `:` and trims both halves. Lines without a
/// colon are skipped; a repeated key keeps its last value.
pub fn parse_key_values(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            host: "db.local".to_string(),
            port: 3306,
            username: "admin".to_string(),
            password: "secret".to_string(),
            protocol: "tcp".to_string(),
            database_name: "parking".to_string(),
        }
    }

    fn write_temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn dsn_matches_expected_layout() {
        assert_eq!(settings().format_dsn("secret"), "admin:secret@tcp(db.local:3306)/parking");
        assert_eq!(settings().redacted_dsn(), "admin:***@tcp(db.local:3306)/parking");
    }

    #[test]
    fn key_values_split_on_first_colon() {
        let values = parse_key_values(
            "username: admin\n\
             password :a:b:c\n\
             this line is ignored\n\
             ip:  10.0.0.1  \n",
        );

        assert_eq!(values.get("username").map(String::as_str), Some("admin"));
        assert_eq!(values.get("password").map(String::as_str), Some("a:b:c"));
        assert_eq!(values.get("ip").map(String::as_str), Some("10.0.0.1"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn file_source_reads_all_keys() {
        let path = write_temp_file(
            "full-config.txt",
            "username: admin\n\
             password: secret\n\
             connectionmethod: tcp\n\
             ip: db.local\n\
             port: 3306\n\
             databaseName: parking\n",
        );

        let loaded = FileSettingsSource::new(&path).database_settings().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings());
    }

    #[test]
    fn file_source_falls_back_to_defaults() {
        let path = write_temp_file("sparse-config.txt", "username: admin\ndatabaseName: parking\n");

        let loaded = FileSettingsSource::new(&path).database_settings().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.host, DEFAULT_DB_HOST);
        assert_eq!(loaded.port, DEFAULT_DB_PORT);
        assert_eq!(loaded.protocol, DEFAULT_DB_PROTOCOL);
        assert_eq!(loaded.password, "");
    }

    #[test]
    fn file_source_rejects_bad_port() {
        let path = write_temp_file("bad-port-config.txt", "port: not-a-port\n");

        let res = FileSettingsSource::new(&path).database_settings();
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let res = FileSettingsSource::new("/nonexistent/reservations/config.txt").database_settings();
        assert!(res.is_err());
    }

    #[test]
    fn env_source_uses_flags_and_requires_credentials() {
        let config = Config::try_parse_from([
            "reservation-service",
            "--db-servername", "db.local",
            "--db-username", "admin",
            "--db-password", "secret",
            "--db-name", "parking",
            "--db-port", "3306",
            "--db-protocol", "tcp",
        ])
        .unwrap();
        // CONFIG_FILE may be exported in the surrounding environment.
        let config = Config {
            config_file: None,
            ..config
        };
        assert_eq!(config.database_settings().unwrap(), settings());

        let mut without_user = config.clone();
        without_user.db_username = None;
        assert!(without_user.database_settings().is_err());
    }

    #[test]
    fn debug_output_masks_password() {
        let config = Config::try_parse_from([
            "reservation-service",
            "--db-username", "admin",
            "--db-password", "hunter2",
        ])
        .unwrap();

        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("admin"));
    }

    #[test]
    fn parses_server_options() {
        let config = Config::try_parse_from([
            "reservation-service",
            "--listen-addr", "0.0.0.0",
            "--port", "9090",
            "--db-pool-size", "0",
            "--enforce-unique-plate", "false",
            "--log-level", "debug",
        ])
        .unwrap();

        assert_eq!(config.listen_address(), "0.0.0.0:9090".parse().unwrap());
        assert_eq!(config.pool_size(), 1);
        assert!(!config.enforce_unique_plate);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }
}
