use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::DEFAULT_MAX_REPLY_CHARS;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ussd: UssdConfig,
    pub sms: SmsConfig,
    pub email: EmailConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct UssdConfig {
    /// Shortcode this deployment answers on; informational, echoed by the
    /// gateway in each request.
    pub service_code: String,
    /// Display budget for rendered replies, control marker included.
    pub max_reply_chars: usize,
}

#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub base_url: String,
    pub username: String,
    pub api_key: SecretString,
    pub sender_id: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub from_address: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub sms_api_key: Option<String>,
    pub email_api_key: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://harborcall.db".to_owned(),
                max_connections: 5,
                timeout_secs: 30,
            },
            ussd: UssdConfig {
                service_code: "*384*96#".to_owned(),
                max_reply_chars: DEFAULT_MAX_REPLY_CHARS,
            },
            sms: SmsConfig {
                base_url: "https://api.africastalking.com/version1/messaging".to_owned(),
                username: "sandbox".to_owned(),
                api_key: String::new().into(),
                sender_id: "HARBORCALL".to_owned(),
                timeout_secs: 15,
            },
            email: EmailConfig {
                base_url: "https://api.mailrelay.example/v1/messages".to_owned(),
                api_key: String::new().into(),
                from_address: "notifications@harborcall.example".to_owned(),
                timeout_secs: 15,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_owned(),
                port: 3000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    ussd: Option<UssdPatch>,
    sms: Option<SmsPatch>,
    email: Option<EmailPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct UssdPatch {
    service_code: Option<String>,
    max_reply_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SmsPatch {
    base_url: Option<String>,
    username: Option<String>,
    api_key: Option<String>,
    sender_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    from_address: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("harborcall.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(ussd) = patch.ussd {
            if let Some(service_code) = ussd.service_code {
                self.ussd.service_code = service_code;
            }
            if let Some(max_reply_chars) = ussd.max_reply_chars {
                self.ussd.max_reply_chars = max_reply_chars;
            }
        }

        if let Some(sms) = patch.sms {
            if let Some(base_url) = sms.base_url {
                self.sms.base_url = base_url;
            }
            if let Some(username) = sms.username {
                self.sms.username = username;
            }
            if let Some(api_key_value) = sms.api_key {
                self.sms.api_key = api_key_value.into();
            }
            if let Some(sender_id) = sms.sender_id {
                self.sms.sender_id = sender_id;
            }
            if let Some(timeout_secs) = sms.timeout_secs {
                self.sms.timeout_secs = timeout_secs;
            }
        }

        if let Some(email) = patch.email {
            if let Some(base_url) = email.base_url {
                self.email.base_url = base_url;
            }
            if let Some(api_key_value) = email.api_key {
                self.email.api_key = api_key_value.into();
            }
            if let Some(from_address) = email.from_address {
                self.email.from_address = from_address;
            }
            if let Some(timeout_secs) = email.timeout_secs {
                self.email.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HARBORCALL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HARBORCALL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("HARBORCALL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HARBORCALL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HARBORCALL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HARBORCALL_USSD_SERVICE_CODE") {
            self.ussd.service_code = value;
        }
        if let Some(value) = read_env("HARBORCALL_USSD_MAX_REPLY_CHARS") {
            self.ussd.max_reply_chars =
                parse_u32("HARBORCALL_USSD_MAX_REPLY_CHARS", &value)? as usize;
        }

        if let Some(value) = read_env("HARBORCALL_SMS_BASE_URL") {
            self.sms.base_url = value;
        }
        if let Some(value) = read_env("HARBORCALL_SMS_USERNAME") {
            self.sms.username = value;
        }
        if let Some(value) = read_env("HARBORCALL_SMS_API_KEY") {
            self.sms.api_key = value.into();
        }
        if let Some(value) = read_env("HARBORCALL_SMS_SENDER_ID") {
            self.sms.sender_id = value;
        }

        if let Some(value) = read_env("HARBORCALL_EMAIL_BASE_URL") {
            self.email.base_url = value;
        }
        if let Some(value) = read_env("HARBORCALL_EMAIL_API_KEY") {
            self.email.api_key = value.into();
        }
        if let Some(value) = read_env("HARBORCALL_EMAIL_FROM_ADDRESS") {
            self.email.from_address = value;
        }

        if let Some(value) = read_env("HARBORCALL_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HARBORCALL_SERVER_PORT") {
            self.server.port = parse_u16("HARBORCALL_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HARBORCALL_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("HARBORCALL_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("HARBORCALL_LOGGING_LEVEL").or_else(|| read_env("HARBORCALL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HARBORCALL_LOGGING_FORMAT").or_else(|| read_env("HARBORCALL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(sms_api_key) = overrides.sms_api_key {
            self.sms.api_key = sms_api_key.into();
        }
        if let Some(email_api_key) = overrides.email_api_key {
            self.email.api_key = email_api_key.into();
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_owned()));
        }
        // "CON " plus at least a handful of visible characters.
        if self.ussd.max_reply_chars < 12 {
            return Err(ConfigError::Validation(format!(
                "ussd.max_reply_chars must be at least 12, got {}",
                self.ussd.max_reply_chars
            )));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation("server.bind_address must not be empty".to_owned()));
        }
        if self.server.port == self.server.health_check_port {
            return Err(ConfigError::Validation(
                "server.port and server.health_check_port must differ".to_owned(),
            ));
        }
        if self.sms.sender_id.trim().is_empty() {
            return Err(ConfigError::Validation("sms.sender_id must not be empty".to_owned()));
        }
        if !self.email.from_address.contains('@') {
            return Err(ConfigError::Validation(format!(
                "email.from_address must be an address, got `{}`",
                self.email.from_address
            )));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("harborcall.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_validate() {
        let config = AppConfig::load(LoadOptions::default()).expect("default config loads");
        assert_eq!(config.ussd.max_reply_chars, 182);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[database]
url = "sqlite://test.db"

[ussd]
max_reply_chars = 160

[sms]
sender_id = "FISHDEPT"

[logging]
level = "debug"
format = "json"
"#
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect("config loads from file");

        assert_eq!(config.database.url, "sqlite://test.db");
        assert_eq!(config.ussd.max_reply_chars, 160);
        assert_eq!(config.sms.sender_id, "FISHDEPT");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[database]\nurl = \"sqlite://from-file.db\"\n").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_owned()),
                ..ConfigOverrides::default()
            },
        })
        .expect("config loads");

        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn tiny_reply_budget_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[ussd]\nmax_reply_chars = 4\n").expect("write config");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        });
        let message = result.expect_err("must fail validation").to_string();
        assert!(message.contains("max_reply_chars"));
    }

    #[test]
    fn colliding_ports_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[server]\nport = 8080\nhealth_check_port = 8080\n").expect("write config");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().expect("parses"), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
