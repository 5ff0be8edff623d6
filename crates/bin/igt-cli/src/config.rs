use clap::{Args, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;

const DEFAULT_DB_NAMESPACE: &str = "igt";
const DEFAULT_DB_NAME: &str = "corpus";

/// Database connection flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct DbArgs {
    #[arg(
        long,
        env = "IGT_DB_IN_MEMORY",
        default_value_t = true,
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    db_in_memory: bool,

    /// `SurrealDB` websocket endpoint, e.g. `127.0.0.1:8000`.
    #[arg(long, env = "IGT_DB_URI", global = true)]
    db_uri: Option<String>,

    #[arg(long, env = "IGT_DB_USERNAME", global = true)]
    db_username: Option<String>,

    #[arg(long, env = "IGT_DB_PASSWORD", global = true)]
    db_password: Option<String>,

    #[arg(long, env = "IGT_DB_NAMESPACE", default_value = DEFAULT_DB_NAMESPACE, global = true)]
    db_namespace: String,

    #[arg(long, env = "IGT_DB_NAME", default_value = DEFAULT_DB_NAME, global = true)]
    db_name: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone, Debug)]
pub struct IgtConfig {
    pub db_in_memory: bool,
    pub db_uri: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub db_namespace: String,
    pub db_name: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl IgtConfig {
    /// Remote endpoint to connect to, or `None` when running in memory.
    pub fn remote_uri(&self) -> Option<&str> {
        if self.db_in_memory {
            None
        } else {
            self.db_uri.as_deref()
        }
    }
}

impl TryFrom<DbArgs> for IgtConfig {
    type Error = ConfigError;

    fn try_from(args: DbArgs) -> Result<Self, Self::Error> {
        let db_uri = args.db_uri.filter(|value| !value.trim().is_empty());
        let db_username = args.db_username.filter(|value| !value.trim().is_empty());
        let db_password = args.db_password.filter(|value| !value.trim().is_empty());

        let db_in_memory = args.db_in_memory || db_uri.is_none();

        if !db_in_memory {
            if db_username.is_none() {
                return Err(ConfigError::MissingSetting("IGT_DB_USERNAME"));
            }
            if db_password.is_none() {
                return Err(ConfigError::MissingSetting("IGT_DB_PASSWORD"));
            }
        }

        if args.db_namespace.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "IGT_DB_NAMESPACE",
                value: args.db_namespace,
            });
        }
        if args.db_name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "IGT_DB_NAME",
                value: args.db_name,
            });
        }

        Ok(Self {
            db_in_memory,
            db_uri,
            db_username,
            db_password,
            db_namespace: args.db_namespace,
            db_name: args.db_name,
        })
    }
}
