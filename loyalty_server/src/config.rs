use std::{env, time::Duration};

use log::*;
use loyalty_common::{helpers::parse_boolean_flag, Secret};
use loyalty_engine::{
    accrual::DEFAULT_ACCRUAL_TIMEOUT,
    reconciliation::{DEFAULT_RECONCILE_QUEUE_SIZE, DEFAULT_RECONCILE_WORKERS},
    AccrualConfig,
    ReconciliationConfig,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::{cli::CliOptions, errors::ServerError};

const DEFAULT_RUN_ADDRESS: &str = "127.0.0.1:8088";
const DEFAULT_DATABASE_URI: &str = "sqlite://data/loyalty.db";
const DEFAULT_ACCRUAL_ADDRESS: &str = "http://127.0.0.1:8080";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// The `host:port` the HTTP server binds to.
    pub run_address: String,
    pub database_uri: String,
    pub max_db_connections: u32,
    /// If true, the sqlite database file is created if it is missing, and migrations are run at startup.
    pub create_database: bool,
    pub accrual: AccrualConfig,
    pub reconciliation: ReconciliationConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: DEFAULT_RUN_ADDRESS.to_string(),
            database_uri: DEFAULT_DATABASE_URI.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            create_database: true,
            accrual: AccrualConfig::new(DEFAULT_ACCRUAL_ADDRESS, DEFAULT_ACCRUAL_TIMEOUT),
            reconciliation: ReconciliationConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Builds the configuration from parsed command line options (which clap has already merged with their
    /// environment variables), plus the settings that are only read from the environment.
    pub fn from_cli_and_env(options: CliOptions) -> Self {
        let run_address = options.run_address.unwrap_or_else(|| {
            info!("🪛️ RUN_ADDRESS is not set. Using the default, {DEFAULT_RUN_ADDRESS}.");
            DEFAULT_RUN_ADDRESS.to_string()
        });
        let database_uri = options.database_uri.unwrap_or_else(|| {
            info!("🪛️ DATABASE_URI is not set. Using the default, {DEFAULT_DATABASE_URI}.");
            DEFAULT_DATABASE_URI.to_string()
        });
        let accrual_address = options.accrual_address.unwrap_or_else(|| {
            warn!("🪛️ ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_ADDRESS}.");
            DEFAULT_ACCRUAL_ADDRESS.to_string()
        });
        let timeout = options.accrual_timeout_ms.map(Duration::from_millis).unwrap_or_else(|| {
            info!("🪛️ ACCRUAL_TIMEOUT_MS is not set. Using the default of {}ms.", DEFAULT_ACCRUAL_TIMEOUT.as_millis());
            DEFAULT_ACCRUAL_TIMEOUT
        });
        let workers = options.reconcile_workers.filter(|w| *w > 0).unwrap_or(DEFAULT_RECONCILE_WORKERS);
        let queue_size = options.reconcile_queue_size.filter(|q| *q > 0).unwrap_or(DEFAULT_RECONCILE_QUEUE_SIZE);
        info!("🪛️ Reconciliation: {workers} workers, queue size {queue_size}");
        let max_db_connections = env::var("LOYALTY_MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for LOYALTY_MAX_DB_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS);
        let create_database = parse_boolean_flag(env::var("LOYALTY_DB_CREATE").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration from environment variables. {e}.");
            AuthConfig::default()
        });
        Self {
            run_address,
            database_uri,
            max_db_connections,
            create_database,
            accrual: AccrualConfig::new(accrual_address, timeout),
            reconciliation: ReconciliationConfig { workers, queue_size },
            auth,
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token stays valid.
    pub token_expiry: Duration,
    /// The bcrypt work factor used when hashing new passwords.
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. All access tokens \
             will be invalidated when the server restarts. Set LOYALTY_JWT_SECRET in production. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_expiry: DEFAULT_TOKEN_EXPIRY, bcrypt_cost: bcrypt::DEFAULT_COST }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_expiry: Duration, bcrypt_cost: u32) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_expiry, bcrypt_cost }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("LOYALTY_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [LOYALTY_JWT_SECRET]")))?;
        if secret.len() < 16 {
            return Err(ServerError::ConfigurationError(
                "LOYALTY_JWT_SECRET must be at least 16 characters long".to_string(),
            ));
        }
        let token_expiry = env::var("LOYALTY_JWT_EXPIRY")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for LOYALTY_JWT_EXPIRY. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);
        let bcrypt_cost = env::var("LOYALTY_BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|c| (4..=31).contains(c))
            .unwrap_or(bcrypt::DEFAULT_COST);
        Ok(Self { jwt_secret: Secret::new(secret), token_expiry, bcrypt_cost })
    }
}
