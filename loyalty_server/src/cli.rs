//! Command line options for the server.
//!
//! Every option can also be given as an environment variable. Command line flags win over the environment, and the
//! environment wins over the defaults in [`crate::config`]. Secrets are only read from the environment.
use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "loyalty_server", version, about = "Loyalty points ledger server")]
pub struct CliOptions {
    /// The address and port to listen on, e.g. 127.0.0.1:8088
    #[arg(short = 'a', long, env = "RUN_ADDRESS")]
    pub run_address: Option<String>,
    /// The database connection string, e.g. sqlite://data/loyalty.db
    #[arg(short = 'd', long, env = "DATABASE_URI")]
    pub database_uri: Option<String>,
    /// The base address of the accrual service, e.g. http://127.0.0.1:8080
    #[arg(short = 'r', long, env = "ACCRUAL_SYSTEM_ADDRESS")]
    pub accrual_address: Option<String>,
    /// Deadline for a single accrual service request, in milliseconds
    #[arg(long, env = "ACCRUAL_TIMEOUT_MS")]
    pub accrual_timeout_ms: Option<u64>,
    /// Maximum number of orders being reconciled at the same time
    #[arg(long, env = "RECONCILE_WORKERS")]
    pub reconcile_workers: Option<usize>,
    /// Number of accepted orders that can wait for reconciliation before new ones are left pending
    #[arg(long, env = "RECONCILE_QUEUE_SIZE")]
    pub reconcile_queue_size: Option<usize>,
}
