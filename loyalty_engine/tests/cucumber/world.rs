use cucumber::World;
use log::*;
use loyalty_engine::{
    memory::StubAccrualResolver,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    BalanceApi,
    OrderFlowApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LedgerSystem>,
    /// A short description of the outcome of the last "When" step, e.g. "accepted" or "insufficient balance"
    pub outcome: Option<String>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub resolver: StubAccrualResolver,
    pub orders: OrderFlowApi<SqliteDatabase, StubAccrualResolver>,
    pub balances: BalanceApi<SqliteDatabase>,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LedgerSystem {
        self.system.as_ref().expect("The ledger has not been initialised")
    }

    pub fn set_outcome<S: Into<String>>(&mut self, outcome: S) {
        self.outcome = Some(outcome.into());
    }
}

impl LedgerSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        let resolver = StubAccrualResolver::new();
        let orders = OrderFlowApi::new(db.clone(), resolver.clone());
        let balances = BalanceApi::new(db.clone());
        Self { db_path: url, db, resolver, orders, balances }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
