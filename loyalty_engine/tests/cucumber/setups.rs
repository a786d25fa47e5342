use cucumber::given;
use loyalty_engine::{db_types::Points, BalanceLedger};

use crate::cucumber::{world::LedgerSystem, LoyaltyWorld};

#[given("a fresh ledger")]
async fn fresh_ledger(world: &mut LoyaltyWorld) {
    world.system = Some(LedgerSystem::new().await);
}

#[given(expr = "{string} has a balance of {word}")]
async fn opening_balance(world: &mut LoyaltyWorld, login: String, amount: String) {
    let amount = amount.parse::<Points>().expect("Not a valid amount");
    world.system().db.increase_balance(&login, amount).await.expect("Error funding balance");
}
