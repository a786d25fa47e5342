use cucumber::{given, then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points},
    AccrualResult,
    BalanceApiError,
    BalanceLedger,
    OrderFlowError,
    OrderRegistry,
    SubmitOrderOutcome,
    WithdrawalResult,
};
use tokio_util::sync::CancellationToken;

use crate::cucumber::LoyaltyWorld;

fn number(s: &str) -> OrderNumber {
    OrderNumber::parse(s).expect("Not a valid order number")
}

fn points(s: &str) -> Points {
    s.parse::<Points>().expect("Not a valid amount")
}

#[given(expr = "the accrual service reports order {word} as PROCESSED with {word} points")]
async fn accrual_processed(world: &mut LoyaltyWorld, order: String, amount: String) {
    world.system().resolver.set(&number(&order), Ok(AccrualResult::Processed(points(&amount))));
}

#[given(expr = "the accrual service reports order {word} as {word}")]
async fn accrual_status(world: &mut LoyaltyWorld, order: String, status: String) {
    let result = match status.as_str() {
        "REGISTERED" => AccrualResult::Registered,
        "PROCESSING" => AccrualResult::Processing,
        "INVALID" => AccrualResult::Invalid,
        s => panic!("Unknown accrual status {s}"),
    };
    world.system().resolver.set(&number(&order), Ok(result));
}

#[given(expr = "{string} uploads order {word}")]
async fn uploaded_order(world: &mut LoyaltyWorld, login: String, order: String) {
    upload_order(world, login, order).await;
}

#[when(expr = "{string} uploads order {word}")]
async fn upload_order(world: &mut LoyaltyWorld, login: String, order: String) {
    let outcome = match world.system().orders.submit_order(&login, &order).await {
        Ok(SubmitOrderOutcome::Accepted(_)) => "accepted",
        Ok(SubmitOrderOutcome::AlreadyUploaded(_)) => "already uploaded",
        Err(OrderFlowError::OrderOwnedByOther(_)) => "owned by another user",
        Err(OrderFlowError::InvalidOrderNumber(_)) => "invalid order number",
        Err(e) => panic!("Unexpected error uploading order: {e}"),
    };
    world.set_outcome(outcome);
}

#[when(expr = "{string} lists their orders")]
async fn list_orders(world: &mut LoyaltyWorld, login: String) {
    let outcome = match world.system().orders.orders_for_user(&login, &CancellationToken::new()).await {
        Ok(orders) => format!("{} orders", orders.len()),
        Err(OrderFlowError::NoOrders) => "no orders".to_string(),
        Err(e) => panic!("Unexpected error listing orders: {e}"),
    };
    world.set_outcome(outcome);
}

#[when(expr = "order {word} is reconciled")]
async fn reconcile(world: &mut LoyaltyWorld, order: String) {
    let update = world.system().orders.reconcile_order(&number(&order), &CancellationToken::new()).await;
    let outcome = if update.expect("Error reconciling order").is_change() { "changed" } else { "unchanged" };
    world.set_outcome(outcome);
}

#[when(expr = "{string} withdraws {word} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: String, order: String) {
    let outcome = match world.system().balances.withdraw(&login, &order, points(&amount)).await {
        Ok(WithdrawalResult::Recorded { .. }) => "recorded",
        Ok(WithdrawalResult::AlreadyRecorded(_)) => "already recorded",
        Err(BalanceApiError::InsufficientBalance { .. }) => "insufficient balance",
        Err(BalanceApiError::OrderOwnedByOther(_)) => "owned by another user",
        Err(BalanceApiError::InvalidOrderNumber(_)) => "invalid order number",
        Err(BalanceApiError::InvalidAmount(_)) => "invalid amount",
        Err(e) => panic!("Unexpected error withdrawing: {e}"),
    };
    world.set_outcome(outcome);
}

#[then(expr = "the outcome is {string}")]
async fn check_outcome(world: &mut LoyaltyWorld, expected: String) {
    assert_eq!(world.outcome.as_deref(), Some(expected.as_str()));
}

#[then(expr = "order {word} belongs to {string}")]
async fn check_owner(world: &mut LoyaltyWorld, order: String, login: String) {
    let order = world.system().db.fetch_order(&number(&order)).await.expect("Error fetching order");
    assert_eq!(order.expect("Order does not exist").login, login);
}

#[then(expr = "order {word} does not exist")]
async fn check_missing(world: &mut LoyaltyWorld, order: String) {
    let order = world.system().db.fetch_order(&number(&order)).await.expect("Error fetching order");
    assert!(order.is_none());
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut LoyaltyWorld, order: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    let order = world.system().db.fetch_order(&number(&order)).await.expect("Error fetching order");
    assert_eq!(order.expect("Order does not exist").status, expected);
}

#[then(expr = "order {word} has an accrual of {word}")]
async fn check_accrual(world: &mut LoyaltyWorld, order: String, amount: String) {
    let order = world.system().db.fetch_order(&number(&order)).await.expect("Error fetching order");
    assert_eq!(order.expect("Order does not exist").accrual, Some(points(&amount)));
}

#[then(expr = "{string} has a current balance of {word} and has withdrawn {word}")]
async fn check_balance(world: &mut LoyaltyWorld, login: String, current: String, withdrawn: String) {
    let balance = world.system().db.fetch_balance(&login).await.expect("Error fetching balance");
    assert_eq!(balance.current, points(&current), "current balance");
    assert_eq!(balance.withdrawn, points(&withdrawn), "withdrawn total");
}

#[then(expr = "{string} has {int} withdrawal(s)")]
async fn check_withdrawals(world: &mut LoyaltyWorld, login: String, count: usize) {
    let withdrawals = world.system().db.fetch_withdrawals_for_user(&login).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count);
}

#[then(expr = "the accrual service was asked {int} time(s)")]
async fn check_calls(world: &mut LoyaltyWorld, count: usize) {
    assert_eq!(world.system().resolver.calls(), count);
}
