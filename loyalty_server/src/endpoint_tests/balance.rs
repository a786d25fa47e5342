use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{NewOrder, OrderNumber},
    memory::MemoryDatabase,
    traits::{BalanceLedger, OrderRegistry},
    BalanceApi,
};
use serde_json::json;

use super::helpers::{bearer, call};
use crate::routes::{MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn configure(db: MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(BalanceApi::new(db)))
            .service(MyBalanceRoute::<MemoryDatabase>::new())
            .service(WithdrawRoute::<MemoryDatabase>::new())
            .service(MyWithdrawalsRoute::<MemoryDatabase>::new());
    }
}

async fn funded(login: &str, amount: Points) -> MemoryDatabase {
    let db = MemoryDatabase::new();
    db.increase_balance(login, amount).await.unwrap();
    db
}

fn withdraw(login: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/balance/withdraw").insert_header(bearer(login)).set_json(body)
}

#[actix_web::test]
async fn withdraw_and_report() {
    let _ = env_logger::try_init().ok();
    let db = funded("alice", Points::from_hundredths(50050)).await;
    let res = call(withdraw("alice", json!({"order": "2377225624", "sum": 751})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);

    let res = call(withdraw("alice", json!({"order": "2377225624", "sum": 100.25})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let req = TestRequest::get().uri("/balance").insert_header(bearer("alice"));
    let res = call(req, configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"current": 400.25, "withdrawn": 100.25}));

    let req = TestRequest::get().uri("/withdrawals").insert_header(bearer("alice"));
    let res = call(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let withdrawals = res.json();
    assert_eq!(withdrawals.as_array().map(Vec::len), Some(1));
    assert_eq!(withdrawals[0]["order"], "2377225624");
    assert_eq!(withdrawals[0]["sum"], 100.25);
    assert!(withdrawals[0]["processed_at"].is_string());
}

#[actix_web::test]
async fn rejected_withdrawals() {
    let _ = env_logger::try_init().ok();
    let db = funded("bob", Points::from_whole(100)).await;
    let res = call(withdraw("bob", json!({"order": "2377225620", "sum": 10})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = call(withdraw("bob", json!({"order": "2377225624", "sum": 0})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = call(withdraw("bob", json!({"order": "2377225624", "sum": -5})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let taken = OrderNumber::parse("79927398713").unwrap();
    db.register_order(NewOrder::new(taken, "carol")).await.unwrap();
    let res = call(withdraw("bob", json!({"order": "79927398713", "sum": 10})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = call(withdraw("bob", json!({"order": "2377225624", "sum": 1e28})), configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let balance = db.fetch_balance("bob").await.unwrap();
    assert_eq!(balance.current, Points::from_whole(100));
    assert_eq!(balance.withdrawn, Points::ZERO);
}

#[actix_web::test]
async fn no_withdrawals_yet() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/withdrawals").insert_header(bearer("dave"));
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
