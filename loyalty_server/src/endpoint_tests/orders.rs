use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{NewOrder, OrderNumber, OrderStatusType},
    memory::MemoryDatabase,
    traits::{BalanceLedger, LoyaltyDatabase, OrderRegistry},
    AccrualError,
    AccrualResult,
    OrderFlowApi,
};

use super::{
    helpers::{bearer, call},
    mocks::MockResolver,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

fn configure(db: MemoryDatabase, resolver: MockResolver) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db, resolver)))
            .service(SubmitOrderRoute::<MemoryDatabase, MockResolver>::new())
            .service(MyOrdersRoute::<MemoryDatabase, MockResolver>::new());
    }
}

fn upload(login: &str, number: &str) -> TestRequest {
    TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(login))
        .insert_header(("Content-Type", "text/plain"))
        .set_payload(number.to_string())
}

fn number(s: &str) -> OrderNumber {
    OrderNumber::parse(s).unwrap()
}

#[actix_web::test]
async fn upload_new_and_repeated_orders() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let res = call(upload("alice", "12345678903"), configure(db.clone(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::ACCEPTED, "{}", res.body);
    let res = call(upload("alice", "12345678903\n"), configure(db.clone(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = call(upload("bob", "12345678903"), configure(db.clone(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let order = db.fetch_order(&number("12345678903")).await.unwrap().expect("Order was not stored");
    assert_eq!(order.login, "alice");
    assert_eq!(order.status, OrderStatusType::New);
}

#[actix_web::test]
async fn upload_bad_order_numbers() {
    let _ = env_logger::try_init().ok();
    let res = call(upload("alice", "12345678900"), configure(MemoryDatabase::new(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["error"], "Invalid order number: '12345678900'");
    let res = call(upload("alice", "  "), configure(MemoryDatabase::new(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn upload_requires_plain_text() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer("alice"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("12345678903");
    let res = call(req, configure(db.clone(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let req = TestRequest::post().uri("/orders").insert_header(bearer("alice")).set_payload("12345678903");
    let res = call(req, configure(db.clone(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(db.fetch_order(&number("12345678903")).await.unwrap().is_none());

    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer("alice"))
        .insert_header(("Content-Type", "text/plain; charset=utf-8"))
        .set_payload("12345678903");
    let res = call(req, configure(db, MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn upload_without_a_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").set_payload("12345678903");
    let res = call(req, configure(MemoryDatabase::new(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn list_with_no_orders() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders").insert_header(bearer("carol"));
    let res = call(req, configure(MemoryDatabase::new(), MockResolver::new())).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn list_refreshes_pending_orders() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.register_order(NewOrder::new(number("9278923470"), "dave")).await.unwrap();
    db.register_order(NewOrder::new(number("2377225624"), "dave")).await.unwrap();
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().returning(|n, _| match n.as_str() {
        "9278923470" => Ok(AccrualResult::Processed(Points::from_hundredths(72998))),
        _ => Err(AccrualError::Timeout(5000)),
    });
    let req = TestRequest::get().uri("/orders").insert_header(bearer("dave"));
    let res = call(req, configure(db.clone(), resolver)).await;
    assert_eq!(res.status, StatusCode::OK);
    let orders = res.json();
    let orders = orders.as_array().expect("Expected a list of orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["number"], "9278923470");
    assert_eq!(orders[0]["status"], "PROCESSED");
    let accrual = orders[0]["accrual"].as_f64().expect("Accrual should be a number");
    assert!((accrual - 729.98).abs() < 1e-9, "was: {accrual}");
    assert_eq!(orders[1]["number"], "2377225624");
    assert_eq!(orders[1]["status"], "NEW");
    assert!(orders[1].get("accrual").is_none());
    let uploaded_at = orders[1]["uploaded_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(uploaded_at).is_ok(), "was: {uploaded_at}");

    assert_eq!(db.fetch_balance("dave").await.unwrap().current, Points::from_hundredths(72998));
}

#[actix_web::test]
async fn settled_orders_are_not_resolved_again() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.register_order(NewOrder::new(number("18"), "erin")).await.unwrap();
    db.apply_accrual(&number("18"), AccrualResult::Invalid).await.unwrap();
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let req = TestRequest::get().uri("/orders").insert_header(bearer("erin"));
    let res = call(req, configure(db, resolver)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()[0]["status"], "INVALID");
}
