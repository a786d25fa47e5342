use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use loyalty_engine::{memory::MemoryDatabase, traits::UserManagement, BalanceApi, UserApi};
use serde_json::json;

use super::helpers::{bearer, call, get_auth_config, issue_token};
use crate::{
    auth::TokenIssuer,
    routes::{LoginRoute, MyBalanceRoute, RegisterRoute},
};

fn configure(db: MemoryDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(UserApi::new(db.clone())))
            .app_data(web::Data::new(BalanceApi::new(db)))
            .service(RegisterRoute::<MemoryDatabase>::new())
            .service(LoginRoute::<MemoryDatabase>::new())
            .service(MyBalanceRoute::<MemoryDatabase>::new());
    }
}

fn credentials(login: &str, password: &str) -> serde_json::Value {
    json!({ "login": login, "password": password })
}

#[actix_web::test]
async fn register_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let req = TestRequest::post().uri("/register").set_json(credentials("alice", "s3cret"));
    let res = call(req, configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let auth = res.headers.get(header::AUTHORIZATION).expect("No Authorization header").to_str().unwrap();
    let token = auth.strip_prefix("Bearer ").expect("Not a bearer token");
    let claims = TokenIssuer::new(&get_auth_config()).validate(token).unwrap();
    assert_eq!(claims.login(), "alice");
    let cookie = res.headers.get(header::SET_COOKIE).expect("No cookie").to_str().unwrap();
    assert!(cookie.starts_with(&format!("token={token}")), "was: {cookie}");

    let user = db.fetch_user("alice").await.unwrap().expect("User was not stored");
    assert_ne!(user.password_hash, "s3cret");
}

#[actix_web::test]
async fn register_a_taken_login() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.create_user("alice", "hash").await.unwrap();
    let req = TestRequest::post().uri("/register").set_json(credentials("alice", "other"));
    let res = call(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["error"], "The login 'alice' is already taken");
}

#[actix_web::test]
async fn register_with_a_bad_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/register").set_json(credentials("", "pw"));
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/register")
        .insert_header(header::ContentType::json())
        .set_payload(r#"{"login": "bob""#);
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_checks_the_password() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let req = TestRequest::post().uri("/register").set_json(credentials("carol", "correct horse"));
    assert_eq!(call(req, configure(db.clone())).await.status, StatusCode::OK);

    let req = TestRequest::post().uri("/login").set_json(credentials("carol", "correct horse"));
    let res = call(req, configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers.contains_key(header::AUTHORIZATION));

    let req = TestRequest::post().uri("/login").set_json(credentials("carol", "battery staple"));
    let res = call(req, configure(db.clone())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post().uri("/login").set_json(credentials("nobody", "correct horse"));
    let res = call(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Authentication Error. Invalid login or password.");
}

#[actix_web::test]
async fn protected_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    let res = call(TestRequest::get().uri("/balance"), configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Authentication Error. No access token was provided.");

    let mut token = issue_token("dave");
    token.replace_range(token.len() - 6.., "AAAAAA");
    let req = TestRequest::get().uri("/balance").insert_header(("Authorization", format!("Bearer {token}")));
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn tokens_are_accepted_from_header_or_cookie() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/balance").insert_header(bearer("erin"));
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::OK);

    let req = TestRequest::get().uri("/balance").cookie(Cookie::new("token", issue_token("erin")));
    let res = call(req, configure(MemoryDatabase::new())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "current": 0.0, "withdrawn": 0.0 }));
}
