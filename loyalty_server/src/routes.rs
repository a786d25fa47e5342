//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Database calls and accrual requests are async, and password hashing
//! is sent to the blocking thread pool (see [`crate::auth`]), so no handler here blocks.
use actix_web::{cookie::Cookie, get, http::header, web, HttpRequest, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    traits::{BalanceLedger, LoyaltyDatabase, UserManagement},
    AccrualResolver,
    BalanceApi,
    BalanceApiError,
    OrderFlowApi,
    OrderFlowError,
    SubmitOrderOutcome,
    UserApi,
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer, TOKEN_COOKIE},
    config::AuthConfig,
    data_objects::{BalanceView, Credentials, JsonResponse, OrderView, WithdrawRequest, WithdrawalView},
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
//
// * `impl A, B` creates one type parameter per bound, in order, and passes them to the handler.
// * `impl all A, B` creates a single type parameter that satisfies every bound.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl all $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Users  ----------------------------------------------------

/// Builds the 200 response for a successful registration or login. The access token is returned in the
/// `Authorization` header, and as a cookie for browser clients.
fn token_response(issuer: &TokenIssuer, login: &str, message: &str) -> Result<HttpResponse, ServerError> {
    let token = issuer.issue_token(login)?;
    let cookie = Cookie::build(TOKEN_COOKIE, token.clone()).path("/").http_only(true).finish();
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .cookie(cookie)
        .json(JsonResponse::success(message)))
}

route!(register => Post "/register" impl all UserManagement, BalanceLedger);
/// Route handler for user registration
///
/// Creates the user and logs them in. Returns 409 if the login is taken.
pub async fn register<B>(
    body: web::Json<Credentials>,
    api: web::Data<UserApi<B>>,
    issuer: web::Data<TokenIssuer>,
    auth: web::Data<AuthConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement + BalanceLedger,
{
    let credentials = body.into_inner();
    credentials.validate()?;
    let login = credentials.login.trim().to_string();
    debug!("💻️ POST register for {login}");
    let hash = hash_password(credentials.password, auth.bcrypt_cost).await?;
    api.register_user(&login, &hash).await?;
    token_response(&issuer, &login, "User registered")
}

route!(login => Post "/login" impl all UserManagement, BalanceLedger);
/// Route handler for user login
///
/// Unknown logins and wrong passwords are both reported as 401, with the same message.
pub async fn login<B>(
    body: web::Json<Credentials>,
    api: web::Data<UserApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement + BalanceLedger,
{
    let credentials = body.into_inner();
    credentials.validate()?;
    let login = credentials.login.trim().to_string();
    debug!("💻️ POST login for {login}");
    let user = api.fetch_user(&login).await?.ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(credentials.password, user.password_hash).await? {
        info!("🔑️ Failed login attempt for {login}");
        return Err(AuthError::InvalidCredentials.into());
    }
    token_response(&issuer, &login, "Logged in")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(submit_order => Post "/orders" impl LoyaltyDatabase, AccrualResolver);
/// Route handler for order uploads
///
/// The body is the plain-text order number, sent as `text/plain`. Returns 202 if the order is new, and 200 if the user
/// has uploaded it before.
pub async fn submit_order<B, R>(
    claims: JwtClaims,
    req: HttpRequest,
    body: String,
    api: web::Data<OrderFlowApi<B, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: LoyaltyDatabase,
    R: AccrualResolver,
{
    if !is_plain_text(&req) {
        return Err(ServerError::InvalidRequestBody("Order numbers must be sent as text/plain".into()));
    }
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("An order number is required".into()));
    }
    debug!("💻️ POST order [{number}] for {}", claims.login());
    let outcome = api.submit_order(claims.login(), number).await?;
    match outcome {
        SubmitOrderOutcome::Accepted(order) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order {} accepted", order.order_number))))
        },
        SubmitOrderOutcome::AlreadyUploaded(order) => Ok(HttpResponse::Ok()
            .json(JsonResponse::success(format!("Order {} was already uploaded", order.order_number)))),
    }
}

/// Accepts `text/plain` with or without parameters such as a charset.
fn is_plain_text(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/plain"))
}

route!(my_orders => Get "/orders" impl LoyaltyDatabase, AccrualResolver);
/// Route handler for the order listing
///
/// Pending orders are refreshed from the accrual service before they are reported. Returns 204 if the user has not
/// uploaded any orders.
pub async fn my_orders<B, R>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, R>>,
    shutdown: web::Data<CancellationToken>,
) -> Result<HttpResponse, ServerError>
where
    B: LoyaltyDatabase,
    R: AccrualResolver,
{
    debug!("💻️ GET orders for {}", claims.login());
    let cancel = shutdown.child_token();
    match api.orders_for_user(claims.login(), &cancel).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(orders.into_iter().map(OrderView::from).collect::<Vec<_>>())),
        Err(OrderFlowError::NoOrders) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Balance  ----------------------------------------------------

route!(my_balance => Get "/balance" impl LoyaltyDatabase);
pub async fn my_balance<B: LoyaltyDatabase>(
    claims: JwtClaims,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET balance for {}", claims.login());
    let balance = api.balance(claims.login()).await?;
    Ok(HttpResponse::Ok().json(BalanceView::from(balance)))
}

route!(withdraw => Post "/balance/withdraw" impl LoyaltyDatabase);
/// Route handler for withdrawals
///
/// Spends `sum` points against the order number `order`. Returns 402 if the balance is too low, and 409 if the order
/// number is already registered to another user.
pub async fn withdraw<B: LoyaltyDatabase>(
    claims: JwtClaims,
    body: web::Json<WithdrawRequest>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against [{order}] for {}", claims.login());
    api.withdraw(claims.login(), &order, sum).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Withdrew {sum} points"))))
}

route!(my_withdrawals => Get "/withdrawals" impl LoyaltyDatabase);
pub async fn my_withdrawals<B: LoyaltyDatabase>(
    claims: JwtClaims,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals for {}", claims.login());
    match api.withdrawals(claims.login()).await {
        Ok(w) => Ok(HttpResponse::Ok().json(w.into_iter().map(WithdrawalView::from).collect::<Vec<_>>())),
        Err(BalanceApiError::NoWithdrawals) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(e.into()),
    }
}
