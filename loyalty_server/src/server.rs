use std::time::Duration;

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::{Compress, Logger},
    web,
    App,
    HttpServer,
};
use log::*;
use loyalty_engine::{
    AccrualClient,
    BalanceApi,
    OrderFlowApi,
    ReconcileJob,
    ReconciliationProducer,
    SqliteDatabase,
    UserApi,
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    reconcile_worker::start_reconciliation_worker,
    routes::{
        health,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = if config.create_database {
        SqliteDatabase::create_and_migrate(&config.database_uri, config.max_db_connections).await
    } else {
        SqliteDatabase::new_with_url(&config.database_uri, config.max_db_connections).await
    }
    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let resolver =
        AccrualClient::new(config.accrual.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let shutdown = CancellationToken::new();
    let (worker, producer) =
        start_reconciliation_worker(db.clone(), resolver.clone(), config.reconciliation, shutdown.clone());
    let srv = create_server_instance(config, db.clone(), resolver, producer, shutdown.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🚀️ Server has stopped. Shutting down the reconciliation worker");
    shutdown.cancel();
    if let Err(e) = worker.await {
        warn!("🚀️ Reconciliation worker did not shut down cleanly. {e}");
    }
    db.close().await;
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    resolver: AccrualClient,
    producer: ReconciliationProducer<ReconcileJob>,
    shutdown: CancellationToken,
) -> Result<Server, ServerError> {
    let run_address = config.run_address.clone();
    let srv = HttpServer::new(move || {
        let orders_api =
            OrderFlowApi::new(db.clone(), resolver.clone()).with_reconciliation_queue(producer.clone());
        let balance_api = BalanceApi::new(db.clone());
        let user_api = UserApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase, AccrualClient>::new())
            .service(MyOrdersRoute::<SqliteDatabase, AccrualClient>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Compress::default())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("loyalty::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(balance_api))
            .app_data(web::Data::new(user_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(config.auth.clone()))
            .app_data(web::Data::new(shutdown.clone()))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(run_address.as_str())?
    .run();
    Ok(srv)
}
