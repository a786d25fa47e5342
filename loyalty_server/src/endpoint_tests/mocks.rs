use loyalty_engine::{db_types::OrderNumber, AccrualError, AccrualResolver, AccrualResult};
use mockall::mock;
use tokio_util::sync::CancellationToken;

mock! {
    pub Resolver {}
    impl AccrualResolver for Resolver {
        async fn resolve(&self, order_number: &OrderNumber, cancel: &CancellationToken) -> Result<AccrualResult, AccrualError>;
    }
}
