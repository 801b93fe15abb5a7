use std::{future::Future, time::Duration};

use async_trait::async_trait;

use crate::{
    data::context::DbContext, error::Error, service::provisioning::persist::TransactionManager,
};

/// Transaction manager backed by the database context.
///
/// An optional deadline bounds the whole unit of work. When it expires the work future is
/// dropped, which drops its transaction handle and rolls the transaction back.
#[derive(Clone, Copy, Debug, Default)]
pub struct DbTransactionManager {
    timeout: Option<Duration>,
}

impl DbTransactionManager {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl TransactionManager for DbTransactionManager {
    async fn in_transaction<T, F, Fut>(&self, ctx: &DbContext, work: F) -> Result<T, Error>
    where
        T: Send,
        F: FnOnce(DbContext) -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        // Joined transactions are bounded by the outermost deadline
        let Some(limit) = self.timeout.filter(|_| !ctx.is_transaction()) else {
            return ctx.in_transaction(work).await;
        };

        match tokio::time::timeout(limit, ctx.in_transaction(work)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?limit, "Transaction timed out, rolling back");

                Err(Error::TransactionTimeout(limit))
            }
        }
    }
}
