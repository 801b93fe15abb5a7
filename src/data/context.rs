//! Connection context threaded through every store call.
//!
//! A [`DbContext`] is either the pool connection or a shared handle to one open
//! transaction. Store code never begins transactions on its own; it asks the context,
//! which joins the surrounding transaction when there is one.

use std::{future::Future, sync::Arc};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::error::Error;

#[derive(Clone)]
pub enum DbContext {
    Connection(DatabaseConnection),
    Transaction(Arc<DatabaseTransaction>),
}

impl DbContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::Connection(db)
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Run `work` inside a transaction.
    ///
    /// A context that already carries a transaction is handed to `work` unchanged, so
    /// nested units of work join the outer transaction and only the outermost caller
    /// commits. Otherwise a new transaction is opened, committed when `work` returns
    /// `Ok` and rolled back when it returns `Err`. The error from `work` is always the
    /// one returned; a failed rollback is only logged.
    ///
    /// Dropping the returned future before completion drops the transaction handle,
    /// which rolls the transaction back.
    pub async fn in_transaction<T, F, Fut>(&self, work: F) -> Result<T, Error>
    where
        T: Send,
        F: FnOnce(DbContext) -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        let db = match self {
            Self::Transaction(_) => return work(self.clone()).await,
            Self::Connection(db) => db,
        };

        let txn = Arc::new(db.begin().await?);
        let result = work(Self::Transaction(Arc::clone(&txn))).await;

        let txn = match Arc::try_unwrap(txn) {
            Ok(txn) => txn,
            // The remaining handle rolls back once it is dropped
            Err(txn) => {
                tracing::error!(
                    handles = Arc::strong_count(&txn) - 1,
                    work_succeeded = result.is_ok(),
                    "Transaction handle retained past its unit of work, connection stays pinned until it drops"
                );
                return Err(Error::InternalError(
                    "transaction handle was retained past the end of its unit of work"
                        .to_string(),
                ))
            }
        };

        match result {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(
                        error = %rollback_err,
                        original_error = %err,
                        "Failed to roll back transaction"
                    );
                }
                Err(err)
            }
        }
    }
}

impl From<DatabaseConnection> for DbContext {
    fn from(db: DatabaseConnection) -> Self {
        Self::Connection(db)
    }
}

impl From<&DatabaseConnection> for DbContext {
    fn from(db: &DatabaseConnection) -> Self {
        Self::Connection(db.clone())
    }
}

/// Evaluate `$body` with `$db` bound to the context's underlying connection, either
/// `&DatabaseConnection` or `&DatabaseTransaction`.
///
/// Repositories are generic over `ConnectionTrait`, so the body is monomorphized once
/// per arm.
macro_rules! with_connection {
    ($ctx:expr, |$db:ident| $body:expr) => {
        match $ctx {
            $crate::data::context::DbContext::Connection(conn) => {
                let $db = conn;
                $body
            }
            $crate::data::context::DbContext::Transaction(txn) => {
                let $db = &**txn;
                $body
            }
        }
    };
}

pub(crate) use with_connection;
