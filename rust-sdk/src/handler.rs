//! User-supplied query handlers.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::Error;
use crate::query::{Query, QueryResult};

/// Message reported when a handler fails without a usable message.
pub const GENERIC_HANDLER_ERROR: &str = "Handler execution failed";

/// Answers marketplace queries.
///
/// Any async closure `Fn(Query) -> impl Future<Output = anyhow::Result<QueryResult>>`
/// implements this trait, so most agents never implement it by hand.
#[async_trait]
pub trait QueryHandler: Send + Sync + 'static {
    async fn handle(&self, query: Query) -> anyhow::Result<QueryResult>;
}

#[async_trait]
impl<F, Fut> QueryHandler for F
where
    F: Fn(Query) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<QueryResult>> + Send + 'static,
{
    async fn handle(&self, query: Query) -> anyhow::Result<QueryResult> {
        (self)(query).await
    }
}

pub type SharedHandler = Arc<dyn QueryHandler>;

/// Run `handler`, converting both errors and panics into [`Error::Handler`].
pub(crate) async fn invoke(handler: &SharedHandler, query: Query) -> Result<QueryResult, Error> {
    match AssertUnwindSafe(handler.handle(query)).catch_unwind().await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(Error::Handler(non_empty(e.to_string()))),
        Err(panic) => Err(Error::Handler(non_empty(
            panic_message(panic.as_ref()).unwrap_or_default(),
        ))),
    }
}

/// Text of a panic payload raised with `panic!("...")` or `panic!("{}", ..)`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_HANDLER_ERROR.to_string()
    } else {
        message
    }
}
