//! `WithFallback`: try a primary `Runnable`, then each fallback in order
//! (spec §4.9 "Fallback").

use std::sync::Arc;

use async_trait::async_trait;

use crate::runnable::contract::Runnable;
use crate::runnable::error::RunnableError;

/// Restricts which errors trigger a fallback attempt; errors this filter
/// rejects propagate immediately instead of trying the next fallback.
pub type ExceptionsToHandle = Arc<dyn Fn(&RunnableError) -> bool + Send + Sync>;

pub struct WithFallback<I, O> {
    primary: Arc<dyn Runnable<I, O>>,
    fallbacks: Vec<Arc<dyn Runnable<I, O>>>,
    exceptions_to_handle: ExceptionsToHandle,
}

impl<I, O> WithFallback<I, O> {
    pub fn new(primary: Arc<dyn Runnable<I, O>>, fallbacks: Vec<Arc<dyn Runnable<I, O>>>) -> Self {
        Self {
            primary,
            fallbacks,
            exceptions_to_handle: Arc::new(|_| true),
        }
    }

    pub fn with_exceptions_to_handle(mut self, filter: ExceptionsToHandle) -> Self {
        self.exceptions_to_handle = filter;
        self
    }
}

#[async_trait]
impl<I, O> Runnable<I, O> for WithFallback<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    async fn invoke(&self, input: I) -> Result<O, RunnableError> {
        let mut errors = Vec::new();
        match self.primary.invoke(input.clone()).await {
            Ok(output) => return Ok(output),
            Err(err) => {
                if !(self.exceptions_to_handle)(&err) {
                    return Err(err);
                }
                errors.push(err.to_string());
            }
        }

        for fallback in &self.fallbacks {
            match fallback.invoke(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(err) => {
                    if !(self.exceptions_to_handle)(&err) {
                        return Err(err);
                    }
                    errors.push(err.to_string());
                }
            }
        }

        Err(RunnableError::AllFallbacksFailed(errors))
    }
}
