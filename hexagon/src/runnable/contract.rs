//! `Runnable`: a uniform six-mode execution surface for any `I -> O`
//! component (spec §4.9), generalizing the teacher's node/tool invocation
//! pattern so graph nodes, tools, and subgraphs can all be embedded,
//! retried, and composed the same way.
//!
//! Only `invoke` is required; the other five modes have defaults derived
//! from it (and from each other) per the spec's derivation table. An impl
//! that only has a single-shot call need implement nothing else; one that
//! naturally streams (an LLM token stream, say) overrides `stream` and gets
//! better `invoke`/`transform` defaults for free via `merge`.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::runnable::error::RunnableError;

pub type RunnableStream<'a, O> = BoxStream<'a, Result<O, RunnableError>>;

const DEFAULT_BATCH_CONCURRENCY: usize = 8;

#[async_trait]
pub trait Runnable<I, O>: Send + Sync
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Single input, single output. The only required method.
    async fn invoke(&self, input: I) -> Result<O, RunnableError>;

    /// Combines multiple outputs produced for a single logical call (e.g.
    /// the chunks read off `stream` or `transform`) into one. The default
    /// keeps the last item, which is correct for runnables whose `O` is
    /// already a complete value at each step; a chunked/accumulating
    /// runnable (e.g. one streaming partial text) should override this to
    /// concatenate instead.
    fn merge(&self, items: Vec<O>) -> Result<O, RunnableError> {
        items.into_iter().last().ok_or(RunnableError::EmptyStream)
    }

    /// Single input, streamed output. Default: invoke once, yield the one
    /// result.
    async fn stream(&self, input: I) -> RunnableStream<'_, O> {
        let result = self.invoke(input).await;
        Box::pin(stream::once(async move { result }))
    }

    /// Many inputs, many outputs, concurrent but order-preserving.
    async fn batch(&self, inputs: Vec<I>) -> Result<Vec<O>, RunnableError> {
        self.batch_with_concurrency(inputs, DEFAULT_BATCH_CONCURRENCY).await
    }

    async fn batch_with_concurrency(&self, inputs: Vec<I>, concurrency: usize) -> Result<Vec<O>, RunnableError> {
        stream::iter(inputs).map(|input| self.invoke(input)).buffered(concurrency.max(1)).collect::<Vec<_>>().await.into_iter().collect()
    }

    /// Streamed input, single output. Default: transform each input via
    /// `invoke`, then `merge` the results.
    async fn collect(&self, input_stream: BoxStream<'_, I>) -> Result<O, RunnableError> {
        let outputs: Vec<O> = self.transform(input_stream).try_collect().await?;
        self.merge(outputs)
    }

    /// Streamed input, streamed output. Default: per-element `invoke`,
    /// processed in order (the "bounded channel" of the spec's wording —
    /// one element in flight at a time, backpressured by the input stream).
    async fn transform<'a>(&'a self, input_stream: BoxStream<'a, I>) -> RunnableStream<'a, O> {
        Box::pin(input_stream.then(move |input| self.invoke(input)))
    }

    /// Many inputs, one merged output stream. Default: stream each input
    /// concurrently and interleave as results arrive.
    async fn batch_stream<'a>(&'a self, inputs: Vec<I>) -> RunnableStream<'a, O>
    where
        I: 'a,
    {
        let streams = futures::future::join_all(inputs.into_iter().map(|input| self.stream(input))).await;
        Box::pin(stream::select_all(streams))
    }
}
