//! Test fixtures for the stream parser.
//!
//! This module provides in-memory byte sources and pre-built SSE stream
//! data for use in tests.

use crate::errors::{ParseError, ParseResult};
use bytes::Bytes;
use futures::stream::{self, Stream};

/// An in-memory byte source yielding the given chunks, then end-of-stream.
pub fn byte_source<I>(chunks: I) -> impl Stream<Item = ParseResult<Bytes>> + Send
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok(chunk.into()))
            .collect::<Vec<_>>(),
    )
}

/// An in-memory byte source yielding the given chunks, then the given
/// error.
pub fn failing_source<I>(chunks: I, error: ParseError) -> impl Stream<Item = ParseResult<Bytes>> + Send
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    let mut items: Vec<ParseResult<Bytes>> =
        chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
    items.push(Err(error));
    stream::iter(items)
}

/// Sample OpenAI chat-completion SSE data, one chunk per network read.
pub fn openai_stream_data() -> Vec<Bytes> {
    vec![
        Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n"),
        Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\", world\"}}]}\n"),
        Bytes::from_static(b"data: [DONE]\n"),
    ]
}

/// Sample Dify workflow-app SSE data covering node and iteration events.
pub fn dify_app_stream_data() -> Vec<Bytes> {
    vec![
        Bytes::from_static(
            b"data:{\"event\":\"node_started\",\"data\":{\"node_type\":\"start\",\"title\":\"Start\"}}\n",
        ),
        Bytes::from_static(
            b"data:{\"event\":\"node_started\",\"data\":{\"node_type\":\"llm\",\"title\":\"Reasoning\"}}\n",
        ),
        Bytes::from_static(
            b"data:{\"event\":\"node_finished\",\"data\":{\"outputs\":{\"output\":\"All done\"}}}\n",
        ),
    ]
}
