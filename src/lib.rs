//! # LLM Stream Parser
//!
//! Incremental decoder for SSE-style LLM answer streams.
//!
//! Turns a byte stream (e.g. an HTTP response body) into a lazy sequence
//! of partial/complete answer fragments as they arrive, applying a
//! configurable extraction rule per event: line buffering across chunk
//! boundaries, `data:` record filtering, JSON-path or raw-text field
//! extraction, stateful content accumulation, and pluggable custom parsers
//! bundled as presets for known upstream formats.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_stream_parser::{ParserOptions, StreamParser};
//! use futures::StreamExt;
//!
//! # async fn example(body: impl futures::Stream<Item = llm_stream_parser::ParseResult<bytes::Bytes>>) {
//! // OpenAI chat-completion chunks, accumulated into running text.
//! let parser = StreamParser::openai(ParserOptions::default());
//!
//! let stream = parser.parse(body);
//! futures::pin_mut!(stream);
//! while let Some(value) = stream.next().await {
//!     match value {
//!         Ok(v) => println!("{:?}", v),
//!         Err(e) => eprintln!("stream ended: {}", e),
//!     }
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - `config` - Parser options, builder and parse context
//! - `presets` - Built-in bundles for known upstream formats
//! - `decode` - Line buffering over raw byte chunks
//! - `extract` - Record filtering, field extraction, accumulation
//! - `stream` - The stream driver and parser handle
//! - `errors` - Error types and taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod decode;
pub mod errors;
pub mod extract;
pub mod presets;
pub mod stream;

// Test support
pub mod fixtures;

// Re-exports for convenience
pub use config::{
    ChunkParser, ChunkType, DiagnosticHook, OutputType, ParseContext, ParserOptions,
    ParserOptionsBuilder, ValidateChunk, DEFAULT_CONTENT_PATH,
};
pub use decode::LineDecoder;
pub use errors::{ParseError, ParseResult};
pub use extract::{lookup_path, Extractor, StreamValue, DATA_PREFIX};
pub use presets::{Preset, DIFY_CONTENT_PATH, OPENAI_CONTENT_PATH};
pub use stream::{collect_final, AnswerStream, BoxByteStream, StreamParser};
