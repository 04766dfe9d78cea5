//! Configuration for the stream parser.
//!
//! Provides the resolved option set controlling parse strategy (custom
//! parser vs. built-in JSON/text extraction), path-based field lookup,
//! accumulation mode and output shape, together with the per-invocation
//! [`ParseContext`] handed to custom parsers.

use crate::errors::{ParseError, ParseResult};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Default path looked up in JSON payloads.
pub const DEFAULT_CONTENT_PATH: &str = "content";

/// A custom per-record parser.
///
/// Invoked with the raw payload (after `data:` stripping) and the
/// stream-scoped [`ParseContext`]. The returned value is emitted as-is.
/// Returning `Err` surfaces the error to the consumer as the final stream
/// item and terminates the decode.
pub type ChunkParser =
    Arc<dyn Fn(&str, &mut ParseContext) -> ParseResult<Value> + Send + Sync>;

/// A validation hook for raw payloads.
///
/// Accepted and stored for API compatibility, but not consulted by the
/// built-in extraction path.
pub type ValidateChunk = Arc<dyn Fn(&str) -> ParseResult<()> + Send + Sync>;

/// Side channel notified when the driver swallows a terminating fault.
///
/// Source and internal errors end the stream with no error item; this hook
/// is the only way a consumer can distinguish a clean end from a swallowed
/// fault. It never alters the emitted value sequence.
pub type DiagnosticHook = Arc<dyn Fn(&ParseError) + Send + Sync>;

/// How a record payload is interpreted by built-in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkType {
    /// Parse the payload as JSON and read `content_path` from it.
    #[default]
    Json,
    /// Use the raw payload string as the fragment, unmodified.
    Text,
}

/// Shape of values emitted by built-in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    /// Emit the result text directly.
    #[default]
    Text,
    /// Emit an object wrapping the result text under a `text` field.
    Obj,
}

/// Resolved parser options.
///
/// Immutable after construction. Built from defaults, then caller-supplied
/// settings, then (when a preset is applied) the preset's fields, in that
/// precedence order: later wins, so preset fields override overlapping
/// caller settings.
#[derive(Clone, Default)]
pub struct ParserOptions {
    /// Custom per-record parser; when set it fully replaces built-in
    /// extraction and `chunk_type`, `content_path`, `auto_concat` and
    /// `output_type` are not consulted.
    pub chunk_parser: Option<ChunkParser>,
    /// Payload interpretation for built-in extraction.
    pub chunk_type: ChunkType,
    /// Dotted/bracket path read from JSON payloads, e.g.
    /// `choices[0].delta.content`.
    pub content_path: Option<String>,
    /// Whether extracted fragments accumulate into a running total
    /// (defaults to true).
    pub auto_concat: Option<bool>,
    /// Shape of emitted values for built-in extraction.
    pub output_type: OutputType,
    /// Validation hook; stored but not invoked by built-in extraction.
    pub validate_chunk: Option<ValidateChunk>,
    /// Side channel for swallowed driver faults.
    pub on_swallowed: Option<DiagnosticHook>,
}

impl ParserOptions {
    /// Creates a new options builder.
    pub fn builder() -> ParserOptionsBuilder {
        ParserOptionsBuilder::default()
    }

    /// The effective content path, falling back to
    /// [`DEFAULT_CONTENT_PATH`] when unset.
    pub fn content_path(&self) -> &str {
        self.content_path.as_deref().unwrap_or(DEFAULT_CONTENT_PATH)
    }

    /// The effective accumulation mode, defaulting to true.
    pub fn auto_concat(&self) -> bool {
        self.auto_concat.unwrap_or(true)
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("chunk_parser", &self.chunk_parser.as_ref().map(|_| "<fn>"))
            .field("chunk_type", &self.chunk_type)
            .field("content_path", &self.content_path())
            .field("auto_concat", &self.auto_concat())
            .field("output_type", &self.output_type)
            .field(
                "validate_chunk",
                &self.validate_chunk.as_ref().map(|_| "<fn>"),
            )
            .field("on_swallowed", &self.on_swallowed.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Builder for [`ParserOptions`].
#[derive(Default)]
pub struct ParserOptionsBuilder {
    options: ParserOptions,
}

impl ParserOptionsBuilder {
    /// Sets a custom per-record parser.
    pub fn chunk_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str, &mut ParseContext) -> ParseResult<Value> + Send + Sync + 'static,
    {
        self.options.chunk_parser = Some(Arc::new(parser));
        self
    }

    /// Sets the payload interpretation.
    pub fn chunk_type(mut self, chunk_type: ChunkType) -> Self {
        self.options.chunk_type = chunk_type;
        self
    }

    /// Sets the JSON content path.
    pub fn content_path(mut self, path: impl Into<String>) -> Self {
        self.options.content_path = Some(path.into());
        self
    }

    /// Sets the accumulation mode.
    pub fn auto_concat(mut self, auto_concat: bool) -> Self {
        self.options.auto_concat = Some(auto_concat);
        self
    }

    /// Sets the emitted value shape.
    pub fn output_type(mut self, output_type: OutputType) -> Self {
        self.options.output_type = output_type;
        self
    }

    /// Sets the payload validation hook.
    pub fn validate_chunk<F>(mut self, validate: F) -> Self
    where
        F: Fn(&str) -> ParseResult<()> + Send + Sync + 'static,
    {
        self.options.validate_chunk = Some(Arc::new(validate));
        self
    }

    /// Sets the swallowed-fault side channel.
    pub fn on_swallowed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ParseError) + Send + Sync + 'static,
    {
        self.options.on_swallowed = Some(Arc::new(hook));
        self
    }

    /// Builds the options. Infallible: every field has a default.
    pub fn build(self) -> ParserOptions {
        self.options
    }
}

/// Per-stream mutable state visible to custom parsers across records.
///
/// Created empty at the start of each decode, owned exclusively by that
/// decode, and passed by mutable reference into every custom-parser call so
/// state persists across records within one stream but never leaks across
/// streams.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    entries: Map<String, Value>,
}

impl ParseContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Inserts an entry, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Appends text to a string entry, initializing it to the empty string
    /// first if absent. Non-string entries are replaced.
    pub fn append_str(&mut self, key: &str, text: &str) {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::String(String::new()));
        match entry {
            Value::String(s) => s.push_str(text),
            other => *other = Value::String(text.to_string()),
        }
    }

    /// Returns the whole context as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
