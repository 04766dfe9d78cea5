//! Per-record filtering, field extraction and accumulation.

use crate::config::{ChunkType, OutputType, ParseContext, ParserOptions};
use crate::errors::ParseResult;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// The literal prefix carrying payload records.
pub const DATA_PREFIX: &str = "data:";

/// A value emitted by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamValue {
    /// Plain text emission (built-in extraction with text output).
    Text(String),
    /// Structured emission: `{"text": ...}` wrappers from built-in
    /// extraction with object output, or whatever a custom parser returns.
    Object(Value),
}

impl StreamValue {
    /// The text content, when this is a text emission.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamValue::Text(text) => Some(text),
            StreamValue::Object(_) => None,
        }
    }

    /// The JSON value, when this is a structured emission.
    pub fn as_object(&self) -> Option<&Value> {
        match self {
            StreamValue::Text(_) => None,
            StreamValue::Object(value) => Some(value),
        }
    }
}

/// Applies the configured extraction rule to complete records.
///
/// Owns the per-stream mutable state: the custom-parser [`ParseContext`]
/// and the running accumulation buffer. Both are created fresh with the
/// extractor and discarded with it, so a configured parser can be reused
/// across streams without state leaking between them.
pub struct Extractor {
    options: ParserOptions,
    context: ParseContext,
    output: String,
}

impl Extractor {
    /// Creates an extractor with fresh per-stream state.
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            context: ParseContext::new(),
            output: String::new(),
        }
    }

    /// Processes one complete record.
    ///
    /// Returns `Ok(None)` for records filtered out (no `data:` prefix),
    /// `Ok(Some(value))` for an emission, and `Err` only when a custom
    /// parser reports failure, which terminates the whole decode.
    pub fn process_record(&mut self, record: &str) -> ParseResult<Option<StreamValue>> {
        // Only `data:` lines carry payload; `event:` lines, comments and
        // blank separators are dropped. The prefix strip is an exact
        // 5-character removal, leading payload whitespace is preserved.
        let Some(payload) = record.strip_prefix(DATA_PREFIX) else {
            return Ok(None);
        };

        if let Some(parser) = &self.options.chunk_parser {
            let value = parser(payload, &mut self.context)?;
            return Ok(Some(StreamValue::Object(value)));
        }

        let fragment = match self.options.chunk_type {
            ChunkType::Text => payload.to_string(),
            ChunkType::Json => match serde_json::from_str::<Value>(payload.trim()) {
                Ok(parsed) => fragment_text(lookup_path(&parsed, self.options.content_path())),
                Err(e) => {
                    // Malformed payloads are recovered locally: the record
                    // contributes an empty fragment and the stream goes on.
                    warn!(error = %e, "failed to parse record payload as JSON");
                    String::new()
                }
            },
        };

        let result = if self.options.auto_concat() {
            self.output.push_str(&fragment);
            self.output.clone()
        } else {
            fragment
        };
        debug!(len = result.len(), "extracted record");

        Ok(Some(match self.options.output_type {
            OutputType::Text => StreamValue::Text(result),
            OutputType::Obj => StreamValue::Object(json!({ "text": result })),
        }))
    }
}

/// Renders a path lookup result as a fragment string.
///
/// Absent paths and nulls yield the empty string; string leaves yield
/// their contents; any other leaf yields its compact JSON text.
fn fragment_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Resolves a dotted/bracket path such as `choices[0].delta.content`
/// against a JSON value. Returns `None` when any step is absent or the
/// path is malformed.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        let (name, rest) = match segment.find('[') {
            Some(bracket) => (&segment[..bracket], &segment[bracket..]),
            None => (segment, ""),
        };

        if !name.is_empty() {
            current = current.get(name)?;
        }

        let mut rest = rest;
        while let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped.find(']')?;
            let index: usize = stripped[..close].parse().ok()?;
            current = current.get(index)?;
            rest = &stripped[close + 1..];
        }
        if !rest.is_empty() {
            return None;
        }
    }
    Some(current)
}
