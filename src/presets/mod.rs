//! Named configuration bundles for known upstream event formats.
//!
//! A preset pre-fills [`ParserOptions`] for one upstream format. Presets
//! are applied last in the merge order, so a preset's fields win over
//! overlapping caller-supplied settings; fields a preset does not define
//! are left as the caller set them.

use crate::config::{ChunkParser, ChunkType, OutputType, ParseContext, ParserOptions};
use crate::errors::ParseError;
use crate::extract::lookup_path;
use serde_json::Value;
use std::sync::Arc;

/// Content path used by the [`Preset::OpenAi`] bundle.
pub const OPENAI_CONTENT_PATH: &str = "choices[0].delta.content";

/// Content path used by the [`Preset::Dify`] bundle.
pub const DIFY_CONTENT_PATH: &str = "answer";

/// Built-in presets for known upstream event formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// OpenAI chat-completion chunks: JSON records, delta content at
    /// `choices[0].delta.content`, accumulated, emitted as text.
    OpenAi,
    /// DeepSeek chunks: custom parser keying delta content fragments into
    /// the parse context and emitting the whole context every record.
    DeepSeek,
    /// Dify chunks: JSON records, content at `answer`, accumulated,
    /// emitted as text.
    Dify,
    /// Dify workflow-app events: custom parser tracking the latest titled
    /// node in the context's `current` entry and emitting it every record.
    DifyApp,
}

impl Preset {
    /// Layers this preset's fields on top of `base`.
    ///
    /// Overlapping fields resolve to the preset's values; everything else
    /// keeps the caller's settings.
    pub fn options(&self, mut base: ParserOptions) -> ParserOptions {
        match self {
            Preset::OpenAi => {
                base.chunk_type = ChunkType::Json;
                base.content_path = Some(OPENAI_CONTENT_PATH.to_string());
                base.auto_concat = Some(true);
                base.output_type = OutputType::Text;
            }
            Preset::Dify => {
                base.chunk_type = ChunkType::Json;
                base.content_path = Some(DIFY_CONTENT_PATH.to_string());
                base.auto_concat = Some(true);
                base.output_type = OutputType::Text;
            }
            Preset::DeepSeek => {
                base.chunk_parser = Some(deepseek_parser());
            }
            Preset::DifyApp => {
                base.chunk_parser = Some(dify_app_parser());
            }
        }
        base
    }

    /// This preset's fields over default options.
    pub fn default_options(&self) -> ParserOptions {
        self.options(ParserOptions::default())
    }
}

/// Custom parser for DeepSeek chunks.
///
/// Reads `choices[0].delta.content` from each JSON record. Non-empty
/// content is appended into a context entry keyed by the content string
/// itself, initializing the entry on first sight; empty or absent content
/// leaves the context untouched. The emitted value is the entire context
/// object every record, not just the new fragment.
fn deepseek_parser() -> ChunkParser {
    Arc::new(|payload: &str, ctx: &mut ParseContext| {
        let parsed: Value = serde_json::from_str(payload.trim()).map_err(|e| {
            ParseError::malformed(format!("DeepSeek record is not valid JSON: {}", e))
        })?;

        if let Some(content) = lookup_path(&parsed, OPENAI_CONTENT_PATH).and_then(Value::as_str) {
            if !content.is_empty() {
                ctx.append_str(content, content);
            }
        }

        Ok(ctx.to_value())
    })
}

/// Custom parser for Dify workflow-app events.
///
/// Tracks the latest titled node in the context's `current` entry:
/// `node_started` (for node types other than `start`), `iteration_started`
/// and `iteration_next` adopt `data.title`; `node_finished` adopts
/// `data.outputs.output`. A falsy candidate keeps the previous `current`.
/// The (possibly unchanged) `current` value is emitted every record.
fn dify_app_parser() -> ChunkParser {
    Arc::new(|payload: &str, ctx: &mut ParseContext| {
        let parsed: Value = serde_json::from_str(payload.trim()).map_err(|e| {
            ParseError::malformed(format!("Dify app record is not valid JSON: {}", e))
        })?;

        let event = parsed.get("event").and_then(Value::as_str).unwrap_or("");
        let candidate = match event {
            "node_started" => {
                let node_type = lookup_path(&parsed, "data.node_type")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if node_type == "start" {
                    None
                } else {
                    lookup_path(&parsed, "data.title").cloned()
                }
            }
            "iteration_started" | "iteration_next" => lookup_path(&parsed, "data.title").cloned(),
            "node_finished" => lookup_path(&parsed, "data.outputs.output").cloned(),
            _ => None,
        };

        if let Some(value) = candidate.filter(is_truthy) {
            ctx.insert("current", value);
        }

        Ok(ctx.get("current").cloned().unwrap_or(Value::Null))
    })
}

/// Truthiness in the upstream convention: null, empty string, zero and
/// false are falsy; everything else (including empty arrays and objects)
/// is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
