//! Stream driver: orchestrates reads, line reassembly and extraction.

use crate::config::{DiagnosticHook, ParserOptions};
use crate::decode::LineDecoder;
use crate::errors::ParseResult;
use crate::extract::{Extractor, StreamValue};
use crate::presets::Preset;
use bytes::Bytes;
use futures::stream::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

/// A boxed byte-stream source, for callers that need type erasure.
pub type BoxByteStream = Pin<Box<dyn Stream<Item = ParseResult<Bytes>> + Send>>;

/// A configured parser, reusable across many streams.
///
/// All per-stream state (parse context, accumulation buffer, carry-over
/// line buffer) lives in the [`AnswerStream`] returned by [`parse`], so one
/// `StreamParser` can drive concurrent decodes safely.
///
/// [`parse`]: StreamParser::parse
#[derive(Debug, Clone)]
pub struct StreamParser {
    options: ParserOptions,
}

impl StreamParser {
    /// Creates a parser from resolved options.
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Creates a parser from a preset layered over `base` options.
    /// Preset fields win on overlap.
    pub fn preset(preset: Preset, base: ParserOptions) -> Self {
        Self::new(preset.options(base))
    }

    /// OpenAI chat-completion preset over `base` options.
    pub fn openai(base: ParserOptions) -> Self {
        Self::preset(Preset::OpenAi, base)
    }

    /// DeepSeek preset over `base` options.
    pub fn deepseek(base: ParserOptions) -> Self {
        Self::preset(Preset::DeepSeek, base)
    }

    /// Dify preset over `base` options.
    pub fn dify(base: ParserOptions) -> Self {
        Self::preset(Preset::Dify, base)
    }

    /// Dify workflow-app preset over `base` options.
    pub fn dify_app(base: ParserOptions) -> Self {
        Self::preset(Preset::DifyApp, base)
    }

    /// The resolved options.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Starts decoding a byte stream.
    ///
    /// Returns a lazy, forward-only stream of emitted values. The source is
    /// read one chunk at a time and only when the consumer asks for the
    /// next value, so backpressure is structural.
    pub fn parse<S>(&self, source: S) -> AnswerStream<S>
    where
        S: Stream<Item = ParseResult<Bytes>>,
    {
        AnswerStream::new(source, self.options.clone())
    }
}

pin_project! {
    /// A stream of values decoded from one byte stream.
    ///
    /// Items are `Ok(StreamValue)` emissions in record arrival order. An
    /// `Err` item is terminal: it is yielded exactly once (the
    /// custom-parser error convention) and the stream ends. Source faults
    /// do not produce an `Err` item; they are logged, reported to the
    /// diagnostic hook when one is configured, and the stream simply ends.
    pub struct AnswerStream<S> {
        #[pin]
        inner: S,
        decoder: LineDecoder,
        extractor: Extractor,
        hook: Option<DiagnosticHook>,
        pending: VecDeque<ParseResult<StreamValue>>,
        done: bool,
    }
}

impl<S> AnswerStream<S>
where
    S: Stream<Item = ParseResult<Bytes>>,
{
    /// Creates a driver with fresh per-stream state.
    pub fn new(inner: S, options: ParserOptions) -> Self {
        let hook = options.on_swallowed.clone();
        Self {
            inner,
            decoder: LineDecoder::new(),
            extractor: Extractor::new(options),
            hook,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<S> Stream for AnswerStream<S>
where
    S: Stream<Item = ParseResult<Bytes>>,
{
    type Item = ParseResult<StreamValue>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Deliver queued emissions first; an error emission is final.
            if let Some(item) = this.pending.pop_front() {
                if item.is_err() {
                    *this.done = true;
                    this.pending.clear();
                }
                return Poll::Ready(Some(item));
            }

            if *this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    for record in this.decoder.feed(&chunk) {
                        if !drive_record(this.extractor, this.hook, this.pending, this.done, &record)
                        {
                            break;
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    // Transport faults never reach the consumer as items.
                    warn!(error = %e, "byte source failed, ending stream");
                    if let Some(hook) = this.hook {
                        hook(&e);
                    }
                    *this.done = true;
                }
                Poll::Ready(None) => {
                    debug!("byte source finished");
                    *this.done = true;
                    if let Some(tail) = this.decoder.finish() {
                        drive_record(this.extractor, this.hook, this.pending, this.done, &tail);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Feeds one record through the extractor, queueing the outcome.
///
/// Returns false when processing of further records must stop: either a
/// custom parser reported an error (queued for its single terminal
/// emission) or it faulted unexpectedly (swallowed: logged, hook notified,
/// stream marked done with no error item).
fn drive_record(
    extractor: &mut Extractor,
    hook: &Option<DiagnosticHook>,
    pending: &mut VecDeque<ParseResult<StreamValue>>,
    done: &mut bool,
    record: &str,
) -> bool {
    match extractor.process_record(record) {
        Ok(Some(value)) => {
            pending.push_back(Ok(value));
            true
        }
        Ok(None) => true,
        Err(e) if e.is_terminal() => {
            warn!(error = %e, "custom parser reported error, ending stream");
            pending.push_back(Err(e));
            false
        }
        Err(e) => {
            warn!(error = %e, "record processing fault, ending stream");
            if let Some(hook) = hook {
                hook(&e);
            }
            *done = true;
            false
        }
    }
}

/// Drains a stream and returns its final emission, if any.
///
/// A terminal error emission is returned as `Err`. A stream that ends with
/// no emissions (including silent termination after a swallowed fault)
/// returns `Ok(None)`.
pub async fn collect_final<S>(stream: AnswerStream<S>) -> ParseResult<Option<StreamValue>>
where
    S: Stream<Item = ParseResult<Bytes>>,
{
    use futures::StreamExt;

    futures::pin_mut!(stream);
    let mut last = None;
    while let Some(item) = stream.next().await {
        last = Some(item?);
    }
    Ok(last)
}
