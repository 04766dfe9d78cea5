//! End-to-end tests for the stream parser over simulated byte streams.

use bytes::Bytes;
use futures::StreamExt;
use llm_stream_parser::fixtures::{
    byte_source, dify_app_stream_data, failing_source, openai_stream_data,
};
use llm_stream_parser::{
    ChunkType, OutputType, ParseError, ParserOptions, StreamParser, StreamValue,
    OPENAI_CONTENT_PATH,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

async fn collect_values(parser: &StreamParser, chunks: Vec<Bytes>) -> Vec<StreamValue> {
    let stream = parser.parse(byte_source(chunks));
    futures::pin_mut!(stream);
    let mut values = Vec::new();
    while let Some(item) = stream.next().await {
        values.push(item.expect("unexpected error item"));
    }
    values
}

async fn collect_texts(parser: &StreamParser, chunks: Vec<Bytes>) -> Vec<String> {
    collect_values(parser, chunks)
        .await
        .into_iter()
        .map(|v| v.as_text().expect("expected text emission").to_string())
        .collect()
}

fn split_bytes(text: &str, at: usize) -> Vec<Bytes> {
    let raw = text.as_bytes();
    let at = at.min(raw.len());
    vec![
        Bytes::copy_from_slice(&raw[..at]),
        Bytes::copy_from_slice(&raw[at..]),
    ]
}

#[tokio::test]
async fn openai_example_accumulates_fragments() {
    let parser = StreamParser::openai(ParserOptions::default());
    let texts = collect_texts(
        &parser,
        vec![
            Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n"),
            Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n"),
        ],
    )
    .await;

    assert_eq!(texts, vec!["A".to_string(), "AB".to_string()]);
}

#[tokio::test]
async fn done_sentinel_is_not_special_cased() {
    let parser = StreamParser::openai(ParserOptions::default());
    let texts = collect_texts(&parser, openai_stream_data()).await;

    // `[DONE]` is just another record whose payload is not valid JSON: it
    // contributes an empty fragment and re-emits the running total rather
    // than ending the stream.
    assert_eq!(
        texts,
        vec![
            "Hello".to_string(),
            "Hello, world".to_string(),
            "Hello, world".to_string(),
        ]
    );
}

#[test_case(1; "inside the prefix")]
#[test_case(7; "inside the payload")]
#[test_case(23; "at the record boundary")]
#[test_case(30; "inside the second record")]
#[tokio::test]
async fn line_reassembly_is_split_invariant(at: usize) {
    let text = "data:{\"content\":\"one\"}\ndata:{\"content\":\"two\"}\n";
    let parser = StreamParser::new(ParserOptions::builder().auto_concat(false).build());

    let single = collect_texts(&parser, vec![Bytes::copy_from_slice(text.as_bytes())]).await;
    let split = collect_texts(&parser, split_bytes(text, at)).await;

    assert_eq!(single, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(split, single);
}

#[tokio::test]
async fn multibyte_code_point_survives_chunk_boundary() {
    let text = "data:{\"content\":\"héllo\"}\n";
    // Split inside the two-byte 'é'.
    let at = text.find('é').unwrap() + 1;
    let parser = StreamParser::new(ParserOptions::default());

    let texts = collect_texts(&parser, split_bytes(text, at)).await;
    assert_eq!(texts, vec!["héllo".to_string()]);
}

#[tokio::test]
async fn non_data_records_never_emit() {
    let parser = StreamParser::new(ParserOptions::default());
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(
            b"event: message\n: keep-alive comment\n\ndata:{\"content\":\"only\"}\nid: 7\n",
        )],
    )
    .await;

    assert_eq!(texts, vec!["only".to_string()]);
}

#[tokio::test]
async fn standalone_fragments_without_concat() {
    let parser = StreamParser::new(ParserOptions::builder().auto_concat(false).build());
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(
            b"data:{\"content\":\"f1\"}\ndata:{\"content\":\"f2\"}\ndata:{\"content\":\"f3\"}\n",
        )],
    )
    .await;

    assert_eq!(
        texts,
        vec!["f1".to_string(), "f2".to_string(), "f3".to_string()]
    );
}

#[tokio::test]
async fn malformed_json_yields_empty_fragment_and_continues() {
    let parser = StreamParser::new(ParserOptions::default());
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(
            b"data:{\"content\":\"A\"}\ndata:not json at all\ndata:{\"content\":\"B\"}\n",
        )],
    )
    .await;

    // The malformed record contributes nothing but still emits the running
    // total; decoding carries on with the next record.
    assert_eq!(
        texts,
        vec!["A".to_string(), "A".to_string(), "AB".to_string()]
    );
}

#[tokio::test]
async fn trailing_record_without_newline_emits_at_end_of_stream() {
    let parser = StreamParser::new(ParserOptions::default());
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(b"data:{\"content\":\"tail\"}")],
    )
    .await;

    assert_eq!(texts, vec!["tail".to_string()]);
}

#[tokio::test]
async fn preset_path_wins_over_caller_path() {
    let base = ParserOptions::builder().content_path("x").build();
    let parser = StreamParser::openai(base);

    assert_eq!(parser.options().content_path(), OPENAI_CONTENT_PATH);

    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(
            b"data:{\"x\":\"wrong\",\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n",
        )],
    )
    .await;
    assert_eq!(texts, vec!["hi".to_string()]);
}

#[tokio::test]
async fn obj_output_wraps_running_text() {
    let parser = StreamParser::new(ParserOptions::builder().output_type(OutputType::Obj).build());
    let values = collect_values(
        &parser,
        vec![Bytes::from_static(
            b"data:{\"content\":\"A\"}\ndata:{\"content\":\"B\"}\n",
        )],
    )
    .await;

    assert_eq!(values[0].as_object(), Some(&json!({"text": "A"})));
    assert_eq!(values[1].as_object(), Some(&json!({"text": "AB"})));
}

#[tokio::test]
async fn text_chunks_preserve_payload_verbatim() {
    let parser = StreamParser::new(
        ParserOptions::builder()
            .chunk_type(ChunkType::Text)
            .auto_concat(false)
            .build(),
    );
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(b"data: leading space kept\n")],
    )
    .await;

    assert_eq!(texts, vec![" leading space kept".to_string()]);
}

#[tokio::test]
async fn deepseek_preset_emits_whole_context_each_record() {
    let parser = StreamParser::deepseek(ParserOptions::default());
    let values = collect_values(
        &parser,
        vec![
            Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n"),
            Bytes::from_static(b"data:{\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
        ],
    )
    .await;

    assert_eq!(values[0].as_object(), Some(&json!({"a": "a"})));
    assert_eq!(values[1].as_object(), Some(&json!({"a": "a", "b": "b"})));
    assert_eq!(values[2].as_object(), Some(&json!({"a": "aa", "b": "b"})));
}

#[tokio::test]
async fn dify_preset_extracts_answer_path() {
    let parser = StreamParser::dify(ParserOptions::default());
    let texts = collect_texts(
        &parser,
        vec![Bytes::from_static(
            b"data:{\"answer\":\"Hello\"}\ndata:{\"answer\":\" there\"}\n",
        )],
    )
    .await;

    assert_eq!(texts, vec!["Hello".to_string(), "Hello there".to_string()]);
}

#[tokio::test]
async fn dify_app_preset_tracks_current_node() {
    let parser = StreamParser::dify_app(ParserOptions::default());
    let values = collect_values(&parser, dify_app_stream_data()).await;

    // The start node is skipped, so the first emission is still null;
    // afterwards each record carries the latest adopted value.
    assert_eq!(values[0].as_object(), Some(&json!(null)));
    assert_eq!(values[1].as_object(), Some(&json!("Reasoning")));
    assert_eq!(values[2].as_object(), Some(&json!("All done")));
}

#[tokio::test]
async fn dify_app_falsy_title_keeps_previous_current() {
    let parser = StreamParser::dify_app(ParserOptions::default());
    let values = collect_values(
        &parser,
        vec![
            Bytes::from_static(
                b"data:{\"event\":\"iteration_started\",\"data\":{\"title\":\"Loop\"}}\n",
            ),
            Bytes::from_static(b"data:{\"event\":\"iteration_next\",\"data\":{\"title\":\"\"}}\n"),
        ],
    )
    .await;

    assert_eq!(values[0].as_object(), Some(&json!("Loop")));
    assert_eq!(values[1].as_object(), Some(&json!("Loop")));
}

#[tokio::test]
async fn custom_parser_error_is_terminal_single_emission() {
    let options = ParserOptions::builder()
        .chunk_parser(|payload, _| {
            if payload.contains("poison") {
                Err(ParseError::parser("poison record"))
            } else {
                Ok(json!(payload))
            }
        })
        .build();
    let parser = StreamParser::new(options);

    let stream = parser.parse(byte_source(vec![
        Bytes::from_static(b"data:fine\n"),
        Bytes::from_static(b"data:poison\ndata:after\n"),
    ]));
    futures::pin_mut!(stream);

    assert!(stream.next().await.unwrap().is_ok());
    let err = stream.next().await.unwrap();
    assert!(matches!(err, Err(ParseError::Parser { .. })));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn swallowed_source_fault_ends_stream_without_error_item() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let swallowed = Arc::new(AtomicUsize::new(0));
    let seen = swallowed.clone();
    let parser = StreamParser::new(
        ParserOptions::builder()
            .on_swallowed(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let stream = parser.parse(failing_source(
        vec![Bytes::from_static(b"data:{\"content\":\"A\"}\n")],
        ParseError::source("connection reset"),
    ));
    futures::pin_mut!(stream);

    assert_eq!(
        stream.next().await.unwrap().unwrap().as_text(),
        Some("A")
    );
    // From the output alone this is indistinguishable from a clean end.
    assert!(stream.next().await.is_none());
    assert_eq!(swallowed.load(Ordering::SeqCst), 1);
}
