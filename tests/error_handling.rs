//! Sad path tests for error handling and edge cases.
//!
//! Tests transport failures, malformed responses, invalid options and
//! events arriving after disposal.

mod common;

use common::{remote, TestEnv};
use std::fs;
use std::time::Instant;
use suggestions::transport::decode_response;
use suggestions::{
    ConfigError, Options, OptionsPatch, Params, Resolution, ResponseOutcome, SuggestError,
    TransportError, Width,
};
use tempfile::TempDir;

fn requested(env: &mut TestEnv, text: &str) -> suggestions::RequestToken {
    match env.type_text(text) {
        Resolution::Requested(token) => token,
        other => panic!("expected a lookup for {text:?}, got {other:?}"),
    }
}

// ============================================================================
// Transport Failure Tests
// ============================================================================

#[test]
fn test_failed_lookup_shows_nothing() {
    let mut env = TestEnv::new(remote());
    let token = requested(&mut env, "Jam");
    env.respond(token, &["Jamaica", "Jamestown"]);
    let next = requested(&mut env, "Jame");

    let outcome = env
        .engine
        .on_response(next, Err(TransportError::Network("connection reset".into())));
    assert_eq!(outcome, ResponseOutcome::Failed);
    assert!(!env.engine.is_visible());
    assert!(!env.screen().visible);
}

#[test]
fn test_failed_lookup_is_not_cached() {
    let mut env = TestEnv::new(remote());
    let token = requested(&mut env, "Jam");
    env.engine
        .on_response(token, Err(TransportError::Status { code: 503 }));
    assert!(env.engine.cache().is_empty());

    env.type_text("Ja");
    requested(&mut env, "Jam");
}

#[test]
fn test_failed_lookup_is_not_a_bad_query() {
    let mut env = TestEnv::new(remote());
    let token = requested(&mut env, "Jam");
    env.engine
        .on_response(token, Err(TransportError::Timeout { millis: 300 }));
    assert!(env.engine.bad_queries().is_empty());

    // A longer query must still be looked up.
    requested(&mut env, "Jama");
}

#[test]
fn test_stale_failure_is_ignored() {
    let mut env = TestEnv::new(remote());
    let first = requested(&mut env, "Ja");
    let second = requested(&mut env, "Jam");
    env.respond(second, &["Jamaica", "Jamestown"]);

    let outcome = env
        .engine
        .on_response(first, Err(TransportError::Cancelled));
    assert_eq!(outcome, ResponseOutcome::Stale);
    assert!(env.engine.is_visible());
}

#[test]
fn test_unknown_token_is_stale() {
    let mut env = TestEnv::new(remote());
    let outcome = env.respond(suggestions::RequestToken::new(42), &["Jamaica"]);
    assert_eq!(outcome, ResponseOutcome::Stale);
    assert!(env.screen().frames.is_empty());
}

#[test]
fn test_duplicate_response_applied_once() {
    let mut env = TestEnv::new(remote());
    let token = requested(&mut env, "Jam");
    assert_eq!(
        env.respond(token, &["Jamaica", "Jamestown"]),
        ResponseOutcome::Applied { count: 2 }
    );
    assert_eq!(env.respond(token, &["Other"]), ResponseOutcome::Stale);
    assert_eq!(env.screen().frames.len(), 1);
}

// ============================================================================
// Response Decoding Tests
// ============================================================================

#[test]
fn test_decode_response_normalizes_entries() {
    let results =
        decode_response(r#"{"suggestions": ["Jamaica", {"value": "Japan", "data": "JP"}, null]}"#)
            .unwrap();
    let values: Vec<_> = results.iter().map(|s| s.value.as_str()).collect();
    assert_eq!(values, vec!["Jamaica", "Japan"]);
}

#[test]
fn test_decode_response_missing_list_is_empty() {
    assert!(decode_response("{}").unwrap().is_empty());
}

#[test]
fn test_decode_response_rejects_garbage() {
    let err = decode_response("<html>502 Bad Gateway</html>").unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
    assert_eq!(err.code(), "DECODE_ERROR");
}

#[test]
fn test_decode_error_feeds_engine_as_failure() {
    let mut env = TestEnv::new(remote());
    let token = requested(&mut env, "Jam");
    let result = decode_response("not json");
    assert_eq!(env.engine.on_response(token, result), ResponseOutcome::Failed);
    assert!(env.engine.cache().is_empty());
}

// ============================================================================
// Invalid Options Tests
// ============================================================================

#[test]
fn test_malformed_options_json() {
    let err = Options::from_json("{ minChars: 2 ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert_eq!(err.code(), "OPTIONS_PARSE_ERROR");
}

#[test]
fn test_wrong_option_type() {
    let err = Options::from_json(r#"{"minChars": "two"}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_empty_param_name_rejected() {
    let err = Options::from_json(r#"{"paramName": "  "}"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "paramName",
            ..
        }
    ));
}

#[test]
fn test_non_positive_fixed_width_rejected() {
    let err = Options::from_json(r#"{"width": 0}"#).unwrap_err();
    assert_eq!(err.code(), "INVALID_OPTION");

    let mut env = TestEnv::new(Options::local(["Jamaica", "Jamestown"]));
    let patch = OptionsPatch {
        width: Some(Width::Fixed(-40.0)),
        ..OptionsPatch::default()
    };
    let err = env.engine.set_options(patch).unwrap_err();
    assert_eq!(err.code(), "INVALID_OPTION");

    env.type_text("Jam");
    assert!(env.screen().last_frame().unwrap().width > 0.0);
}

#[test]
fn test_engine_rejects_invalid_options() {
    let options = Options {
        cache_capacity: 0,
        ..remote()
    };
    let (transport, _wire) = common::ManualTransport::new();
    let (renderer, _screen) = common::RecordingRenderer::new();
    let result = suggestions::QueryEngine::new(options, transport, renderer);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_invalid_patch_keeps_engine_usable() {
    let mut env = TestEnv::new(remote());
    let err = env
        .engine
        .set_options(OptionsPatch::new().param_name(""))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OPTION");
    assert_eq!(env.engine.options().param_name, "query");

    requested(&mut env, "Jam");
    assert!(env.last_request().body.contains_key("query"));
}

#[test]
fn test_options_file_missing() {
    let dir = TempDir::new().unwrap();
    let err = Options::from_path(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert_eq!(err.code(), "OPTIONS_IO_ERROR");
}

#[test]
fn test_options_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.json");
    fs::write(
        &path,
        r#"{"serviceUrl": "/some/url", "minChars": 2, "params": {"country": "JM"}}"#,
    )
    .unwrap();

    let options = Options::from_path(&path).unwrap();
    assert_eq!(options.min_chars, 2);
    let mut env = TestEnv::new(options);
    assert_eq!(env.type_text("J"), Resolution::Cleared);
    requested(&mut env, "Ja");
    let mut expected = Params::new();
    expected.insert("country".into(), "JM".into());
    assert_eq!(env.last_request().params, expected);
}

// ============================================================================
// Disposal Tests
// ============================================================================

#[test]
fn test_events_after_dispose_are_ignored() {
    let mut env = TestEnv::new(Options::local(["Jamaica", "Jamestown"]));
    env.engine.dispose();
    let frames = env.screen().frames.len();

    assert_eq!(
        env.engine.on_input_changed("Jam", Instant::now()),
        Resolution::Disposed
    );
    assert_eq!(env.engine.on_timer(Instant::now()), None);
    assert!(!env.engine.select(0));
    assert!(!env.engine.hover(0));
    env.engine.dismiss();
    assert_eq!(env.screen().frames.len(), frames);
}

#[test]
fn test_set_options_after_dispose() {
    let mut env = TestEnv::new(remote());
    env.engine.dispose();
    let err = env
        .engine
        .set_options(OptionsPatch::new().min_chars(3))
        .unwrap_err();
    assert!(matches!(err, SuggestError::Disposed));
    assert_eq!(err.code(), "DISPOSED");
}

#[test]
fn test_dispose_is_idempotent() {
    let mut env = TestEnv::new(remote());
    env.engine.dispose();
    let hides = env.screen().hide_calls;
    env.engine.dispose();
    assert_eq!(env.screen().hide_calls, hides);
}
