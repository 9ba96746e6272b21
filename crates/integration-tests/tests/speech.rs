mod harness;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use harness::config::ConfigBuilder;
use harness::mock_engine::MockEngine;
use harness::server::TestServer;
use serde_json::json;

fn reference_b64() -> String {
    BASE64.encode(b"RIFFfake-reference-audio")
}

#[tokio::test]
async fn synchronous_synthesis_round_trip() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({
            "reference_audio": reference_b64(),
            "reference_text": "some reference words",
            "input": "hello from murmur",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["sample_rate"], engine.sample_rate());
    assert!(body["duration_secs"].as_f64().unwrap() > 0.0);

    // The audio field is a base64 WAV container
    let wav = BASE64.decode(body["audio"].as_str().unwrap()).unwrap();
    assert_eq!(&wav[..4], b"RIFF");

    let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
    assert_eq!(reader.spec().sample_rate, engine.sample_rate());
    assert_eq!(reader.spec().channels, 1);

    assert_eq!(engine.request_count(), 1);
}

#[tokio::test]
async fn missing_reference_is_bad_request() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({ "input": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn both_reference_forms_rejected() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({
            "reference_audio": reference_b64(),
            "reference_url": "http://example.com/ref.wav",
            "input": "hello",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn invalid_base64_reference_rejected() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({ "reference_audio": "!!not-base64!!", "input": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn empty_input_rejected() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({ "reference_audio": reference_b64(), "input": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn out_of_range_speed_rejected() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({ "reference_audio": reference_b64(), "input": "hi", "speed": 5.0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn oversized_reference_is_payload_too_large() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url())
        .with_max_reference_bytes(16)
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({
            "reference_audio": BASE64.encode(vec![0u8; 64]),
            "input": "hello",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn engine_failure_maps_to_bad_gateway() {
    let engine = MockEngine::start_failing(1).await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .json(&json!({ "reference_audio": reference_b64(), "input": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "engine_error");
}

#[tokio::test]
async fn wrong_content_type_rejected() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _spool) = ConfigBuilder::new(&engine.base_url()).build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/audio/speech"))
        .header("content-type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 415);
}
