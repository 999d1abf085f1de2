// Drives a live control server over loopback

use speaker_control::{ControlConfig, ControlServer, ControlState};
use speaker_engine::{NowPlaying, ParamId, ParameterStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn start() -> (ControlServer, ControlState, String) {
    let state = ControlState::new(Arc::new(ParameterStore::new()), Arc::new(NowPlaying::new()));
    let cfg = ControlConfig {
        listen: "127.0.0.1:0".to_string(),
        ..Default::default()
    };
    let server = ControlServer::start(cfg, state.clone()).expect("bind loopback");
    let addr = server.local_addr().expect("ip listener");
    (server, state, format!("http://{addr}"))
}

fn status_of(result: Result<ureq::Response, ureq::Error>) -> u16 {
    match result {
        Ok(r) => r.status(),
        Err(ureq::Error::Status(code, _)) => code,
        Err(e) => panic!("transport error: {e}"),
    }
}

#[test]
fn health_and_cors() {
    let (mut server, _state, base) = start();
    let resp = ureq::get(&format!("{base}/health")).call().unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("http://localhost:5173"));
    assert_eq!(resp.into_string().unwrap(), "ok\n");

    let preflight = ureq::request("OPTIONS", &format!("{base}/state")).call();
    assert_eq!(status_of(preflight), 204);
    server.stop();
}

#[test]
fn patch_then_read_state() {
    let (mut server, state, base) = start();

    let r = ureq::request("PATCH", &format!("{base}/state?reverb_delay_ms=250&reverb_feedback=2&eq_mid_db=-3"))
        .call();
    assert_eq!(status_of(r), 200);
    assert_eq!(state.params.get(ParamId::ReverbDelayMs), 250.0);
    assert_eq!(state.params.get(ParamId::ReverbFeedback), 1.0);
    assert_eq!(state.params.get(ParamId::EqMidDb), -3.0);

    let body = ureq::get(&format!("{base}/state")).call().unwrap().into_string().unwrap();
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["reverb_delay_ms"].as_f64(), Some(250.0));
    assert_eq!(v["now_playing"], "");
    server.stop();
}

#[test]
fn rejected_requests_do_not_mutate() {
    let (mut server, state, base) = start();

    assert_eq!(status_of(ureq::post(&format!("{base}/gain?db=abc")).call()), 400);
    assert_eq!(status_of(ureq::post(&format!("{base}/gain")).call()), 400);
    assert_eq!(status_of(ureq::request("PATCH", &format!("{base}/state?gain_db=1&reverb_dry=x")).call()), 400);
    assert_eq!(status_of(ureq::get(&format!("{base}/missing")).call()), 404);
    assert_eq!(state.params.get(ParamId::GainDb), 0.0);
    assert_eq!(state.params.get(ParamId::ReverbDry), 0.8);

    assert_eq!(status_of(ureq::post(&format!("{base}/gain?db=-12.5")).call()), 200);
    assert_eq!(state.params.get(ParamId::GainDb), -12.5);
    server.stop();
}

#[test]
fn now_playing_json_body() {
    let (mut server, state, base) = start();
    let r = ureq::post(&format!("{base}/now_playing"))
        .set("Content-Type", "application/json")
        .send_string(r#"{"name":"Kraftwerk - Computerwelt"}"#);
    assert_eq!(status_of(r), 200);
    assert_eq!(state.now_playing.get(), "Kraftwerk - Computerwelt");
    server.stop();
}

#[test]
fn stop_is_deterministic() {
    let (mut server, _state, base) = start();
    assert_eq!(status_of(ureq::get(&format!("{base}/health")).call()), 200);

    let t = Instant::now();
    server.stop();
    assert!(t.elapsed() < Duration::from_secs(2));
    // Second stop is a no-op.
    server.stop();
}
