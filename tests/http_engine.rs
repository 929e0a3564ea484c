//! Engine tests against a mock media server over real HTTP.

use ams_ctl::batch::{prepare_payloads, BatchExecutor, ItemReport, Lifecycle};
use ams_ctl::desired::{read_csv, StreamKind};
use ams_ctl::diagnostics::stream_detail;
use ams_ctl::identity::derive_stream_id;
use ams_ctl::inventory::fetch_all;
use ams_ctl::{reconcile, Error, HttpTransport, IdGenerator, ServerProfile};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::with_client(reqwest::Client::new(), &server.uri())
}

fn profile(server: &MockServer) -> ServerProfile {
    ServerProfile {
        name: "mock".to_string(),
        api_url: server.uri(),
        origin_ip: "10.0.0.9".to_string(),
        streams_csv: None,
    }
}

fn streams(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({"streamId": id, "name": id, "status": "created"}))
            .collect(),
    )
}

#[tokio::test]
async fn pagination_walks_until_short_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/list/0/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams(&["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/list/2/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams(&["c"])))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = fetch_all(&transport(&server), 2).await.unwrap();
    let ids: Vec<&str> = inventory.iter().map(|s| s.stream_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn pagination_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/list/0/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams(&["a", "b"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/list/2/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = fetch_all(&transport(&server), 2).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
}

#[tokio::test]
async fn create_only_missing_streams() {
    let server = MockServer::start().await;
    let existing = derive_stream_id("camA").unwrap();
    let missing = derive_stream_id("camB").unwrap();

    Mock::given(method("GET"))
        .and(path("/broadcasts/list/0/1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams(&[existing.as_str()])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/broadcasts/create"))
        .and(query_param("autoStart", "true"))
        .and(body_partial_json(json!({
            "streamId": missing,
            "name": "camB",
            "type": "streamSource",
            "streamUrl": "rtsp://u:p@192.168.1.5/cam/realmonitor?channel=1&subtype=0&unicast=true&proto=Onvif",
            "originAdress": "10.0.0.9",
            "webRTCViewerLimit": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"streamId": missing})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server);
    let csv = "code,stream_ip,stream_username,stream_password\n\
               camA,192.168.1.4,u,p\n\
               camB,192.168.1.5,u,p\n";
    let desired = read_csv(csv.as_bytes(), &profile(&server)).unwrap();

    let inventory = fetch_all(&transport, 1000).await.unwrap();
    let plan = reconcile(desired, &inventory, &IdGenerator::default()).unwrap();
    assert_eq!(plan.to_skip, [existing]);

    let payloads = prepare_payloads(&plan.to_create, StreamKind::StreamSource).unwrap();
    let outcome = BatchExecutor::new(&transport)
        .create(&payloads, &mut |_| {})
        .await;
    assert_eq!((outcome.attempted, outcome.succeeded, outcome.failed), (1, 1, 0));
}

#[tokio::test]
async fn stop_continues_after_http_error() {
    let server = MockServer::start().await;
    for id in ["s1", "s2", "s4", "s5"] {
        Mock::given(method("POST"))
            .and(path(format!("/broadcasts/{}/stop", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/broadcasts/s3/stop"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let targets: Vec<String> = (1..=5).map(|i| format!("s{}", i)).collect();
    let mut order = Vec::new();
    let outcome = BatchExecutor::new(&transport(&server))
        .apply(Lifecycle::Stop, &targets, &mut |r: &ItemReport| {
            order.push(r.stream_id.clone())
        })
        .await;

    assert_eq!(order, targets);
    assert_eq!((outcome.attempted, outcome.succeeded, outcome.failed), (5, 4, 1));
    assert_eq!(outcome.failures[0].stream_id, "s3");
    assert_eq!(outcome.failures[0].reason, "HTTP 500");
}

#[tokio::test]
async fn unreachable_server_fails_each_item() {
    // Nothing listens on the discard port.
    let transport = HttpTransport::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
    let targets = vec!["x".to_string(), "y".to_string()];
    let outcome = BatchExecutor::new(&transport)
        .apply(Lifecycle::Start, &targets, &mut |_| {})
        .await;
    assert_eq!((outcome.attempted, outcome.failed), (2, 2));
}

#[tokio::test]
async fn stream_detail_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/cam1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"streamId": "cam1", "name": "cam", "type": "streamSource"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/cam1/broadcast-statistics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"totalDASHWatchersCount": 2})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broadcasts/cam1/ip-camera-error"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let transport = transport(&server);
    let detail = stream_detail(&transport, "cam1").await.unwrap().unwrap();
    assert_eq!(detail.statistics.unwrap().dash, 2);
    assert_eq!(
        detail.camera_health,
        Some(ams_ctl::classify::CameraHealth::Healthy)
    );

    assert!(stream_detail(&transport, "missing").await.unwrap().is_none());
}
