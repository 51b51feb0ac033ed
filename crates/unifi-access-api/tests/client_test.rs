// Integration tests for `AccessClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use unifi_access_api::{
    AccessClient, ClientConfig, DeviceType, Error, ErrorKind, ListParams, NewAccessPolicy,
    NewDoorGroup, NewNfcCard, NewUser, NewVisitor, VisitorUpdate,
};

const BASE: &str = "/api/v1/developer";

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> ClientConfig {
    ClientConfig::new("unused.invalid", "test-token".to_string())
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(5))
}

async fn setup_with(config: ClientConfig) -> (MockServer, AccessClient) {
    let server = MockServer::start().await;
    let client = AccessClient::with_base_url(&server.uri(), config).unwrap();
    (server, client)
}

async fn setup() -> (MockServer, AccessClient) {
    setup_with(config()).await
}

fn success(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": "SUCCESS",
        "msg": "success",
        "data": data
    }))
}

/// Respond with the request body wrapped in a success envelope, plus an id.
fn echo(id: &'static str) -> impl Fn(&Request) -> ResponseTemplate {
    move |req: &Request| {
        let mut data: Value = req.body_json().unwrap();
        data["id"] = json!(id);
        success(data)
    }
}

fn visitor_json(id: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "start_time": 1_700_000_000,
        "end_time": 1_700_086_400,
        "status": "UPCOMING"
    })
}

// ── Round trips ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_visitor_echo_round_trip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{BASE}/visitors")))
        .respond_with(echo("v-1"))
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let end = Utc.timestamp_opt(1_700_086_400, 0).unwrap();
    let new = NewVisitor::new("Ada", "Lovelace", start, end)
        .with_email("ada@example.com")
        .with_phone("+1 555 0100")
        .with_notes("badge at front desk")
        .with_door_group("g-lobby");

    let visitor = client.create_visitor(&new).await.unwrap();

    assert_eq!(visitor.id, "v-1");
    assert_eq!(visitor.first_name, "Ada");
    assert_eq!(visitor.email.as_deref(), Some("ada@example.com"));
    assert_eq!(visitor.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(visitor.notes.as_deref(), Some("badge at front desk"));
    assert_eq!(visitor.start_date, start);
    assert_eq!(visitor.end_date, end);
    assert_eq!(visitor.door_group_ids(), vec!["g-lobby"]);
}

#[tokio::test]
async fn test_update_visitor_sends_only_set_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(format!("{BASE}/visitors/v-1")))
        .and(body_json(json!({ "remarks": "rescheduled" })))
        .respond_with(success(visitor_json("v-1")))
        .expect(1)
        .mount(&server)
        .await;

    let update = VisitorUpdate {
        notes: Some("rescheduled".into()),
        ..VisitorUpdate::default()
    };
    let visitor = client.update_visitor("v-1", &update).await.unwrap();
    assert_eq!(visitor.id, "v-1");
}

#[tokio::test]
async fn test_create_resources_echo() {
    let (server, client) = setup().await;

    for (resource, id) in [
        ("access_policies", "p-1"),
        ("door_groups", "g-1"),
        ("users", "u-1"),
    ] {
        Mock::given(method("POST"))
            .and(path(format!("{BASE}/{resource}")))
            .respond_with(echo(id))
            .expect(1)
            .mount(&server)
            .await;
    }

    let policy = client
        .create_access_policy(
            &NewAccessPolicy::new("Staff")
                .with_door_group("g-1")
                .with_door("d-9"),
        )
        .await
        .unwrap();
    assert_eq!(policy.id, "p-1");
    assert_eq!(policy.name, "Staff");
    assert_eq!(policy.door_group_ids(), ["g-1"]);
    assert_eq!(policy.door_ids(), ["d-9"]);

    let group = client
        .create_door_group(&NewDoorGroup::new("Lobby").with_door("d-1"))
        .await
        .unwrap();
    assert_eq!(group.id, "g-1");
    assert_eq!(group.name, "Lobby");
    assert_eq!(group.door_ids(), ["d-1"]);

    let user = client
        .create_user(&NewUser::new("Fela", "Kuti").with_email("fela@example.com"))
        .await
        .unwrap();
    assert_eq!(user.id, "u-1");
    assert_eq!(user.email.as_deref(), Some("fela@example.com"));
}

#[tokio::test]
async fn test_list_visitors_passes_pagination_and_bearer() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/visitors")))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(success(json!([visitor_json("v-1"), visitor_json("v-2")])))
        .expect(1)
        .mount(&server)
        .await;

    let visitors = client.list_visitors(ListParams::new(10, 20)).await.unwrap();

    let ids: Vec<_> = visitors.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["v-1", "v-2"]);
}

#[tokio::test]
async fn test_list_visitors_tolerates_missing_times() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/visitors")))
        .respond_with(success(json!([
            visitor_json("v-1"),
            { "id": "v-2", "first_name": "Grace", "last_name": "Hopper" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let visitors = client.list_visitors(ListParams::default()).await.unwrap();

    assert_eq!(visitors.len(), 2);
    assert_eq!(
        visitors[0].start_date,
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    );
    assert!(visitors[1].start_date >= before);
    assert!(visitors[1].end_date >= before);
}

#[tokio::test]
async fn test_envelope_with_both_msg_and_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors/d-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "SUCCESS",
            "msg": "success",
            "message": "ok",
            "data": { "id": "d-1", "name": "Main" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let door = client.get_door("d-1").await.unwrap();
    assert_eq!(door.name, "Main");
}

#[tokio::test]
async fn test_get_door_reads_lock_state() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors/d-1")))
        .respond_with(success(json!({
            "id": "d-1",
            "name": "Main Entrance",
            "full_name": "HQ - 1F - Main Entrance",
            "door_lock_relay_status": "lock",
            "door_position_status": "open",
            "is_bind_hub": true
        })))
        .mount(&server)
        .await;

    let door = client.get_door("d-1").await.unwrap();
    assert!(door.is_locked());
    assert!(door.is_online());
    assert_eq!(door.location(), "HQ - 1F - Main Entrance");
}

#[tokio::test]
async fn test_list_devices_flattens_hub_groups() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/devices")))
        .respond_with(success(json!([
            [
                { "id": "hub-1", "name": "UA-HUB", "type": "UAH" },
                { "id": "rdr-1", "name": "Reader", "alias": "Front Reader", "type": "UA-G2-PRO" }
            ],
            [
                { "id": "cam-1", "name": "Doorbell", "type": "CAMERA" }
            ]
        ])))
        .mount(&server)
        .await;

    let devices = client.list_devices(ListParams::default()).await.unwrap();

    let kinds: Vec<_> = devices.iter().map(|d| d.device_type()).collect();
    assert_eq!(
        kinds,
        [DeviceType::AccessHub, DeviceType::DoorReader, DeviceType::Camera]
    );
    assert_eq!(devices[1].display_name(), "Front Reader");
}

#[tokio::test]
async fn test_set_visitor_pin_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(format!("{BASE}/visitors/v-1/pin_codes")))
        .and(body_json(json!({ "pin_code": "482910" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "SUCCESS",
            "msg": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_visitor_pin("v-1", "482910").await.unwrap();
}

#[tokio::test]
async fn test_add_visitor_nfc_card() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{BASE}/visitors/v-1/nfc-cards")))
        .and(body_json(json!({ "card_number": "04A2B3C4", "facility_code": "12" })))
        .respond_with(echo("card-1"))
        .expect(1)
        .mount(&server)
        .await;

    let card = client
        .add_visitor_nfc_card("v-1", &NewNfcCard::new("04A2B3C4").with_facility_code("12"))
        .await
        .unwrap();
    assert_eq!(card.id, "card-1");
    assert_eq!(card.card_number, "04A2B3C4");
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_401_is_authentication_and_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "CODE_UNAUTHORIZED",
            "msg": "invalid token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_doors(ListParams::default()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("invalid token"));
}

#[tokio::test]
async fn test_403_with_permission_code() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/users")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "CODE_PERMISSION_DENIED",
            "msg": "token lacks view:user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_users(ListParams::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(err.api_error_code(), Some("CODE_PERMISSION_DENIED"));
}

#[tokio::test]
async fn test_delete_missing_visitor_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{BASE}/visitors/ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "CODE_RESOURCE_NOT_FOUND",
            "msg": "visitor not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.delete_visitor("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Resource not found: visitor not found");
}

#[tokio::test]
async fn test_delete_visitor_success() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{BASE}/visitors/v-1")))
        .respond_with(success(Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_visitor("v-1").await.unwrap();
}

#[tokio::test]
async fn test_400_is_validation_with_details() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/access_policies/bad")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "CODE_PARAMS_INVALID",
            "msg": "malformed id"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_access_policy("bad").await.unwrap_err();
    match err {
        Error::Validation {
            status, details, ..
        } => {
            assert_eq!(status, Some(400));
            assert_eq!(details.unwrap()["code"], "CODE_PARAMS_INVALID");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_code_in_200_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/door_groups/g-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "CODE_NOT_EXISTS",
            "msg": "door group does not exist",
            "data": null
        })))
        .mount(&server)
        .await;

    let err = client.get_door_group("g-1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_auth_code_in_200_envelope_keeps_real_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/users/u-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "CODE_AUTH_FAILED",
            "msg": "token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_user("u-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_429_is_rate_limited_and_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/devices/dev-1")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_device("dev-1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_secs: Some(30),
            ..
        }
    ));
}

// ── Retry ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_503s_then_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/visitors/v-1")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/visitors/v-1")))
        .respond_with(success(visitor_json("v-1")))
        .expect(1)
        .mount(&server)
        .await;

    let visitor = client.get_visitor("v-1").await.unwrap();
    assert_eq!(visitor.id, "v-1");
}

#[tokio::test]
async fn test_persistent_503_gives_up_after_three_attempts() {
    let (server, client) = setup_with(config().with_max_retries(2)).await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client.list_doors(ListParams::default()).await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_timeout_is_retried_then_surfaces() {
    let config = config()
        .with_max_retries(1)
        .with_timeout(Duration::from_millis(200));
    let (server, client) = setup_with(config).await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors/d-1")))
        .respond_with(
            success(json!({ "id": "d-1", "name": "Main" })).set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let err = client.get_door("d-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(matches!(
        err,
        Error::Timeout { timeout } if timeout == Duration::from_millis(200)
    ));
    assert_eq!(err.to_string(), "Request timed out after 200ms");
}

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    let client = AccessClient::with_base_url("http://127.0.0.1:1", config().with_max_retries(1))
        .unwrap();

    let err = client.get_visitor("v-1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(matches!(err, Error::Connection(_)));
}

#[tokio::test]
async fn test_abandoned_call_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/visitors/v-1")))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let outcome =
        tokio::time::timeout(Duration::from_millis(50), client.get_visitor("v-1")).await;
    assert!(outcome.is_err(), "call should have been abandoned");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ── Local validation ────────────────────────────────────────────────

#[tokio::test]
async fn test_inverted_visit_window_sends_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(success(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let start = Utc.timestamp_opt(1_700_086_400, 0).unwrap();
    let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let err = client
        .create_visitor(&NewVisitor::new("Ada", "Lovelace", start, end))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.status(), None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_input_never_reaches_server() {
    let (server, client) = setup().await;

    let pin = client.set_visitor_pin("v-1", "12").await.unwrap_err();
    let id = client.get_visitor("").await.unwrap_err();
    let update = client
        .update_visitor("v-1", &VisitorUpdate::default())
        .await
        .unwrap_err();
    let card = client
        .add_visitor_nfc_card("v-1", &NewNfcCard::new(""))
        .await
        .unwrap_err();

    for err in [pin, id, update, card] {
        assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_calls_after_close_fail_with_closed() {
    let (server, client) = setup().await;

    client.close();
    let err = client.list_visitors(ListParams::default()).await.unwrap_err();

    assert!(matches!(err, Error::Closed));
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!err.is_transient());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{BASE}/doors/d-1")))
        .respond_with(success(json!({ "id": "d-1", "name": "Main" })))
        .expect(8)
        .mount(&server)
        .await;

    let client = std::sync::Arc::new(client);
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = std::sync::Arc::clone(&client);
        tasks.push(tokio::spawn(async move { client.get_door("d-1").await }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().name, "Main");
    }
}
