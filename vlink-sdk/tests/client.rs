//! Client tests against a scripted mock vehicle server.

use serde_json::{Value, json};
use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use vlink_sdk::prelude::*;

/// One request observed by the mock vehicle.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}
impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A minimal scripted HTTP server standing in for the vehicle.
///
/// Every response carries `Connection: close`, so the client opens a fresh
/// connection per request and the accept loop stays trivially sequential.
struct Vehicle {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}
impl Vehicle {
    fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, Value) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };
                let (status, body) = handler(&request);
                log.lock().unwrap().push(request);
                respond(&mut stream, status, &body);
            }
        });
        Self { url, requests }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        let (name, value) = header.split_once(':')?;
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().ok()?;
        }
        headers.push((name.to_string(), value));
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).ok()?;
        serde_json::from_slice(&buf).ok()
    } else {
        None
    };
    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: u16, body: &Value) {
    let reason = match status {
        200 => "OK",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let body = body.to_string();
    let _ = stream.write_all(
        format!(
            "HTTP/1.1 {status} {reason}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
        .as_bytes(),
    );
}

fn pilot_auth() -> Value {
    json!({"data": {"accessLevel": "PILOT", "accessToken": "tok1"}})
}

fn fast_policy() -> PollPolicy {
    PollPolicy::default()
        .with_interval(Duration::from_millis(10))
        .with_deadline(Duration::from_secs(5))
}

#[test]
fn authenticate_stores_token_and_level() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        _ => (200, json!({"data": {}})),
    });
    let client = Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap();
    assert_eq!(client.session().access_token.as_deref(), Some("tok1"));
    assert_eq!(client.session().access_level, AccessLevel::Pilot);

    let requests = vehicle.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["requested_level"], json!(8));
    assert_eq!(body["commandeer"], json!(true));
    assert!(!body["client_id"].as_str().unwrap().is_empty());
    assert!(requests[0].header("Authorization").is_none());
}

#[test]
fn refused_pilot_fails_before_any_further_request() {
    let vehicle = Vehicle::spawn(|_| (200, json!({"data": {"accessLevel": "PHONE"}})));
    let err = Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap_err();
    assert!(matches!(
        err,
        ClientError::PilotRequired {
            granted: AccessLevel::Phone
        }
    ));
    assert_eq!(vehicle.requests().len(), 1);
}

#[test]
fn bearer_header_attached_iff_token_set() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        _ => (200, json!({"data": {}})),
    });
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();
    client.request_json("status", Some(&json!({}))).unwrap();
    client.request_json::<()>("channel/SUBJECT_CAMERA_RIG_NATIVE", None).unwrap();

    let requests = vehicle.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].header("Authorization").is_none());
    assert_eq!(requests[1].header("Authorization"), Some("Bearer tok1"));
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[2].header("Authorization"), Some("Bearer tok1"));
    assert_eq!(requests[2].method, "GET");
    for request in &requests {
        assert_eq!(request.header("Accept"), Some("application/json"));
    }
}

#[test]
fn missing_data_envelope_is_an_api_error() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        _ => (200, json!({"error": "no can do"})),
    });
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();
    let err = client.update_pilot_status().unwrap_err();
    assert!(matches!(err, ClientError::Api { message } if message == "no can do"));
}

#[test]
fn http_500_is_a_status_error_and_comms_wraps_it() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        _ => (500, json!({"error": "boom"})),
    });
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();

    let err = client.request_json("status", Some(&json!({}))).unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, .. }));

    let err = client
        .send_custom_comms("samples.com_link.ComLink", b"ping", false)
        .unwrap_err();
    assert!(matches!(
        err,
        CommsError::Request(ClientError::Status { status: 500, .. })
    ));
}

#[test]
fn custom_comms_round_trips_base64() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/api/custom_comms" => {
            // Echo the payload back, the way a loopback skill would.
            let echoed = req.body.as_ref().unwrap()["data"].clone();
            (200, json!({"data": {"data": echoed, "echo": true}}))
        }
        _ => (200, json!({"data": {}})),
    });
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();

    let payload: Vec<u8> = (0..=255).collect();
    let reply = client
        .send_custom_comms("samples.com_link.ComLink", &payload, false)
        .unwrap()
        .unwrap();
    assert_eq!(reply.data.as_deref(), Some(&payload[..]));
    assert_eq!(reply.meta["echo"], json!(true));

    let sent = &vehicle.requests()[1];
    let body = sent.body.as_ref().unwrap();
    assert_eq!(body["skill_key"], json!("samples.com_link.ComLink"));
    assert_eq!(body["no_response"], json!(false));
}

#[test]
fn takeoff_without_pilot_issues_zero_requests() {
    let vehicle = Vehicle::spawn(|_| (200, json!({"data": {"accessLevel": "PHONE"}})));
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();
    let err = client.takeoff(&fast_policy(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ClientError::PilotRequired { .. }));
    // Only the authentication handshake reached the vehicle.
    assert_eq!(vehicle.requests().len(), 1);
}

#[test]
fn takeoff_commands_once_and_returns_on_flying() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let vehicle = Vehicle::spawn(move |req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/api/status" => {
            let phase = match counter.fetch_add(1, Ordering::SeqCst) {
                // The first poll happens before the takeoff loop starts.
                0 => json!(null),
                1 | 2 => json!("READY_FOR_GROUND_TAKEOFF"),
                _ => json!("FLYING"),
            };
            (200, json!({"data": {"sessionId": "s1", "flightPhase": phase}}))
        }
        _ => (200, json!({"data": {}})),
    });
    let mut client =
        Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap();
    client.takeoff(&fast_policy(), &CancelToken::new()).unwrap();

    let requests = vehicle.requests();
    let takeoffs: Vec<_> = requests
        .iter()
        .filter(|r| r.path == "/api/async_command")
        .collect();
    assert_eq!(takeoffs.len(), 1);
    assert_eq!(
        takeoffs[0].body.as_ref().unwrap()["command"],
        json!("ground_takeoff")
    );
    // Initial refresh plus three loop polls: READY, READY, FLYING.
    assert_eq!(polls.load(Ordering::SeqCst), 4);
    let overrides: Vec<_> = requests
        .iter()
        .filter(|r| r.path.starts_with("/api/set_fault_override/"))
        .collect();
    assert_eq!(overrides.len(), 2);
}

#[test]
fn land_repeats_until_not_flying() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let vehicle = Vehicle::spawn(move |req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/api/status" => {
            let phase = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => json!("FLYING"),
                _ => json!("POST_FLIGHT"),
            };
            (200, json!({"data": {"sessionId": "s1", "flightPhase": phase}}))
        }
        _ => (200, json!({"data": {}})),
    });
    let mut client =
        Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap();
    client.land(&fast_policy(), &CancelToken::new()).unwrap();

    let lands = vehicle
        .requests()
        .iter()
        .filter(|r| {
            r.path == "/api/async_command"
                && r.body.as_ref().unwrap()["command"] == json!("land")
        })
        .count();
    assert_eq!(lands, 2);
}

#[test]
fn takeoff_deadline_is_enforced() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/api/status" => (
            200,
            json!({"data": {"sessionId": "s1", "flightPhase": "READY_FOR_GROUND_TAKEOFF"}}),
        ),
        _ => (200, json!({"data": {}})),
    });
    let mut client =
        Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap();
    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(10))
        .with_deadline(Duration::from_millis(100));
    let err = client.takeoff(&policy, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ClientError::DeadlineExceeded));
}

#[test]
fn cancellation_ends_the_takeoff_loop() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        _ => (200, json!({"data": {"sessionId": "s1"}})),
    });
    let mut client =
        Client::connect(&vehicle.url, ConnectOptions::default().pilot(true)).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = client.takeoff(&fast_policy(), &cancel).unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

#[test]
fn session_id_is_stored_and_resent() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/api/status" => (200, json!({"data": {"sessionId": "s1"}})),
        _ => (200, json!({"data": {}})),
    });
    let mut client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();

    let first = client.update_pilot_status().unwrap();
    assert_eq!(first.session_id.as_deref(), Some("s1"));
    client.update_pilot_status().unwrap();

    let requests = vehicle.requests();
    assert!(requests[1].body.as_ref().unwrap().get("sessionId").is_none());
    assert_eq!(
        requests[2].body.as_ref().unwrap()["sessionId"],
        json!("s1")
    );
}

#[test]
fn fetch_shm_returns_raw_bytes() {
    let vehicle = Vehicle::spawn(|req| match req.path.as_str() {
        "/api/authentication" => (200, pilot_auth()),
        "/shm/camera/frame0" => (200, json!("raw")),
        _ => (200, json!({"data": {}})),
    });
    let client = Client::connect(&vehicle.url, ConnectOptions::default()).unwrap();
    let bytes = client.fetch_shm("/camera/frame0").unwrap();
    assert_eq!(bytes, b"\"raw\"");
    assert_eq!(vehicle.requests()[1].path, "/shm/camera/frame0");
}
