use std::{
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::Value;
use time::macros::datetime;
use tokio::net::TcpListener;

use matching_config::{Notification, NotificationCircuitBreaker, NotificationRetry};
use matching_domain::{NotificationRequest, NotificationType};
use matching_notify::{HttpNotificationSink, SinkError};

#[derive(Clone)]
struct Server {
	status: StatusCode,
	delay: Duration,
	bodies: Arc<Mutex<Vec<Value>>>,
}

async fn receive(State(server): State<Server>, Json(body): Json<Value>) -> StatusCode {
	server.bodies.lock().unwrap_or_else(|err| err.into_inner()).push(body);

	tokio::time::sleep(server.delay).await;

	server.status
}

async fn spawn_server(server: Server) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");
	let app = Router::new().route("/notifications", post(receive)).with_state(server);

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	addr
}

fn sink_for(base: String, timeout_ms: u64) -> HttpNotificationSink {
	let cfg = Notification {
		service_url: base,
		timeout_ms,
		retry: NotificationRetry::default(),
		circuit_breaker: NotificationCircuitBreaker::default(),
	};

	HttpNotificationSink::new(&cfg).expect("Failed to build sink.")
}

fn request() -> NotificationRequest {
	NotificationRequest::new(
		5,
		"match success! 2 users matched",
		NotificationType::MatchSuccess,
		datetime!(2025-06-01 12:00:00 UTC),
	)
}

fn server(status: StatusCode, delay: Duration) -> Server {
	Server { status, delay, bodies: Arc::new(Mutex::new(Vec::new())) }
}

#[tokio::test]
async fn posts_the_request_body_and_accepts_2xx() {
	let server = server(StatusCode::ACCEPTED, Duration::ZERO);
	let bodies = server.bodies.clone();
	let addr = spawn_server(server).await;
	let sink = sink_for(format!("http://{addr}/"), 2_000);
	let request = request();

	sink.send(&request).await.expect("Expected delivery to succeed.");

	assert_eq!(sink.endpoint(), format!("http://{addr}/notifications"));

	let bodies = bodies.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(bodies.len(), 1);
	assert_eq!(bodies[0]["memberId"], 5);
	assert_eq!(bodies[0]["uuid"], request.uuid().to_string());
	assert_eq!(bodies[0]["retryCount"], 0);
}

#[tokio::test]
async fn non_success_statuses_are_reported() {
	let addr = spawn_server(server(StatusCode::SERVICE_UNAVAILABLE, Duration::ZERO)).await;
	let sink = sink_for(format!("http://{addr}"), 2_000);
	let err = sink.send(&request()).await.expect_err("Expected delivery to fail.");

	assert_eq!(err, SinkError::Status(503));
	assert!(err.is_retryable());

	let addr = spawn_server(server(StatusCode::BAD_REQUEST, Duration::ZERO)).await;
	let sink = sink_for(format!("http://{addr}"), 2_000);
	let err = sink.send(&request()).await.expect_err("Expected delivery to fail.");

	assert_eq!(err, SinkError::Status(400));
	assert!(!err.is_retryable());
}

#[tokio::test]
async fn slow_responses_time_out() {
	let addr = spawn_server(server(StatusCode::OK, Duration::from_millis(500))).await;
	let sink = sink_for(format!("http://{addr}"), 50);
	let err = sink.send(&request()).await.expect_err("Expected timeout.");

	assert_eq!(err, SinkError::Timeout);
}

#[tokio::test]
async fn refused_connections_are_retryable() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");

	drop(listener);

	let sink = sink_for(format!("http://{addr}"), 2_000);
	let err = sink.send(&request()).await.expect_err("Expected connect failure.");

	assert!(matches!(err, SinkError::Connect(_)), "Unexpected error: {err:?}");
	assert!(err.is_retryable());
}
