//! End-to-end: bind on an OS-assigned port, call over real HTTP, shut down.

use std::sync::Arc;
use std::time::Duration;

use buoy_core::{Value, ValueType};
use buoy_server::network::{HealthState, NetworkConfig, NetworkModule};
use buoy_server::{register_builtin_operations, CallRegistry};
use serde_json::{json, Value as Json};
use tokio::sync::oneshot;

struct TestServer {
    base: String,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<anyhow::Result<()>>,
    shutdown: Arc<buoy_server::network::ShutdownController>,
}

async fn spawn_server() -> TestServer {
    let mut registry = CallRegistry::new();
    register_builtin_operations(&mut registry).unwrap();
    registry
        .register(
            "add",
            vec![
                buoy_core::ParamDef::new("a", ValueType::Integer),
                buoy_core::ParamDef::new("b", ValueType::Integer),
            ],
            ValueType::Integer,
            |args: &[Value]| -> anyhow::Result<Value> {
                let a = args[0].as_integer().unwrap_or_default();
                let b = args[1].as_integer().unwrap_or_default();
                let sum = a.checked_add(b).ok_or_else(|| anyhow::anyhow!("overflow"))?;
                Ok(Value::Integer(sum))
            },
        )
        .unwrap();

    let config = NetworkConfig {
        host: "127.0.0.1".to_string(),
        drain_timeout: Duration::from_secs(2),
        ..NetworkConfig::default()
    };
    let mut module = NetworkModule::new(config, Arc::new(registry));
    let port = module.start().await.unwrap();
    let shutdown = module.shutdown_controller();

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(module.serve(async move {
        let _ = stopped.await;
    }));

    // Calls are refused with 503 until serve() flips the state.
    for _ in 0..200 {
        if shutdown.health_state() == HealthState::Ready {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(shutdown.health_state(), HealthState::Ready);

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        stop,
        task,
        shutdown,
    }
}

async fn post_call(base: &str, operation: &str, args: Json) -> (u16, Json) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/call/{operation}"))
        .json(&json!({ "args": args }))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn calls_over_http_then_shuts_down() {
    let server = spawn_server().await;
    let base = server.base.clone();

    let (status, body) = post_call(&base, "hello", json!(["World"])).await;
    assert_eq!(status, 200);
    assert_eq!(body["value"], "Hello, World!");

    let (status, body) = post_call(&base, "hello", json!([""])).await;
    assert_eq!(status, 200);
    assert_eq!(body["value"], "Hello, !");

    let (status, body) = post_call(&base, "hello", json!([42])).await;
    assert_eq!(status, 400);
    assert_eq!(body["kind"], "argument_type_mismatch");

    let (status, body) = post_call(&base, "add", json!([2, 3])).await;
    assert_eq!(status, 200);
    assert_eq!(body["value"], 5);

    let (status, body) = post_call(&base, "add", json!([i64::MAX, 1])).await;
    assert_eq!(status, 500);
    assert_eq!(body["kind"], "handler_failure");

    let (status, body) = post_call(&base, "nope", json!([])).await;
    assert_eq!(status, 404);
    assert_eq!(body["kind"], "unknown_operation");

    let ops: Json = reqwest::get(format!("{base}/operations"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ops[0]["name"], "hello");
    assert_eq!(ops[1]["name"], "fetch_page");
    assert_eq!(ops[2]["name"], "add");

    let (status, body) = post_call(&base, "fetch_page", json!([format!("{base}/operations")])).await;
    assert_eq!(status, 200);
    let page = body["value"].as_str().unwrap();
    assert!(page.contains("\"fetch_page\""), "{page}");

    let (status, body) = post_call(&base, "fetch_page", json!([format!("{base}/nowhere")])).await;
    assert_eq!(status, 500);
    assert_eq!(body["kind"], "handler_failure");

    let ready = reqwest::get(format!("{base}/health/ready")).await.unwrap();
    assert_eq!(ready.status().as_u16(), 200);

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
    let health: Json = resp.json().await.unwrap();
    assert_eq!(health["state"], "ready");
    assert_eq!(health["operations"], 3);

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
    assert_eq!(server.shutdown.health_state(), HealthState::Stopped);
}

#[tokio::test]
async fn repeated_calls_return_identical_results() {
    let server = spawn_server().await;

    let first = post_call(&server.base, "hello", json!(["again"])).await;
    let second = post_call(&server.base, "hello", json!(["again"])).await;
    assert_eq!(first, second);
    assert_eq!(first.1["value"], "Hello, again!");

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}
