//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use devup::config::{DevupConfig, Environment, ProbeConfig, SmokeTestConfig};
use devup::engine::{ContainerEngine, EngineError, ExecOutput};

/// A request as seen by the programmable backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` maps each request to `(status, json body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut first = head.lines().next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();

    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(SeenRequest { method, path, body })
}

/// Mock API whose `/health` fails with 503 until call `healthy_from` (1-based).
///
/// `/echo` answers `{"you_sent": <body>}`. Returns the address and the health-call counter.
pub async fn start_mock_api(healthy_from: Option<u32>) -> (SocketAddr, Arc<AtomicU32>) {
    let health_calls = Arc::new(AtomicU32::new(0));
    let counter = health_calls.clone();

    let addr = start_programmable_backend(move |req| {
        let counter = counter.clone();
        async move {
            match (req.method.as_str(), req.path.as_str()) {
                ("GET", "/health") => {
                    let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    match healthy_from {
                        Some(n) if call >= n => (200, r#"{"status":"ok"}"#.to_string()),
                        _ => (503, r#"{"status":"starting"}"#.to_string()),
                    }
                }
                ("POST", "/echo") => {
                    let data = if req.body.is_empty() { "{}".to_string() } else { req.body };
                    (200, format!(r#"{{"you_sent":{}}}"#, data))
                }
                _ => (404, "{}".to_string()),
            }
        }
    })
    .await;

    (addr, health_calls)
}

/// Container engine double. `exec` replies with `exec_exit`; every call is recorded.
pub struct FakeEngine {
    pub exec_exit: i32,
    pub exec_stdout: String,
    pub fail_start: bool,
    calls: Mutex<Vec<String>>,
    execs: AtomicU32,
}

impl FakeEngine {
    pub fn healthy() -> Self {
        Self {
            exec_exit: 0,
            exec_stdout: "mysqld is alive".to_string(),
            fail_start: false,
            calls: Mutex::new(Vec::new()),
            execs: AtomicU32::new(0),
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::healthy()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exec_count(&self) -> u32 {
        self.execs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn start(&self, services: &[String]) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(format!("start {}", services.join(" ")));
        if self.fail_start {
            return Err(EngineError::Unreachable {
                command: "docker-compose up -d".to_string(),
                reason: "Cannot connect to the Docker daemon".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self, services: &[String], remove_volumes: bool) -> Result<(), EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("stop {} volumes={}", services.join(" "), remove_volumes));
        Ok(())
    }

    async fn exec(&self, service: &str, _command: &[String]) -> Result<ExecOutput, EngineError> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(format!("exec {}", service));
        Ok(ExecOutput {
            exit_code: self.exec_exit,
            stdout: self.exec_stdout.clone(),
            stderr: String::new(),
        })
    }
}

/// Default services pointed at `127.0.0.1:<port>`, with 5 attempts per service.
pub fn test_config(interval: Duration) -> DevupConfig {
    let mut config = DevupConfig::default();
    for service in &mut config.services {
        service.retry.max_attempts = 5;
        service.retry.interval_ms = interval.as_millis() as u64;
        service.retry.timeout_ms = 1000;

        if let ProbeConfig::Http { url, .. } = &mut service.probe {
            *url = url.replace("localhost", "127.0.0.1");
        }
        if let Some(SmokeTestConfig::Http { url, .. }) = &mut service.smoke_test {
            *url = url.replace("localhost", "127.0.0.1");
        }
    }
    config
}

pub fn test_environment(api_port: u16) -> Environment {
    let values: BTreeMap<String, String> = [
        ("DB_USER", "root".to_string()),
        ("DB_PASSWORD", "secret".to_string()),
        ("DB_HOST", "localhost".to_string()),
        ("MOCK_API_PORT", api_port.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    Environment::new(values)
}
