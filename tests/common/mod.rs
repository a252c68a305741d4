//! Shared helpers for integration tests.

#![allow(dead_code, clippy::panic)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use run_socket::app_state::AppState;
use run_socket::error::SocketError;
use run_socket::server::serve_on;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink for formatted log output.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    pub fn count_ending_with(&self, suffix: &str) -> usize {
        self.lines().iter().filter(|l| l.ends_with(suffix)).count()
    }
}

#[derive(Debug)]
pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

/// Installs a capturing subscriber for the current thread.
///
/// `#[tokio::test]` runs on a current-thread runtime, so the server tasks
/// spawned by the test log through this subscriber too.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// A server running on an ephemeral port.
#[derive(Debug)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), SocketError>>,
}

impl TestServer {
    pub async fn start(max_message_bytes: usize) -> Self {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind ephemeral port");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        let state = AppState::new(max_message_bytes);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_on(listener, state.clone(), "/ws", async move {
            stop_rx.await.ok();
        }));
        Self {
            addr,
            state,
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Signals shutdown and waits for the serve loop to return.
    pub async fn stop(mut self) -> Result<(), SocketError> {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        match tokio::time::timeout(Duration::from_secs(10), self.handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => panic!("server task failed: {join_err}"),
            Err(_) => panic!("server did not stop in time"),
        }
    }
}

/// Polls `check` until it returns `true` or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
