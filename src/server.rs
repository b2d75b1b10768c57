use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::assets;
use crate::session::SessionPayload;

/// How long open connections get to finish once the session stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of a session server. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Idle,
    Bound,
    Serving,
    Stopped,
}

/// When a serving session stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Serve until interrupted.
    Signal,
    /// Serve for a fixed time after the browser is opened, or until
    /// interrupted, whichever comes first. A slow page load can be cut off.
    After(Duration),
}

impl StopPolicy {
    pub fn from_secs(secs: Option<u64>) -> Self {
        match secs {
            Some(secs) if secs > 0 => StopPolicy::After(Duration::from_secs(secs)),
            _ => StopPolicy::Signal,
        }
    }

    /// Resolves when the session should stop. `interrupt` is the session's
    /// interrupt listener; it must already be armed so no signal is missed.
    pub async fn wait<I>(self, interrupt: I)
    where
        I: Future<Output = ()>,
    {
        match self {
            StopPolicy::Signal => interrupt.await,
            StopPolicy::After(limit) => {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {
                        tracing::info!(secs = limit.as_secs(), "auto-stop timer elapsed");
                    }
                    _ = interrupt => {}
                }
            }
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("interrupted"),
        _ = terminate => tracing::info!("terminated"),
    }
}

#[derive(Clone)]
struct ServeState {
    payload: Bytes,
}

/// Routes for one session. Nothing here writes to shared state.
pub fn router(payload: Bytes) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/app.js", get(script_handler))
        .route("/style.css", get(style_handler))
        .route("/api/diff", get(diff_handler))
        .fallback(not_found_handler)
        .with_state(ServeState { payload })
}

async fn index_handler() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn script_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        assets::APP_JS,
    )
        .into_response()
}

async fn style_handler() -> Response {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], assets::STYLE_CSS).into_response()
}

async fn diff_handler(State(state): State<ServeState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        state.payload,
    )
        .into_response()
}

async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// A single-use local HTTP server for one payload.
pub struct DiffSession {
    router: Router,
    phase: SessionPhase,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
}

impl DiffSession {
    pub fn new(payload: &SessionPayload) -> Result<Self> {
        let body = Bytes::from(payload.to_json_bytes()?);
        Ok(Self {
            router: router(body),
            phase: SessionPhase::Idle,
            listener: None,
            local_addr: None,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn url(&self) -> Option<String> {
        self.local_addr
            .map(|addr| format!("http://{}:{}", addr.ip(), addr.port()))
    }

    fn advance(&mut self, next: SessionPhase) {
        debug_assert!(next > self.phase, "{:?} -> {next:?}", self.phase);
        tracing::debug!(from = ?self.phase, to = ?next, "session phase");
        self.phase = next;
    }

    /// Take an ephemeral port on the loopback interface.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        anyhow::ensure!(
            self.phase == SessionPhase::Idle,
            "session is already {:?}",
            self.phase
        );
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("Failed to bind a local port")?;
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;
        self.listener = Some(listener);
        self.local_addr = Some(addr);
        self.advance(SessionPhase::Bound);
        Ok(addr)
    }

    /// Serve until `shutdown` resolves.
    ///
    /// `on_serving` gets the session URL once the server task is accepting
    /// connections; the browser is opened from there.
    pub async fn run<S, F>(&mut self, shutdown: S, on_serving: F) -> Result<()>
    where
        S: Future<Output = ()>,
        F: FnOnce(&str),
    {
        let listener = self
            .listener
            .take()
            .context("session must be bound before serving")?;
        let url = self.url().context("session has no address")?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let app = self.router.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });
        self.advance(SessionPhase::Serving);
        on_serving(&url);

        shutdown.await;
        let _ = stop_tx.send(());

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
            Ok(joined) => joined
                .context("server task panicked")?
                .context("server error")?,
            Err(_) => {
                tracing::warn!("connections still open after shutdown, closing them");
                server.abort();
            }
        }
        self.advance(SessionPhase::Stopped);
        Ok(())
    }
}
