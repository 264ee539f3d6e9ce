//! HTTP/1.1 front end for the profile API.
//!
//! # Responsibility
//! - Accept connections, read bounded bodies, and hand complete requests to
//!   [`App`] on the blocking pool.
//! - Log one `http_request` event per request.
//!
//! # Invariants
//! - Request bodies above [`MAX_BODY_BYTES`] are answered with 413 unread.
//! - When the shutdown future resolves, no new connection is accepted and
//!   [`serve`] returns only after open connections finish or the grace
//!   period runs out.
//! - A failing `accept` backs off before retrying.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use log::{debug, error, info, warn};
use profile_api::{ApiError, App};
use profile_core::SessionStore;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

pub const MAX_BODY_BYTES: usize = 1024 * 1024;
/// How long [`serve`] waits for open connections after shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves `app` on `listener` until `shutdown` resolves, then drains open
/// connections for at most `grace`.
pub async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    shutdown: impl Future<Output = ()>,
    grace: Duration,
) -> std::io::Result<()> {
    info!(
        "event=server_listen module=server status=ok addr={}",
        listener.local_addr()?
    );
    let connections = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!("event=server_accept module=server status=error error={err}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                let app = Arc::clone(&app);
                let service = service_fn(move |request| respond(Arc::clone(&app), request));
                let connection = connections.watch(
                    http1::Builder::new().serve_connection(TokioIo::new(stream), service),
                );
                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        debug!("event=connection_end module=server status=error peer={peer} error={err}");
                    }
                });
            }
            () = &mut shutdown => break,
        }
    }

    drop(listener);
    info!(
        "event=server_stop module=server status=start grace_ms={}",
        grace.as_millis()
    );
    tokio::select! {
        () = connections.shutdown() => {
            info!("event=server_stop module=server status=ok");
        }
        () = tokio::time::sleep(grace) => {
            warn!("event=server_stop module=server status=error reason=grace_elapsed");
        }
    }
    Ok(())
}

async fn respond(
    app: Arc<App>,
    request: hyper::Request<Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let (parts, body) = request.into_parts();

    let response = match read_body(body).await {
        Ok(bytes) => {
            let request = http::Request::from_parts(parts, bytes);
            match tokio::task::spawn_blocking(move || app.handle(&request)).await {
                Ok(response) => response,
                Err(err) => ApiError::Internal(Box::new(err)).into_response(),
            }
        }
        Err(err) => err.into_response(),
    };

    let code = response.status().as_u16();
    let duration_ms = started_at.elapsed().as_millis();
    if response.status().is_server_error() {
        error!("event=http_request module=server status=error method={method} path={path} code={code} duration_ms={duration_ms}");
    } else {
        info!("event=http_request module=server status=ok method={method} path={path} code={code} duration_ms={duration_ms}");
    }
    Ok(response.map(|body| Full::new(Bytes::from(body))))
}

/// Collects a request body of at most [`MAX_BODY_BYTES`].
pub async fn read_body<B>(body: B) -> Result<Vec<u8>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes().to_vec()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge)
        }
        Err(err) => Err(ApiError::MalformedBody(err.to_string())),
    }
}

/// Drops expired sessions every `every`, forever.
pub async fn prune_sessions(sessions: Arc<SessionStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        sessions.prune_expired();
    }
}
