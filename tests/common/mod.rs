//! Fake origin and helpers shared by the relay tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use relay::{AppConfig, InvocationHandler};
use tokio::net::TcpListener;

pub const PLAYLIST_BODY: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXTINF:6.0,\nchunk42.ts?seq=7\n";
pub const LARGE_BODY_LEN: usize = 24 * 1024 * 1024;
const LARGE_CHUNK_LEN: usize = 64 * 1024;
/// the trickling segment takes about four seconds to finish when read to the end
pub const TRICKLE_CHUNKS: usize = 200;
const TRICKLE_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Default)]
pub struct Origin {
    pub hits: Arc<AtomicUsize>,
    pub chunks_sent: Arc<AtomicUsize>,
    pub streams_closed: Arc<AtomicUsize>,
}

impl Origin {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent.load(Ordering::SeqCst)
    }

    /// trickling bodies dropped by the origin's server, finished or not
    pub fn streams_closed(&self) -> usize {
        self.streams_closed.load(Ordering::SeqCst)
    }
}

struct StreamGuard(Arc<AtomicUsize>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// byte `i` of the large body, deterministic so the relayed copy can be checked in place
pub fn large_byte(i: usize) -> u8 {
    (i.wrapping_mul(31) ^ (i >> 7)) as u8
}

// the origin reports back what it received so tests can assert on the upstream request
fn seen_headers(request_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let echo = |name: header::HeaderName| {
        request_headers
            .get(&name)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("none"))
    };
    headers.insert("x-seen-range", echo(header::RANGE));
    headers.insert("x-seen-user-agent", echo(header::USER_AGENT));
    headers.insert("x-seen-accept", echo(header::ACCEPT));
    headers.insert(
        "x-seen-custom",
        request_headers
            .get("x-custom")
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("none")),
    );
    headers
}

async fn playlist(State(origin): State<Origin>, headers: HeaderMap) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    let mut response_headers = seen_headers(&headers);
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/vnd.apple.mpegurl"),
    );
    (StatusCode::OK, response_headers, PLAYLIST_BODY).into_response()
}

async fn segment(State(origin): State<Origin>, headers: HeaderMap) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    let mut response_headers = seen_headers(&headers);
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp2t"));
    (StatusCode::OK, response_headers, "segment-bytes").into_response()
}

async fn attachment(State(origin): State<Origin>) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"chunk.ts\""),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "https://only-this.example"),
        ],
        "segment-bytes",
    )
        .into_response()
}

async fn large(State(origin): State<Origin>) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    let chunks = (0..LARGE_BODY_LEN).step_by(LARGE_CHUNK_LEN).map(|start| {
        let end = (start + LARGE_CHUNK_LEN).min(LARGE_BODY_LEN);
        Ok::<_, std::io::Error>(Bytes::from((start..end).map(large_byte).collect::<Vec<u8>>()))
    });
    (
        [(header::CONTENT_TYPE, "video/mp2t")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
        .into_response()
}

async fn trickle(State(origin): State<Origin>) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    let guard = StreamGuard(origin.streams_closed.clone());
    let sent = origin.chunks_sent.clone();

    let chunks = futures::stream::unfold((0usize, guard), move |(i, guard)| {
        let sent = sent.clone();
        async move {
            if i == TRICKLE_CHUNKS {
                return None;
            }
            if i > 0 {
                tokio::time::sleep(TRICKLE_INTERVAL).await;
            }
            sent.fetch_add(1, Ordering::SeqCst);
            Some((
                Ok::<_, std::io::Error>(Bytes::from(vec![0x47u8; 1024])),
                (i + 1, guard),
            ))
        }
    });

    (
        [(header::CONTENT_TYPE, "video/mp2t")],
        Body::from_stream(chunks),
    )
        .into_response()
}

async fn slow(State(origin): State<Origin>) -> &'static str {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn missing(State(origin): State<Origin>) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "no such stream").into_response()
}

async fn echo(State(origin): State<Origin>, headers: HeaderMap, body: Bytes) -> Response {
    origin.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, seen_headers(&headers), body).into_response()
}

/// starts the fake origin on an ephemeral port
pub async fn spawn_origin() -> (SocketAddr, Origin) {
    let origin = Origin::default();
    let app = Router::new()
        .route("/live/playlist.m3u8", get(playlist))
        .route("/seg/chunk42.ts", get(segment))
        .route("/seg/attachment.ts", get(attachment))
        .route("/seg/large.ts", get(large))
        .route("/seg/trickle.ts", get(trickle))
        .route("/slow.m3u8", get(slow))
        .route("/missing.m3u8", get(missing))
        .route("/echo", any(echo))
        .with_state(origin.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, origin)
}

/// a port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

pub fn handler(config: AppConfig) -> InvocationHandler {
    InvocationHandler::new(Arc::new(config)).unwrap()
}

pub fn proxy_uri(target: &str) -> String {
    format!("/proxy?url={}", urlencoding::encode(target))
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
