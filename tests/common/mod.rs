#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Query,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const MAIN_PLAYLIST: &str = "#EXTM3U
#EXTINF:-1 tvg-id=\"cnn\" group-title=\"News\",CNN
/live/stream.ts
#EXTINF:-1 tvg-id=\"bbc\" group-title=\"News\",BBC
../hls/index.m3u8
#EXTINF:-1 group-title=\"Films\" duration=\"5\",Trailer
/live/trailer.mp4
#EXTINF:-1 group-title=\"Radio\",Jazz
/radio/jazz.mp3
";

/// Look-back windows up to this many days are served
pub const ARCHIVE_DAYS: i64 = 7;

type Reply = (StatusCode, [(header::HeaderName, &'static str); 1], Vec<u8>);

fn reply(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Reply {
    (status, [(header::CONTENT_TYPE, content_type)], body)
}

fn playseek_days(value: &str) -> Option<i64> {
    let range = value.strip_prefix("playseek=")?;
    let (start, end) = range.split_once('-')?;
    let start = NaiveDateTime::parse_from_str(start, "%Y%m%d%H%M%S").ok()?;
    let end = NaiveDateTime::parse_from_str(end, "%Y%m%d%H%M%S").ok()?;
    Some((end - start).num_days())
}

/// MPEG-TS stream with a seven day `playseek` archive
async fn archived_stream(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("catchup") {
        None => reply(StatusCode::OK, "video/mp2t", vec![0x47; 1024]),
        Some(value) => match playseek_days(value) {
            Some(days) if days <= ARCHIVE_DAYS => reply(StatusCode::OK, "video/mp2t", Vec::new()),
            Some(_) => reply(StatusCode::NOT_FOUND, "text/plain", b"out of range".to_vec()),
            None if value.starts_with("timeshift=") => {
                reply(StatusCode::OK, "text/plain", Vec::new())
            }
            None => reply(StatusCode::NOT_FOUND, "text/plain", Vec::new()),
        },
    }
}

/// HLS playlist served with a generic content-type and no archive
async fn hls_stream(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.contains_key("catchup") {
        return reply(StatusCode::NOT_FOUND, "text/plain", Vec::new());
    }
    reply(
        StatusCode::OK,
        "application/octet-stream",
        b"#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n".to_vec(),
    )
}

async fn slow_stream() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(3)).await;
    reply(StatusCode::OK, "video/mp2t", Vec::new())
}

/// Headers arrive at once, the body never does
fn stalled(content_type: &'static str) -> (StatusCode, [(header::HeaderName, &'static str); 1], Body) {
    let body = Body::from_stream(futures::stream::pending::<Result<Vec<u8>, std::io::Error>>());
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body)
}

async fn stalled_ts() -> impl IntoResponse {
    stalled("video/mp2t")
}

async fn stalled_binary() -> impl IntoResponse {
    stalled("application/octet-stream")
}

/// Live stream whose archive requests are redirected to another path
async fn moved_stream(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.contains_key("catchup") {
        return (
            StatusCode::FOUND,
            [(header::LOCATION, "/live/backup.ts")],
            Vec::new(),
        );
    }
    reply(StatusCode::OK, "video/mp2t", vec![0x47; 188])
}

async fn main_playlist() -> impl IntoResponse {
    reply(
        StatusCode::OK,
        "audio/x-mpegurl",
        MAIN_PLAYLIST.as_bytes().to_vec(),
    )
}

pub fn router() -> Router {
    Router::new()
        .route("/live/stream.ts", get(archived_stream))
        .route("/live/backup.ts", get(archived_stream))
        .route("/hls/index.m3u8", get(hls_stream))
        .route("/slow.ts", get(slow_stream))
        .route("/stalled.ts", get(stalled_ts))
        .route("/stalled.bin", get(stalled_binary))
        .route("/moved.ts", get(moved_stream))
        .route("/lists/main.m3u", get(main_playlist))
}

/// Serve [`router`] on an ephemeral local port
pub async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}
