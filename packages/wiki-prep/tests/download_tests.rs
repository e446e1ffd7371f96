//! Integration tests for the resumable downloader against a local HTTP server.

use std::fs;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use wiki_prep::download::Downloader;
use wiki_prep::layout::{partial_path, validator_path};
use wiki_prep::PipelineError;

const BODY: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Strong entity tag of the file the test server currently serves.
const ETAG: &str = "\"dump-v2\"";

/// Range-related headers of one request seen by the test server.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SeenRequest {
    range: Option<String>,
    if_range: Option<String>,
}

fn header_value(request: &str, name: &str) -> Option<String> {
    let prefix = format!("{}:", name);
    request
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with(&prefix))
        .map(|l| l[prefix.len()..].trim().to_string())
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Normal,
    /// Answer every request with this status and no body
    Status(u16),
    /// Announce the full body but close the connection after this many bytes
    CutAfter(usize),
}

/// Minimal HTTP/1.1 server serving `BODY` with `ETAG`, honouring
/// `Range: bytes=N-` unless an `If-Range` header names another version.
async fn serve(mode: Mode) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_server = seen.clone();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let request = String::from_utf8_lossy(&request).to_string();
            let range = header_value(&request, "range");
            let if_range = header_value(&request, "if-range");
            seen_by_server.lock().unwrap().push(SeenRequest {
                range: range.clone(),
                if_range: if_range.clone(),
            });

            let same_version = if_range.as_deref().map_or(true, |v| v == ETAG);
            let offset = range
                .as_deref()
                .filter(|_| same_version)
                .and_then(|r| r.strip_prefix("bytes="))
                .and_then(|r| r.trim_end_matches('-').parse::<usize>().ok());

            let (status, body): (u16, &[u8]) = match (mode, offset) {
                (Mode::Status(code), _) => (code, b""),
                (_, Some(n)) if n >= BODY.len() => (416, b""),
                (_, Some(n)) => (206, &BODY[n..]),
                (_, None) => (200, BODY),
            };
            let reason = match status {
                200 => "OK",
                206 => "Partial Content",
                416 => "Range Not Satisfiable",
                _ => "Error",
            };
            let head = format!(
                "HTTP/1.1 {} {}\r\nETag: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason,
                ETAG,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            let sent = match mode {
                Mode::CutAfter(n) => &body[..n.min(body.len())],
                _ => body,
            };
            socket.write_all(sent).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (addr, seen)
}

fn resume_request(offset: usize, validator: &str) -> SeenRequest {
    SeenRequest {
        range: Some(format!("bytes={}-", offset)),
        if_range: Some(validator.to_string()),
    }
}

fn fresh_request() -> SeenRequest {
    SeenRequest {
        range: None,
        if_range: None,
    }
}

fn downloader() -> Downloader {
    Downloader::new("wiki-prep-test", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fresh_download_writes_archive() {
    let (addr, seen) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("dumps/xxwiki.xml.bz2");

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert!(!partial_path(&dest).exists());
    assert!(!validator_path(&dest).exists());
    assert_eq!(outcome.downloaded, BODY.len() as u64);
    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(seen.lock().unwrap().as_slice(), &[fresh_request()]);
}

#[tokio::test]
async fn test_resumes_from_partial_file() {
    let (addr, seen) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");
    fs::write(partial_path(&dest), &BODY[..10]).unwrap();
    fs::write(validator_path(&dest), ETAG).unwrap();

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(outcome.resumed_from, 10);
    assert_eq!(outcome.downloaded, (BODY.len() - 10) as u64);
    assert_eq!(outcome.total(), BODY.len() as u64);
    assert_eq!(seen.lock().unwrap().as_slice(), &[resume_request(10, ETAG)]);
    assert!(!validator_path(&dest).exists());
}

#[tokio::test]
async fn test_changed_remote_file_restarts_download() {
    let (addr, seen) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");
    fs::write(partial_path(&dest), b"OLDDUMPPREFIX").unwrap();
    fs::write(validator_path(&dest), "\"dump-v1\"").unwrap();

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(outcome.downloaded, BODY.len() as u64);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[resume_request(13, "\"dump-v1\"")]
    );
}

#[tokio::test]
async fn test_stale_complete_partial_is_not_promoted() {
    let (addr, _) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");
    let stale = vec![b'x'; BODY.len() + 5];
    fs::write(partial_path(&dest), &stale).unwrap();
    fs::write(validator_path(&dest), "\"dump-v1\"").unwrap();

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
}

#[tokio::test]
async fn test_partial_without_validator_is_downloaded_again() {
    let (addr, seen) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");
    fs::write(partial_path(&dest), b"unknown origin").unwrap();

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(seen.lock().unwrap().as_slice(), &[fresh_request()]);
}

#[tokio::test]
async fn test_interrupted_download_can_resume() {
    let (cut_addr, _) = serve(Mode::CutAfter(10)).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");

    let err = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", cut_addr), &dest)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Download { .. }));
    assert!(!dest.exists());
    assert_eq!(fs::read(partial_path(&dest)).unwrap(), &BODY[..10]);
    assert_eq!(fs::read_to_string(validator_path(&dest)).unwrap(), ETAG);

    let (addr, seen) = serve(Mode::Normal).await;
    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();
    assert_eq!(outcome.resumed_from, 10);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(seen.lock().unwrap().as_slice(), &[resume_request(10, ETAG)]);
}

#[tokio::test]
async fn test_complete_partial_file_is_promoted() {
    let (addr, _) = serve(Mode::Normal).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");
    fs::write(partial_path(&dest), BODY).unwrap();
    fs::write(validator_path(&dest), ETAG).unwrap();

    let outcome = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap();

    assert_eq!(outcome.downloaded, 0);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert!(!partial_path(&dest).exists());
    assert!(!validator_path(&dest).exists());
}

#[tokio::test]
async fn test_http_error_status_leaves_no_archive() {
    let (addr, _) = serve(Mode::Status(404)).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");

    let err = downloader()
        .fetch(&format!("http://{}/missing.xml.bz2", addr), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Http { status: 404, .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_unreachable_host_is_download_error() {
    // bind then drop to get a port nothing listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("xxwiki.xml.bz2");

    let err = downloader()
        .fetch(&format!("http://{}/xxwiki.xml.bz2", addr), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Download { .. }));
    assert!(!dest.exists());
}
