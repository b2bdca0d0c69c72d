//! End-to-end upload tests against a running server.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn test_round_trip_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let mut server = common::start_server(&dir).await;

    let payload = vec![b'A'; 500];
    let body = common::multipart_body("XYZ", "letters.txt", &payload);

    let res = reqwest::Client::new()
        .post(server.url())
        .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
        .body(body)
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let json: Value = res.json().await.unwrap();
    let filename = json["filename"].as_str().expect("filename in response");
    assert_eq!(std::fs::read(filename).unwrap(), payload);

    let completed = tokio::time::timeout(Duration::from_secs(5), server.completed.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.path, filename);
    assert_eq!(completed.client_filename.as_deref(), Some("letters.txt"));
    assert_eq!(completed.size, 500);
}

#[tokio::test]
async fn test_small_streamed_chunks() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let server = common::start_server(&dir).await;

    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 253) as u8).collect();
    let body = common::multipart_body("quoted-boundary", "bin.dat", &payload);
    let content_length = body.len();
    let chunks: Vec<Result<Bytes, std::io::Error>> = body
        .chunks(17)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();

    let res = reqwest::Client::new()
        .post(server.url())
        .header(CONTENT_TYPE, "multipart/form-data; boundary=\"quoted-boundary\"")
        .header(CONTENT_LENGTH, content_length)
        .body(reqwest::Body::wrap_stream(stream::iter(chunks)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let json: Value = res.json().await.unwrap();
    let stored = std::fs::read(json["filename"].as_str().unwrap()).unwrap();
    assert_eq!(stored, payload);
}

#[tokio::test]
async fn test_declaration_errors_create_no_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let server = common::start_server(&dir).await;
    let client = reqwest::Client::new();

    let cases = [
        ("text/plain", "Content-Type is not multipart/form-data"),
        ("multipart/form-data", "boundary not found"),
    ];
    for (content_type, message) in cases {
        let res = client
            .post(server.url())
            .header(CONTENT_TYPE, content_type)
            .body("irrelevant")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let json: Value = res.json().await.unwrap();
        assert_eq!(json["error"], message);
    }

    let res = client.post(server.url()).body("no content type").send().await.unwrap();
    assert_eq!(res.status(), 400);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Content-Type header not present");

    assert!(common::files_in(&dir).is_empty());
}

#[tokio::test]
async fn test_oversized_declaration_rejected_before_body() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let server = common::start_server(&dir).await;

    let too_big: u64 = 20 * 1024 * 1024 * 1024 + 1;
    let request = format!(
        "POST /upload HTTP/1.1\r\nHost: {}\r\nContent-Type: multipart/form-data; boundary=XYZ\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        server.addr, too_big
    );

    let response = common::raw_exchange(server.addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.1 400"), "got: {}", response);
    assert!(response.contains(r#"{"error":"Too big file"}"#));
    assert!(common::files_in(&dir).is_empty());
}

#[tokio::test]
async fn test_configured_size_ceiling() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let server = common::start_server_with(&dir, |config| {
        config.upload.max_streamed_size = 256;
    })
    .await;

    let body = common::multipart_body("XYZ", "big.bin", &[b'x'; 512]);
    let res = reqwest::Client::new()
        .post(server.url())
        .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Too big file");
}

#[tokio::test]
async fn test_disconnect_leaves_partial_file_and_no_result() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let mut server = common::start_server(&dir).await;

    let payload = vec![b'p'; 10_000];
    let body = common::multipart_body("XYZ", "cut.bin", &payload);
    let head = format!(
        "POST /upload HTTP/1.1\r\nHost: {}\r\nContent-Type: multipart/form-data; boundary=XYZ\r\nContent-Length: {}\r\n\r\n",
        server.addr,
        body.len()
    );

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(&body[..2_000]).await.unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    drop(stream);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let files = common::files_in(&dir);
    assert_eq!(files.len(), 1);
    let len = std::fs::metadata(&files[0]).unwrap().len();
    assert!(len > 0 && len < payload.len() as u64);
    assert!(server.completed.try_recv().is_err());
}

#[tokio::test]
async fn test_idle_timeout_cancels_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("upload");
    let mut server = common::start_server_with(&dir, |config| {
        config.timeouts.idle_secs = 1;
    })
    .await;

    let body = common::multipart_body("XYZ", "slow.bin", &[b's'; 4096]);
    let head = format!(
        "POST /upload HTTP/1.1\r\nHost: {}\r\nContent-Type: multipart/form-data; boundary=XYZ\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        server.addr,
        body.len()
    );
    let mut request = head.into_bytes();
    request.extend_from_slice(&body[..1_000]);

    let response = common::raw_exchange(server.addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 400"), "got: {}", response);
    assert!(response.contains("No body data received for 1 seconds"));
    assert!(server.completed.try_recv().is_err());
}

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let server = common::start_server(tmp.path()).await;

    let res = reqwest::get(format!("http://{}/health", server.addr)).await.unwrap();
    assert_eq!(res.status(), 200);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
