//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use stream_upload::upload::framing::{part_headers, Framing, SEPARATOR};
use stream_upload::{CompletedUpload, Shutdown, UploadServer, UploadServerConfig};

pub struct TestServer {
    pub addr: SocketAddr,
    pub completed: mpsc::UnboundedReceiver<CompletedUpload>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}/upload", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port, storing uploads under `dir`.
pub async fn start_server(dir: &Path) -> TestServer {
    start_server_with(dir, |_| {}).await
}

pub async fn start_server_with<F>(dir: &Path, customize: F) -> TestServer
where
    F: FnOnce(&mut UploadServerConfig),
{
    let mut config = UploadServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upload.directory = dir.to_string_lossy().into_owned();
    customize(&mut config);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, completed) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let server = UploadServer::new(config).with_consumer(tx);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        completed,
        shutdown,
    }
}

/// A complete single-part multipart body.
pub fn multipart_body(boundary: &str, filename: &str, payload: &[u8]) -> Vec<u8> {
    let framing = Framing::new(boundary);
    let mut body = Vec::new();
    body.extend_from_slice(framing.boundary_start());
    body.extend_from_slice(part_headers("file", filename).as_bytes());
    body.extend_from_slice(SEPARATOR);
    body.extend_from_slice(payload);
    body.extend_from_slice(framing.boundary_end());
    body
}

/// Send raw bytes and read the response until the server closes the connection.
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}

pub fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
