use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use futures_util::{stream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use stream_upload::upload::framing::{part_headers, Framing, SEPARATOR};

#[derive(Parser)]
#[command(name = "upload-cli")]
#[command(about = "Stream a local file to a stream-upload server", long_about = None)]
struct Cli {
    /// File to upload
    file: PathBuf,

    #[arg(short, long, default_value = "http://localhost:5006/upload")]
    url: String,

    /// Multipart field name
    #[arg(long, default_value = "file")]
    field: String,

    /// Read size per body chunk, in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let file = tokio::fs::File::open(&cli.file).await?;
    let payload_len = file.metadata().await?.len();
    let filename = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let boundary = format!("----stream-upload-{}", Uuid::new_v4().simple());
    let framing = Framing::new(&boundary);
    let headers = part_headers(&cli.field, &filename);
    let content_length = framing.content_length(headers.len(), payload_len);

    let mut prefix = framing.boundary_start().to_vec();
    prefix.extend_from_slice(headers.as_bytes());
    prefix.extend_from_slice(SEPARATOR);
    let suffix = framing.boundary_end().to_vec();

    let chunk_size = cli.chunk_size.max(1);
    let file_chunks = stream::try_unfold(file, move |mut file| async move {
        let mut buf = vec![0u8; chunk_size];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    });

    let body = stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(prefix)) })
        .chain(file_chunks)
        .chain(stream::once(async move { Ok(Bytes::from(suffix)) }));

    let res = reqwest::Client::new()
        .post(&cli.url)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .header(CONTENT_LENGTH, content_length)
        .body(reqwest::Body::wrap_stream(body))
        .send()
        .await?;

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) if status.is_success() && json.get("error").is_none() => {
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Ok(json) => {
            eprintln!("Error: upload returned status {}", status);
            eprintln!("{}", serde_json::to_string_pretty(&json)?);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Error: upload returned status {}", status);
            eprintln!("Response: {}", text);
            std::process::exit(1);
        }
    }
    Ok(())
}
