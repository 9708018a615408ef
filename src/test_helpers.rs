//! Shared test helpers for exercising download failures that wiremock cannot produce.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a server that answers every request with 200 and a `Content-Length` of
/// `declared_len`, sends `body` and then closes the connection.
///
/// With `declared_len > body.len()` the client sees the stream end early. Returns the URL to
/// request.
pub(crate) async fn truncated_body_server(declared_len: usize, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            // Read the request head before answering
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared_len
            );
            stream.write_all(head.as_bytes()).await.ok();
            stream.write_all(body).await.ok();
            stream.shutdown().await.ok();
        }
    });

    format!("http://{}/truncated", addr)
}
