use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::output::Sink;

/// Streams one image to disk, chunk by chunk.
///
/// A non-success status is reported through the sink and the photo is skipped
/// (returns `false`); nothing is written in that case.
pub async fn download_image(
    http: &Client,
    url: &str,
    dest: &Path,
    sink: &mut Sink,
) -> Result<bool> {
    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        sink.line(&format!("bad response: {}", response.status()))?;
        return Ok(false);
    }

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn writes_body_to_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("1.jpg");
        let mut sink = Sink::console();
        let saved = download_image(
            &Client::new(),
            &format!("{}/img/1.jpg", server.uri()),
            &dest,
            &mut sink,
        )
        .await
        .unwrap();

        assert!(saved);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn non_success_status_skips_without_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/404.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("404.jpg");
        let mut sink = Sink::console();
        let saved = download_image(
            &Client::new(),
            &format!("{}/img/404.jpg", server.uri()),
            &dest,
            &mut sink,
        )
        .await
        .unwrap();

        assert!(!saved);
        assert!(!dest.exists());
    }
}
