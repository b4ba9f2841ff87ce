//! Payload acquisition for resolved sources.

use crate::error::{RegistryError, Result};
use crate::specifier::ResolvedSource;

/// Reads the raw payload bytes of a resolved source.
///
/// Local paths must exist and be readable; remote URLs are fetched with a
/// single GET and any non-success status is a failure. Retry policy, if
/// any, belongs to the HTTP client configuration, not here.
///
/// # Errors
///
/// Returns [`RegistryError::SourceUnreadable`] wrapping the underlying I/O
/// or HTTP error.
pub async fn fetch_payload(source: &ResolvedSource, client: &reqwest::Client) -> Result<Vec<u8>> {
    match source {
        ResolvedSource::LocalPath(path) => {
            tracing::debug!("Reading plugin payload: {}", path.display());
            tokio::fs::read(path)
                .await
                .map_err(|e| unreadable(source, e))
        }
        ResolvedSource::RemoteUrl(url) => {
            tracing::debug!("Downloading plugin payload: {}", url);
            let response = client
                .get(url.clone())
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| unreadable(source, e))?;

            let bytes = response.bytes().await.map_err(|e| unreadable(source, e))?;
            tracing::info!("Fetched plugin payload: {} bytes", bytes.len());
            Ok(bytes.to_vec())
        }
    }
}

fn unreadable(
    source: &ResolvedSource,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> RegistryError {
    RegistryError::SourceUnreadable {
        location: source.location(),
        source: Box::new(cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_local_path_read() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("plugin.cjs");
        std::fs::write(&file, b"payload bytes").unwrap();

        let source = ResolvedSource::LocalPath(file);
        let bytes = fetch_payload(&source, &reqwest::Client::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"payload bytes");
    }

    #[tokio::test]
    async fn test_local_path_missing() {
        let source = ResolvedSource::LocalPath(PathBuf::from("/nonexistent/plugin.cjs"));
        let result = fetch_payload(&source, &reqwest::Client::new()).await;
        assert!(matches!(
            result,
            Err(RegistryError::SourceUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn test_remote_url_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugin.cjs"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote payload".to_vec()))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/plugin.cjs", server.uri())).unwrap();
        let source = ResolvedSource::RemoteUrl(url);
        let bytes = fetch_payload(&source, &reqwest::Client::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"remote payload");
    }

    #[tokio::test]
    async fn test_remote_url_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.cjs", server.uri())).unwrap();
        let source = ResolvedSource::RemoteUrl(url);
        let result = fetch_payload(&source, &reqwest::Client::new()).await;
        assert!(matches!(
            result,
            Err(RegistryError::SourceUnreadable { .. })
        ));
    }
}
