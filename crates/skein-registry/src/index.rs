//! Remote registry index client.
//!
//! The index is a versioned JSON document mapping canonical plugin
//! identities to base download URLs. It is fetched fresh on every import
//! and never cached to disk.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{RegistryError, Result};
use crate::specifier::RegistryRequest;

/// Scope official registry plugins live under.
pub const DEFAULT_SCOPE: &str = "@yarnpkg";

/// Package whose release tag pins plugin builds to the running CLI build.
pub const CLI_PACKAGE: &str = "@yarnpkg/cli";

/// Release channel base URLs point at before any rewriting.
pub const DEFAULT_CHANNEL: &str = "master";

/// Host serving the registry index documents.
const INDEX_HOST: &str = "https://repo.yarnpkg.com";

/// The parsed registry index for one import invocation.
///
/// # Examples
///
/// ```no_run
/// use skein_registry::PluginIndex;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = reqwest::Client::new();
/// let index = PluginIndex::fetch(&client, Some("4.0.0")).await?;
/// println!("{} plugins available", index.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PluginIndex {
    entries: BTreeMap<String, String>,
}

impl PluginIndex {
    /// Fetches and parses the index document for the given CLI version tag.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::IndexUnavailable`] on transport failure or a
    ///   non-success status
    /// - [`RegistryError::IndexMalformed`] if the body is not a JSON map of
    ///   identity to URL
    pub async fn fetch(client: &reqwest::Client, version_tag: Option<&str>) -> Result<Self> {
        Self::fetch_from(client, &index_url(version_tag)).await
    }

    /// Fetches the index from an explicit URL.
    pub async fn fetch_from(client: &reqwest::Client, url: &str) -> Result<Self> {
        tracing::debug!("Fetching plugin index: {}", url);

        let unavailable = |source| RegistryError::IndexUnavailable {
            url: url.to_string(),
            source,
        };

        let response = client
            .get(url)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body = response.bytes().await.map_err(unavailable)?;

        let entries: BTreeMap<String, String> =
            serde_json::from_slice(&body).map_err(|e| RegistryError::IndexMalformed {
                reason: format!("expected a JSON map of plugin name to URL: {e}"),
            })?;

        tracing::info!("Fetched plugin index: {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Builds an index from in-memory entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Number of plugins listed in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index lists no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities listed in the index, in sorted order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolves a registry request to a concrete download URL.
    ///
    /// The base URL's `/master/` channel segment is rewritten to pin the
    /// fetched build:
    /// - an explicit requested version pins `/<identity>/<version>/`
    /// - otherwise a known CLI version tag pins `/@yarnpkg/cli/<tag>/`
    /// - otherwise the default (unstable) channel is left untouched
    ///
    /// `installed` is consulted only to sharpen the not-found diagnostic.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::PluginNameNotFound`] if the identity is absent
    /// - [`RegistryError::IndexMalformed`] if the rewritten URL fails to
    ///   parse
    pub fn resolve(
        &self,
        request: &RegistryRequest,
        version_tag: Option<&str>,
        installed: &[String],
    ) -> Result<Url> {
        let Some(base) = self.entries.get(&request.identity) else {
            return Err(RegistryError::PluginNameNotFound {
                identity: request.identity.clone(),
                already_installed: installed.iter().any(|spec| spec == &request.identity),
            });
        };

        let channel = format!("/{DEFAULT_CHANNEL}/");
        let rewritten = if let Some(version) = &request.version {
            base.replace(&channel, &format!("/{}/{version}/", request.identity))
        } else if let Some(tag) = version_tag {
            base.replace(&channel, &format!("/{CLI_PACKAGE}/{tag}/"))
        } else {
            base.clone()
        };

        tracing::debug!("Resolved {} -> {}", request.identity, rewritten);

        Url::parse(&rewritten).map_err(|e| RegistryError::IndexMalformed {
            reason: format!("index URL for '{}' is not a valid URL: {e}", request.identity),
        })
    }
}

/// The index document is versioned by the CLI release tag; unknown builds
/// read the unstable channel document.
fn index_url(version_tag: Option<&str>) -> String {
    let tag = version_tag.unwrap_or(DEFAULT_CHANNEL);
    format!("{INDEX_HOST}/{tag}/plugins")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EXEC: &str = "@yarnpkg/plugin-exec";
    const EXEC_URL: &str =
        "https://example.com/builds/master/packages/plugin-exec/plugin-exec.cjs";

    fn request(identity: &str, version: Option<semver::Version>) -> RegistryRequest {
        RegistryRequest {
            identity: identity.to_string(),
            version,
        }
    }

    #[test]
    fn test_index_url_versioned() {
        assert_eq!(
            index_url(Some("4.0.0")),
            "https://repo.yarnpkg.com/4.0.0/plugins"
        );
        assert_eq!(index_url(None), "https://repo.yarnpkg.com/master/plugins");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let index = PluginIndex::from_entries([(EXEC, EXEC_URL)]);

        let result = index.resolve(&request("@yarnpkg/plugin-nope", None), None, &[]);
        match result {
            Err(RegistryError::PluginNameNotFound {
                identity,
                already_installed,
            }) => {
                assert_eq!(identity, "@yarnpkg/plugin-nope");
                assert!(!already_installed);
            }
            other => panic!("expected PluginNameNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_unknown_name_already_installed() {
        let index = PluginIndex::from_entries([(EXEC, EXEC_URL)]);
        let installed = vec!["@yarnpkg/plugin-nope".to_string()];

        let result = index.resolve(&request("@yarnpkg/plugin-nope", None), None, &installed);
        match result {
            Err(RegistryError::PluginNameNotFound {
                already_installed, ..
            }) => assert!(already_installed),
            other => panic!("expected PluginNameNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_pins_cli_build() {
        let index = PluginIndex::from_entries([(EXEC, EXEC_URL)]);

        let url = index
            .resolve(&request(EXEC, None), Some("4.0.0"), &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/builds/@yarnpkg/cli/4.0.0/packages/plugin-exec/plugin-exec.cjs"
        );
    }

    #[test]
    fn test_resolve_pins_explicit_version() {
        let index = PluginIndex::from_entries([(EXEC, EXEC_URL)]);

        let url = index
            .resolve(
                &request(EXEC, Some(semver::Version::new(3, 1, 0))),
                Some("4.0.0"),
                &[],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/builds/@yarnpkg/plugin-exec/3.1.0/packages/plugin-exec/plugin-exec.cjs"
        );
    }

    #[test]
    fn test_resolve_without_version_tag_keeps_default_channel() {
        let index = PluginIndex::from_entries([(EXEC, EXEC_URL)]);

        let url = index.resolve(&request(EXEC, None), None, &[]).unwrap();
        assert_eq!(url.as_str(), EXEC_URL);
    }

    #[tokio::test]
    async fn test_fetch_parses_index_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/4.0.0/plugins"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(std::collections::BTreeMap::from([(EXEC, EXEC_URL)])),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let index =
            PluginIndex::fetch_from(&client, &format!("{}/4.0.0/plugins", server.uri()))
                .await
                .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.identities().next(), Some(EXEC));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result = PluginIndex::fetch_from(&client, &server.uri()).await;
        assert!(matches!(result, Err(RegistryError::IndexMalformed { .. })));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result = PluginIndex::fetch_from(&client, &server.uri()).await;
        assert!(matches!(
            result,
            Err(RegistryError::IndexUnavailable { .. })
        ));
    }
}
