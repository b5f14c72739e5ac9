use crate::error::{Error, Result};
use reqwest::Client;

pub const PROJECT: &str = "GloriousEggroll/proton-ge-custom";

pub fn default_source_url() -> String {
    format!("https://api.github.com/repos/{}/releases", PROJECT)
}

pub fn project_page_url() -> String {
    format!("https://github.com/{}", PROJECT)
}

pub fn user_agent() -> String {
    format!("geprotondl/{}", env!("CARGO_PKG_VERSION"))
}

/// Fetches the raw release listing body.
pub async fn fetch_releases(client: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("Fetching release database from: {}", url);

    let mut request = client
        .get(url)
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", user_agent());

    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        request = request.header("Authorization", format!("token {}", token));
        tracing::debug!("Using GITHUB_TOKEN");
    }

    let unavailable = |source| Error::SourceUnavailable {
        url: url.to_string(),
        source,
    };

    let response = request
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(unavailable)?;
    let body = response.bytes().await.map_err(unavailable)?;
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_body_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/releases")
            .match_header("user-agent", user_agent().as_str())
            .with_status(200)
            .with_body("[ ]")
            .create_async()
            .await;

        let body = fetch_releases(&Client::new(), &format!("{}/releases", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, b"[ ]");
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/releases")
            .with_status(403)
            .create_async()
            .await;

        let result = fetch_releases(&Client::new(), &format!("{}/releases", server.url())).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));
    }

    #[test]
    fn test_default_urls() {
        assert_eq!(
            default_source_url(),
            "https://api.github.com/repos/GloriousEggroll/proton-ge-custom/releases"
        );
        assert_eq!(
            project_page_url(),
            "https://github.com/GloriousEggroll/proton-ge-custom"
        );
    }
}
