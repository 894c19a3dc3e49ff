use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::html;

/// A successful response body, with the URL it was finally served from.
pub struct Fetched {
    pub url: Url,
    pub body: String,
}

/// Single-attempt HTTP GET with a bounded timeout. No retries.
pub struct Fetcher {
    client: Client,
    timeout_secs: u64,
}

impl Fetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub async fn get(&self, url: &Url) -> Result<Fetched, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !html::is_markup(&content_type) {
            return Err(FetchError::UnsupportedContent(content_type));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status.as_u16(),
            body.len(),
            start.elapsed().as_millis()
        );

        Ok(Fetched {
            url: final_url,
            body,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Transport(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> Fetcher {
        Fetcher::new(5, "osint_scraper-test").unwrap()
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> (Url, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        (Url::parse(&format!("http://{}/slow", addr)).unwrap(), handle)
    }

    #[tokio::test]
    async fn ok_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", "osint_scraper-test")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<p>hello</p>")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/page", server.url())).unwrap();
        let fetched = fetcher().get(&url).await.unwrap();
        assert_eq!(fetched.body, "<p>hello</p>");
        assert_eq!(fetched.url, url);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetcher().get(&url).await.err().unwrap();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn server_error_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/boom")
            .with_status(503)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/boom", server.url())).unwrap();
        let err = fetcher().get(&url).await.err().unwrap();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn binary_content_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.7")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/report.pdf", server.url())).unwrap();
        let err = fetcher().get(&url).await.err().unwrap();
        assert!(matches!(err, FetchError::UnsupportedContent(ct) if ct == "application/pdf"));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let err = fetcher().get(&url).await.err().unwrap();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn silent_server_is_timeout_error() {
        let (url, server) = silent_server().await;
        let fetcher = Fetcher::new(1, "osint_scraper-test").unwrap();

        let started = Instant::now();
        let err = fetcher.get(&url).await.err().unwrap();
        server.abort();

        assert!(matches!(err, FetchError::Timeout(1)), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
