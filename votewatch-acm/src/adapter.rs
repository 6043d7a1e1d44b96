use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use url::Url;
use votewatch_core::{SessionConfig, VoteError};

/// A fetched page after redirects were followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpPage {
    /// URL of the last response in the redirect chain.
    pub final_url: Url,
    /// HTTP status of the last response.
    pub status: u16,
    /// Decoded body.
    pub body: String,
}

impl HttpPage {
    /// True for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Map a non-2xx status onto `HttpStatus`.
    ///
    /// # Errors
    /// Returns `HttpStatus` carrying the status and final URL.
    pub fn ensure_success(&self) -> Result<(), VoteError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(VoteError::HttpStatus {
                status: self.status,
                url: self.final_url.to_string(),
            })
        }
    }
}

/// HTTP transport abstraction (so tests can script the vendor).
///
/// A transport owns the cookie jar of one session. Redirects are followed
/// and the final URL is reported so callers can detect the login surface.
#[async_trait]
pub trait AcmTransport: Send + Sync {
    /// GET `url`.
    async fn get(&self, url: &Url) -> Result<HttpPage, VoteError>;

    /// POST `form` urlencoded to `url`.
    async fn post_form(&self, url: &Url, form: &[(String, String)])
    -> Result<HttpPage, VoteError>;

    /// True if the jar holds at least one cookie that would be sent to `url`.
    fn has_session_cookies(&self, url: &Url) -> bool;
}

/// Real transport backed by one `reqwest::Client` and its cookie jar.
/// `reqwest::Client` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone)]
pub struct RealTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl RealTransport {
    /// Build a client with a fresh cookie jar, the configured user agent,
    /// language header and per-request timeout.
    ///
    /// # Errors
    /// Returns `InvalidArg` for header values that are not valid HTTP and
    /// `Network` if the TLS backend cannot be initialized.
    pub fn new(config: &SessionConfig) -> Result<Self, VoteError> {
        let jar = Arc::new(Jar::default());
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).map_err(|e| {
                VoteError::InvalidArg(format!("accept_language is not a header value: {e}"))
            })?,
        );
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| map_reqwest_err(&e, "client build"))?;
        Ok(Self { client, jar })
    }

    async fn into_page(resp: reqwest::Response, context: &str) -> Result<HttpPage, VoteError> {
        let final_url = resp.url().clone();
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| map_reqwest_err(&e, context))?;
        Ok(HttpPage {
            final_url,
            status,
            body,
        })
    }
}

fn map_reqwest_err(e: &reqwest::Error, context: &str) -> VoteError {
    if e.is_timeout() {
        VoteError::network(format!("timeout: {context}"))
    } else if e.is_connect() {
        VoteError::network(format!("connect failed: {context}: {e}"))
    } else if e.is_redirect() {
        VoteError::network(format!("redirect loop: {context}"))
    } else {
        VoteError::network(format!("{context}: {e}"))
    }
}

#[async_trait]
impl AcmTransport for RealTransport {
    async fn get(&self, url: &Url) -> Result<HttpPage, VoteError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_reqwest_err(&e, url.path()))?;
        Self::into_page(resp, url.path()).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<HttpPage, VoteError> {
        let resp = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| map_reqwest_err(&e, url.path()))?;
        Self::into_page(resp, url.path()).await
    }

    fn has_session_cookies(&self, url: &Url) -> bool {
        self.jar.cookies(url).is_some()
    }
}
