//! HTTP client for the marketplace deposit flow.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! shared types do not pull in `reqwest` and `scraper`.

mod deposit;
mod history;

use reqwest::header::{ACCEPT, COOKIE, REFERER, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
pub use crate::objects::DEPOSIT_PATH;
use crate::objects::ValidationError;
use crate::scrape::ScrapeError;
use crate::session::SessionCookies;

/// Target of the deposit form.
pub const PAYMENT_METHOD_PATH: &str = "/payment/method";
/// Payment history table.
pub const PAYMENT_LIST_PATH: &str = "/payment/list";

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Errors produced by [`PaymentClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The marketplace answered with something other than `200 OK`.
    #[error("unexpected status {status}")]
    Status { status: StatusCode },

    /// The marketplace served its login form instead of the requested page.
    #[error("authorization failed: the session is not logged in, cookies are missing or expired")]
    Unauthenticated,

    /// The response did not have the expected structure.
    #[error("parse error: {0}")]
    Parse(#[from] ScrapeError),

    /// The request was rejected locally, nothing was sent.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Broad class of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Auth,
    Parse,
    Validation,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::Url(_) => {
                ErrorKind::Network
            }
            ClientError::Unauthenticated => ErrorKind::Auth,
            ClientError::Parse(_) => ErrorKind::Parse,
            ClientError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Status code of a non-`200` response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Client acting as the logged-in browser behind `cookies`.
///
/// Every operation is a single attempt: no retries, no caching of tokens,
/// no timeouts beyond those of the injected `reqwest::Client`. Log events
/// are emitted inside the span given to [`with_span`](Self::with_span).
#[derive(Debug, Clone)]
pub struct PaymentClient {
    http: Client,
    config: ClientConfig,
    cookies: SessionCookies,
    span: tracing::Span,
}

impl PaymentClient {
    pub fn new(cookies: SessionCookies, config: ClientConfig) -> Self {
        let span = tracing::info_span!("lzpay", base_url = %config.base_url);
        Self {
            http: Client::new(),
            config,
            cookies,
            span,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Emit this client's log events inside `span`.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Request carrying the browser identity and the session cookies.
    fn browser_request(
        &self,
        method: Method,
        url: Url,
        accept: &'static str,
        referer: &Url,
    ) -> RequestBuilder {
        let request = self
            .http
            .request(method, url)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(ACCEPT, accept)
            .header(REFERER, referer.as_str());
        match self.cookies.header_value() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    /// `GET` an HTML page, requiring `200 OK`.
    async fn fetch_html(&self, path: &str) -> Result<String, ClientError> {
        let url = self.endpoint(path)?;
        let referer = self.endpoint("/")?;
        debug!(%url, "Fetching page");

        let resp = self
            .browser_request(Method::GET, url, HTML_ACCEPT, &referer)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status { status });
        }
        Ok(resp.text().await?)
    }
}
