//! Shared HTTP session with a browser-like request profile.

use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// User-Agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Text found in bot-protection interstitials served instead of real pages.
pub const CHALLENGE_MARKER: &str = "Verifying you are human";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
     image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Immutable header profile attached to every request.
///
/// Client-hint headers are deliberately absent: they would have to match the
/// browser the cookie was copied from.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    user_agent: HeaderValue,
    cookie: Option<HeaderValue>,
}

impl RequestProfile {
    /// Builds a profile. An empty cookie is treated as no cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the user agent or cookie contain characters that
    /// are not allowed in a header value.
    pub fn new(user_agent: &str, cookie: Option<&str>) -> Result<Self> {
        let mut cookie = cookie
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(HeaderValue::from_str)
            .transpose()?;
        // Keeps the cookie out of debug output.
        if let Some(cookie) = cookie.as_mut() {
            cookie.set_sensitive(true);
        }
        let user_agent = HeaderValue::from_str(user_agent.trim())?;
        Ok(Self { user_agent, cookie })
    }

    /// Returns true if a cookie will be sent.
    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    /// Returns the configured User-Agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.to_str().unwrap_or_default()
    }

    /// Builds the header set for one request, scoped to `referer`.
    #[must_use]
    pub fn headers(&self, referer: Option<&Url>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, self.user_agent.clone());
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        if let Some(value) = referer.and_then(|r| HeaderValue::from_str(r.as_str()).ok()) {
            headers.insert(header::REFERER, value);
        }
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, cookie.clone());
        }
        headers
    }
}

/// Fails with [`Error::VerificationChallenge`] if `body` is a bot-check page.
///
/// # Errors
///
/// Returns an error when the challenge marker is present.
pub fn detect_challenge(url: &Url, body: &str) -> Result<()> {
    if body.contains(CHALLENGE_MARKER) {
        return Err(Error::VerificationChallenge {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// HTTP session reused for every request of a run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    profile: RequestProfile,
    config: HttpConfig,
}

impl HttpClient {
    /// Builds the pooled client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(profile: RequestProfile, config: HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(8)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            inner,
            profile,
            config,
        })
    }

    /// Returns the header profile.
    #[must_use]
    pub const fn profile(&self) -> &RequestProfile {
        &self.profile
    }

    /// Fetches a page as text, failing on error statuses.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout or a non-success status.
    pub async fn get_text(&self, url: &Url, referer: Option<&Url>) -> Result<String> {
        log::debug!("GET {url}");
        let response = self
            .inner
            .get(url.clone())
            .headers(self.profile.headers(referer))
            .timeout(self.config.metadata_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetches an HTML page and rejects verification-challenge responses.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or when the challenge marker is present.
    pub async fn get_page(&self, url: &Url, referer: Option<&Url>) -> Result<String> {
        let body = self.get_text(url, referer).await?;
        detect_challenge(url, &body)?;
        Ok(body)
    }

    /// Fetches and decodes a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or if the body is not valid JSON.
    pub async fn get_json(&self, url: &Url) -> Result<serde_json::Value> {
        let body = self.get_text(url, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Starts a streamed download. Only the read timeout applies to the body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn get_stream(&self, url: &Url, referer: Option<&Url>) -> Result<reqwest::Response> {
        log::debug!("GET (stream) {url}");
        let response = self
            .inner
            .get(url.clone())
            .headers(self.profile.headers(referer))
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }
}
