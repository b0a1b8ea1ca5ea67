//! HTTP client scoped to one device, with timeouts and an explicit cookie jar

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, ClientBuilder, Response, Url};
use std::sync::Arc;
use std::time::Duration;

/// Cookie store for the landing page: sends the session's cookies but only
/// stores new ones while the jar holds none for the device
struct FirstCookies(Arc<Jar>);

impl CookieStore for FirstCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if self.0.cookies(url).is_some() {
            tracing::debug!("Session cookies already present, ignoring landing page cookies");
            return;
        }
        self.0.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.0.cookies(url)
    }
}

pub struct HttpClient {
    inner: Client,
    landing: Client,
    base: Url,
}

impl HttpClient {
    pub fn new(base: Url, cfg: &HttpConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        Ok(Self {
            inner: builder(cfg).cookie_provider(jar.clone()).build()?,
            landing: builder(cfg)
                .cookie_provider(Arc::new(FirstCookies(jar)))
                .build()?,
            base,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::protocol(format!("invalid path {:?}: {}", path, e)))
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        tracing::debug!("GET {}", url);
        Ok(self.inner.get(url).send().await?)
    }

    /// GET that keeps an established session's cookies over the response's
    pub async fn get_landing(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        tracing::debug!("GET {}", url);
        Ok(self.landing.get(url).send().await?)
    }

    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response> {
        let url = self.url(path)?;
        tracing::debug!("POST {}", url);
        Ok(self
            .inner
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .json(body)
            .send()
            .await?)
    }
}

fn builder(cfg: &HttpConfig) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0"),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .timeout(Duration::from_secs(cfg.timeout))
        .connect_timeout(Duration::from_secs(cfg.connect_timeout))
        .default_headers(headers)
}

/// Read the full body, logging unexpected statuses
///
/// The device reports most failures in-band, so a non-2xx status is not
/// an error by itself.
pub async fn read_body(resp: Response) -> Result<Vec<u8>> {
    let status = resp.status();
    if !status.is_success() {
        tracing::warn!("{} returned {}", resp.url().path(), status);
    }
    Ok(resp.bytes().await?.to_vec())
}
