//! HG659 session client
//!
//! A session moves through three states: a fresh client has no CSRF pair,
//! `bootstrap` fetches the landing page for cookies and the pair, and
//! `login` authenticates, after which the read operations work until the
//! device expires the session.

use crate::config::HttpConfig;
use crate::device::DeviceApi;
use crate::error::{Error, Result};
use crate::http::{read_body, HttpClient};
use crate::models::{
    Csrf, DeviceInfo, Envelope, Host, LoginRequest, LoginResponse, RawDeviceInfo, RawHost,
};
use crate::parser;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

const LANDING_PATH: &str = "/";
const LOGIN_PATH: &str = "/api/system/user_login";
const HEARTBEAT_PATH: &str = "/api/system/heartbeat";
const DEVICE_INFO_PATH: &str = "/api/system/deviceinfo";
const HOST_INFO_PATH: &str = "/api/system/HostInfo";

/// A cookie-bearing session with one HG659 device
pub struct Hg659Client {
    http: HttpClient,
    csrf: RwLock<Csrf>,
}

impl Hg659Client {
    /// Create an unbootstrapped session for `http://<host>/`
    pub fn new(host: &str, cfg: &HttpConfig) -> Result<Self> {
        let base = Url::parse(&format!("http://{}/", host))
            .map_err(|e| Error::protocol(format!("invalid device host {:?}: {}", host, e)))?;
        Self::with_base_url(base, cfg)
    }

    pub fn with_base_url(base: Url, cfg: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base, cfg)?,
            csrf: RwLock::new(Csrf::default()),
        })
    }

    /// New session, bootstrapped and logged in
    pub async fn connect(
        host: &str,
        username: &str,
        password: &str,
        cfg: &HttpConfig,
    ) -> Result<Self> {
        let client = Self::new(host, cfg)?;
        client.bootstrap().await?;
        client.login(username, password).await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        self.http.base()
    }

    /// Snapshot of the CSRF pair currently in effect
    pub async fn csrf(&self) -> Csrf {
        self.csrf.read().await.clone()
    }

    /// Fetch the landing page to pick up session cookies and the CSRF pair
    ///
    /// Cookies from the landing page are only kept when the session has
    /// none yet, so bootstrapping again does not drop an established session.
    pub async fn bootstrap(&self) -> Result<()> {
        let resp = self.http.get_landing(LANDING_PATH).await?;
        let body = read_body(resp).await?;
        let csrf = parser::extract_csrf(&body)?;
        if !csrf.is_complete() {
            tracing::warn!("Landing page carries no complete CSRF pair");
        }
        *self.csrf.write().await = csrf;

        tracing::info!("Session bootstrapped with {}", self.http.base());
        Ok(())
    }

    /// Authenticate with the current CSRF pair
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let csrf = self.csrf().await;
        if !csrf.is_complete() {
            return Err(Error::protocol(
                "no CSRF pair available, bootstrap the session first",
            ));
        }

        let request = LoginRequest::new(username, password, &csrf);
        let resp = self
            .http
            .post_json(
                LOGIN_PATH,
                &Envelope {
                    csrf: &csrf,
                    data: &request,
                },
            )
            .await?;
        let body = read_body(resp).await?;
        let resp: LoginResponse = serde_json::from_slice(parser::unwrap_envelope(&body))?;

        if let Some(fresh) = resp.csrf() {
            tracing::debug!("Device rotated the CSRF pair");
            *self.csrf.write().await = fresh;
        }

        match resp.error_category.as_deref() {
            Some("ok") => {}
            other => return Err(Error::auth(other.unwrap_or_default())),
        }
        if resp.error_code != 0 {
            return Err(Error::auth("unknown error"));
        }

        tracing::info!("Logged in as {}", username);
        Ok(())
    }

    pub async fn heartbeat(&self) -> Result<()> {
        let resp = self.http.get(HEARTBEAT_PATH).await?;
        read_body(resp).await?;
        Ok(())
    }

    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let raw: RawDeviceInfo = self.get_json(DEVICE_INFO_PATH).await?;
        Ok(raw.into())
    }

    /// Known hosts; one malformed record fails the whole call
    pub async fn hosts(&self) -> Result<Vec<Host>> {
        let raw: Vec<RawHost> = self.get_json(HOST_INFO_PATH).await?;
        raw.into_iter().map(Host::try_from).collect()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.http.get(path).await?;
        let body = read_body(resp).await?;
        Ok(serde_json::from_slice(parser::unwrap_envelope(&body))?)
    }
}

#[async_trait]
impl DeviceApi for Hg659Client {
    async fn device_info(&self) -> Result<DeviceInfo> {
        Hg659Client::device_info(self).await
    }

    async fn hosts(&self) -> Result<Vec<Host>> {
        Hg659Client::hosts(self).await
    }

    async fn heartbeat(&self) -> Result<()> {
        Hg659Client::heartbeat(self).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        self.bootstrap().await?;
        self.login(username, password).await
    }
}
