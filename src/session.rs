//! Login session shared by every download attempt
//!
//! The session owns a cookie-aware HTTP client. Whatever state the login response sets
//! (cookies) is replayed on every later request made through the same [`Session`].

use crate::config::LoginConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, error, info};

/// Authenticated transport handle, created once per run
#[derive(Clone, Debug)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// Build a session without logging in
    ///
    /// `timeout` bounds each whole request; `None` keeps the transport default (no timeout).
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// POST the login form and return the session holding the resulting cookies
    ///
    /// Transport failures and 4xx/5xx answers are reported as [`Error::Connection`]. There is no
    /// retry.
    pub async fn authenticate(login: &LoginConfig, timeout: Option<Duration>) -> Result<Self> {
        let session = Self::new(timeout)?;
        session.login(login).await?;
        Ok(session)
    }

    /// Send the login POST through this session, returning the response status
    pub async fn login(&self, login: &LoginConfig) -> Result<u16> {
        let url = login.login_url();
        info!(url = %url, "now attempting to log in");

        let response = self
            .client
            .post(&url)
            .form(&login.login_form_data)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "unable to establish network connection");
                Error::Connection(format!("login request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        debug!(headers = ?response.headers(), "HTTP headers");

        if status.is_client_error() || status.is_server_error() {
            error!(url = %url, status = status.as_u16(), "login rejected");
            return Err(Error::Connection(format!(
                "login to {} returned status {}",
                url, status
            )));
        }

        info!(url = %url, status = status.as_u16(), "login succeeded");
        Ok(status.as_u16())
    }

    /// The underlying HTTP client
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
