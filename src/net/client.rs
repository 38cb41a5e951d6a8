// Key Server Client
// Blocking HTTP against the shared key and message endpoints

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use tracing::debug;

use super::models::{Key, Message};

/// Default key server, overridable with the MESSENGER_SERVER variable.
pub const DEFAULT_BASE_URL: &str = "http://kayrun.cs.rit.edu:5000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from key server round trips.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Transport failure: connect, timeout, or a body that would not parse.
    #[error("key server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server has no public key for the address.
    #[error("no key registered for {0}")]
    NoKey(String),

    /// The server has no message waiting for the address.
    #[error("no message waiting for {0}")]
    NoMessage(String),

    /// Any other non-success answer.
    #[error("key server returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// Blocking client for the key server's Key and Message endpoints.
pub struct KeyServerClient {
    http: Client,
    base_url: String,
}

impl KeyServerClient {
    /// Client against an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, NetError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    /// Client against MESSENGER_SERVER, or the default server when the
    /// variable is unset.
    pub fn from_env() -> Result<Self, NetError> {
        let base_url = std::env::var("MESSENGER_SERVER")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Publish a public key record under its address.
    pub fn put_key(&self, record: &Key) -> Result<(), NetError> {
        let url = format!("{}/Key/{}", self.base_url, record.email);
        debug!("PUT {}", url);
        let response = self.http.put(&url).json(record).send()?;
        expect_success(response, &url)?;
        Ok(())
    }

    /// Fetch the public key registered for an address.
    pub fn get_key(&self, email: &str) -> Result<Key, NetError> {
        let url = format!("{}/Key/{}", self.base_url, email);
        debug!("GET {}", url);
        let response = self.http.get(&url).send()?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(NetError::NoKey(email.to_string()));
        }

        let record: Key = expect_success(response, &url)?.json()?;
        if record.key.is_empty() {
            // The server answers an unknown address with an empty record
            return Err(NetError::NoKey(email.to_string()));
        }
        Ok(record)
    }

    /// Leave a message for an address, replacing any message waiting there.
    pub fn put_message(&self, record: &Message) -> Result<(), NetError> {
        let url = format!("{}/Message/{}", self.base_url, record.email);
        debug!("PUT {}", url);
        let response = self.http.put(&url).json(record).send()?;
        expect_success(response, &url)?;
        Ok(())
    }

    /// Fetch the message waiting for an address.
    pub fn get_message(&self, email: &str) -> Result<Message, NetError> {
        let url = format!("{}/Message/{}", self.base_url, email);
        debug!("GET {}", url);
        let response = self.http.get(&url).send()?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(NetError::NoMessage(email.to_string()));
        }

        let record: Message = expect_success(response, &url)?.json()?;
        if record.content.is_empty() {
            return Err(NetError::NoMessage(email.to_string()));
        }
        Ok(record)
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn expect_success(response: Response, url: &str) -> Result<Response, NetError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetError::Status {
            status,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let client = KeyServerClient::new("http://localhost:5000///").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_error_display() {
        let err = NetError::NoKey("alice@example.com".to_string());
        assert_eq!(err.to_string(), "no key registered for alice@example.com");

        let err = NetError::Status {
            status: StatusCode::BAD_GATEWAY,
            url: "http://localhost:5000/Key/x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "key server returned 502 Bad Gateway for http://localhost:5000/Key/x"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NetError>();
    }
}
