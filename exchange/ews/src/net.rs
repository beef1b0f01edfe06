/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{fmt, time::Duration};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, trace};

use crate::Error;

/// The Office 365 EWS endpoint.
pub const OFFICE365_ENDPOINT: &str = "https://outlook.office365.com/EWS/Exchange.asmx";

/// A SOAP envelope ready to be posted to an EWS endpoint.
#[derive(Clone, Debug)]
pub struct SoapRequest {
    pub url: String,
    pub body: Vec<u8>,

    /// The value of the `Authorization` header, if any.
    pub authorization: Option<String>,

    /// How long to wait for the complete response. Defaults to the
    /// transport's own timeout.
    pub timeout: Option<Duration>,
}

/// The body of a response, delivered as it arrives.
pub type ResponseStream = BoxStream<'static, Result<Vec<u8>, Error>>;

/// Carries requests to the server.
///
/// Both successful responses and SOAP faults (which EWS reports with an HTTP
/// 500) are returned as bodies; other statuses are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: SoapRequest) -> Result<Vec<u8>, Error>;

    /// Sends a request whose response is a long-lived stream of envelopes.
    async fn send_streaming(&self, request: SoapRequest) -> Result<ResponseStream, Error>;
}

/// Applies a user's credentials to outgoing requests.
///
/// Token acquisition and message signing happen outside this crate: an
/// implementation only hands over what it already holds.
pub trait Credentials: Send + Sync + fmt::Debug {
    /// The `Authorization` header value to send, if any.
    fn authorization(&self) -> Option<String>;

    /// Gives the credentials a chance to sign the serialized envelope before
    /// it is sent, e.g. with WS-Security.
    fn sign_envelope(&self, envelope: Vec<u8>) -> Result<Vec<u8>, Error> {
        Ok(envelope)
    }
}

/// Username and password sent with HTTP Basic authentication.
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials for BasicCredentials {
    fn authorization(&self) -> Option<String> {
        let encoded = BASE64.encode(format!("{}:{}", self.username, self.password));
        Some(format!("Basic {encoded}"))
    }
}

/// An OAuth 2.0 access token obtained by the caller.
#[derive(Clone)]
pub struct OAuthCredentials {
    token: String,
}

impl OAuthCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials").finish_non_exhaustive()
    }
}

impl Credentials for OAuthCredentials {
    fn authorization(&self) -> Option<String> {
        Some(format!("Bearer {}", self.token))
    }
}

/// A [`Transport`] over HTTPS using `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().build()?;

        Ok(Self { client, timeout })
    }

    async fn post(&self, request: SoapRequest) -> Result<reqwest::Response, Error> {
        debug!(url = %request.url, len = request.body.len(), "posting SOAP request");
        trace!(body = %String::from_utf8_lossy(&request.body), "request body");

        let mut builder = self
            .client
            .post(&request.url)
            .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .timeout(request.timeout.unwrap_or(self.timeout))
            .body(request.body);

        if let Some(authorization) = request.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::INTERNAL_SERVER_ERROR {
            Ok(response)
        } else {
            Err(Error::HttpStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SoapRequest) -> Result<Vec<u8>, Error> {
        let response = self.post(request).await?;
        let body = response.bytes().await?;
        trace!(body = %String::from_utf8_lossy(&body), "response body");

        Ok(body.to_vec())
    }

    async fn send_streaming(&self, request: SoapRequest) -> Result<ResponseStream, Error> {
        let response = self.post(request).await?;

        Ok(response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(Error::from)
            .boxed())
    }
}
