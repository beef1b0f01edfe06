/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{collections::VecDeque, fmt};

use ews::{net::Credentials, ExchangeVersion};
use rand::Rng;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, info, trace};

use crate::{
    pox::{self, PoxResponse},
    srv::{find_srv_host, SrvResolver},
    user_settings::{self, GetUserSettingsResponse, UserSettingName, GET_USER_SETTINGS_ACTION},
    AutodiscoverError,
};

/// How many redirections a single discovery may follow.
pub const MAX_REDIRECTIONS: usize = 10;

/// The URLs to try, in order, for an address in `domain` before falling
/// back to DNS.
pub fn candidate_urls(domain: &str) -> Vec<String> {
    vec![
        format!("https://{domain}/autodiscover/autodiscover.xml"),
        format!("https://autodiscover.{domain}/autodiscover/autodiscover.xml"),
    ]
}

pub fn soap_url(host: &str) -> String {
    format!("https://{host}/autodiscover/autodiscover.svc")
}

/// Returns the domain part of an email address.
pub fn domain_of(email: &str) -> Result<&str, AutodiscoverError> {
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(domain),
        _ => Err(AutodiscoverError::InvalidAddress(email.to_string())),
    }
}

/// Finds EWS endpoints for email addresses.
pub struct AutodiscoverClient {
    client: Client,
    credentials: Option<Box<dyn Credentials>>,
    resolver: Option<Box<dyn SrvResolver>>,
    version: ExchangeVersion,
}

impl fmt::Debug for AutodiscoverClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutodiscoverClient")
            .field("credentials", &self.credentials)
            .field("has_resolver", &self.resolver.is_some())
            .field("version", &self.version)
            .finish()
    }
}

impl AutodiscoverClient {
    pub fn new() -> Result<Self, AutodiscoverError> {
        Ok(Self {
            client: Client::builder().build()?,
            credentials: None,
            resolver: None,
            version: ExchangeVersion::default(),
        })
    }

    pub fn with_credentials(mut self, credentials: impl Credentials + 'static) -> Self {
        self.set_credentials(credentials);
        self
    }

    pub fn set_credentials(&mut self, credentials: impl Credentials + 'static) {
        self.credentials = Some(Box::new(credentials));
    }

    /// Enables the DNS fallback once the usual URLs have failed.
    pub fn with_srv_resolver(mut self, resolver: impl SrvResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// The version requested from SOAP autodiscover.
    pub fn with_version(mut self, version: ExchangeVersion) -> Self {
        self.version = version;
        self
    }

    /// Finds the EWS endpoint for `email` using POX autodiscover.
    ///
    /// `rng` breaks ties between equally preferred SRV records.
    pub async fn discover_ews_url<R>(&self, email: &str, rng: &mut R) -> Result<String, AutodiscoverError>
    where
        R: Rng + Send + ?Sized,
    {
        let urls = candidate_urls(domain_of(email)?);
        self.discover_ews_url_at(&urls, email, rng).await
    }

    /// Like [`Self::discover_ews_url`], but starts from `urls` rather than
    /// the usual candidates for the address' domain.
    pub async fn discover_ews_url_at<R>(
        &self,
        urls: &[String],
        email: &str,
        rng: &mut R,
    ) -> Result<String, AutodiscoverError>
    where
        R: Rng + Send + ?Sized,
    {
        let mut email = email.to_string();
        let mut urls: VecDeque<String> = urls.iter().cloned().collect();
        let mut srv_tried = false;
        let mut redirections = 0;

        loop {
            let url = match urls.pop_front() {
                Some(url) => url,
                None if !srv_tried => {
                    srv_tried = true;
                    match self.srv_url(domain_of(&email)?, rng).await {
                        Some(url) => url,
                        None => break,
                    }
                }
                None => break,
            };

            let response = match self.get_pox_response(&url, &email).await {
                Ok(response) => response,
                Err(err @ (AutodiscoverError::Unauthorized | AutodiscoverError::Server { .. })) => return Err(err),
                Err(err) => {
                    debug!("autodiscover at {url} failed: {err}");
                    continue;
                }
            };

            match response {
                PoxResponse::Settings(settings) => {
                    let ews_url = settings.ews_url().ok_or_else(|| {
                        AutodiscoverError::InvalidResponse(String::from("no EWS URL in the account settings"))
                    })?;

                    info!("found EWS endpoint {ews_url} for {email}");
                    return Ok(ews_url.to_string());
                }
                PoxResponse::RedirectAddress(address) => {
                    redirections += 1;
                    if redirections > MAX_REDIRECTIONS {
                        return Err(AutodiscoverError::TooManyRedirects);
                    }

                    debug!("autodiscover redirected {email} to {address}");
                    urls = candidate_urls(domain_of(&address)?).into();
                    srv_tried = false;
                    email = address;
                }
                PoxResponse::RedirectUrl(target) => {
                    redirections += 1;
                    if redirections > MAX_REDIRECTIONS {
                        return Err(AutodiscoverError::TooManyRedirects);
                    }

                    debug!("autodiscover redirected from {url} to {target}");
                    urls.push_front(target);
                }
            }
        }

        Err(AutodiscoverError::NotFound(email))
    }

    /// Posts a POX request for `email` to `url`.
    pub async fn get_pox_response(&self, url: &str, email: &str) -> Result<PoxResponse, AutodiscoverError> {
        let body = self.post(url, pox::request_body(email)?, None).await?;
        pox::parse_response(&body)
    }

    /// Requests `settings` for each of `addresses` from the SOAP endpoint at
    /// `url`.
    pub async fn get_user_settings(
        &self,
        url: &str,
        addresses: &[String],
        settings: &[UserSettingName],
    ) -> Result<GetUserSettingsResponse, AutodiscoverError> {
        let request = user_settings::request_body(url, addresses, settings, self.version)?;
        let body = self.post(url, request, Some(GET_USER_SETTINGS_ACTION)).await?;
        user_settings::parse_response(body.as_bytes(), addresses)
    }

    async fn srv_url<R>(&self, domain: &str, rng: &mut R) -> Option<String>
    where
        R: Rng + Send + ?Sized,
    {
        let resolver = self.resolver.as_deref()?;
        match find_srv_host(resolver, domain, rng).await {
            Ok(host) => host.map(|host| format!("https://{host}/autodiscover/autodiscover.xml")),
            Err(err) => {
                debug!("no SRV fallback for {domain}: {err}");
                None
            }
        }
    }

    async fn post(&self, url: &str, body: Vec<u8>, soap_action: Option<&str>) -> Result<String, AutodiscoverError> {
        debug!(url, len = body.len(), "posting autodiscover request");
        trace!(body = %String::from_utf8_lossy(&body), "request body");

        let mut builder = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body);

        if let Some(action) = soap_action {
            builder = builder.header("SOAPAction", action);
        }
        if let Some(authorization) = self.credentials.as_ref().and_then(|credentials| credentials.authorization()) {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        let response = builder.send().await?;
        let status = response.status();

        // SOAP faults arrive with a 500 and are read from the body.
        let is_soap_fault = soap_action.is_some() && status == StatusCode::INTERNAL_SERVER_ERROR;
        if status == StatusCode::UNAUTHORIZED {
            return Err(AutodiscoverError::Unauthorized);
        } else if !status.is_success() && !is_soap_fault {
            return Err(AutodiscoverError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        trace!(%body, "response body");

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_start_with_the_domain_itself() {
        assert_eq!(
            candidate_urls("contoso.com"),
            [
                "https://contoso.com/autodiscover/autodiscover.xml",
                "https://autodiscover.contoso.com/autodiscover/autodiscover.xml",
            ]
        );
        assert_eq!(
            soap_url("autodiscover.contoso.com"),
            "https://autodiscover.contoso.com/autodiscover/autodiscover.svc"
        );
    }

    #[test]
    fn addresses_need_a_local_part_and_a_domain() {
        assert_eq!(domain_of("mara@contoso.com").unwrap(), "contoso.com");
        assert_eq!(domain_of("\"a@b\"@contoso.com").unwrap(), "contoso.com");

        for address in ["contoso.com", "@contoso.com", "mara@"] {
            assert!(matches!(domain_of(address), Err(AutodiscoverError::InvalidAddress(_))));
        }
    }
}
