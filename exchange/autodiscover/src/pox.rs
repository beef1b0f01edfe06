/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The plain-old-XML autodiscover protocol served at
//! `/autodiscover/autodiscover.xml`.
//!
//! Request: <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/pox-autodiscover-request-for-exchange>
//! Response: <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/pox-autodiscover-response-for-exchange>

use serde::Deserialize;
use xml::writer::{EmitterConfig, XmlEvent};

use crate::AutodiscoverError;

pub const REQUEST_SCHEMA: &str = "http://schemas.microsoft.com/exchange/autodiscover/outlook/requestschema/2006";
pub const RESPONSE_SCHEMA: &str = "http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a";

/// Writes the request body asking for the settings of `email`.
pub fn request_body(email: &str) -> Result<Vec<u8>, AutodiscoverError> {
    let mut buf = Vec::new();
    let mut writer = EmitterConfig::new()
        .perform_indent(false)
        .create_writer(&mut buf);

    let events: [XmlEvent; 10] = [
        XmlEvent::start_element("Autodiscover").default_ns(REQUEST_SCHEMA).into(),
        XmlEvent::start_element("Request").into(),
        XmlEvent::start_element("EMailAddress").into(),
        XmlEvent::characters(email),
        XmlEvent::end_element().into(),
        XmlEvent::start_element("AcceptableResponseSchema").into(),
        XmlEvent::characters(RESPONSE_SCHEMA),
        XmlEvent::end_element().into(),
        XmlEvent::end_element().into(),
        XmlEvent::end_element().into(),
    ];

    for event in events {
        writer.write(event)?;
    }

    Ok(buf)
}

/// What the server told us to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoxResponse {
    Settings(PoxSettings),

    /// Autodiscover should start over with another email address.
    RedirectAddress(String),

    /// The same address should be posted to another autodiscover URL.
    RedirectUrl(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoxSettings {
    pub display_name: Option<String>,
    pub smtp_address: Option<String>,
    pub internal_ews_url: Option<String>,
    pub external_ews_url: Option<String>,
}

impl PoxSettings {
    /// The EWS endpoint to use, preferring the one reachable from outside
    /// the organization.
    pub fn ews_url(&self) -> Option<&str> {
        self.external_ews_url
            .as_deref()
            .or(self.internal_ews_url.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AutodiscoverDocument {
    response: ResponseDocument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseDocument {
    error: Option<ErrorDocument>,
    user: Option<UserDocument>,
    account: Option<AccountDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorDocument {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserDocument {
    display_name: Option<String>,

    #[serde(rename(deserialize = "AutoDiscoverSMTPAddress"))]
    smtp_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountDocument {
    action: Option<Action>,
    redirect_addr: Option<String>,
    redirect_url: Option<String>,

    #[serde(default, rename(deserialize = "Protocol"))]
    protocols: Vec<ProtocolDocument>,
}

#[derive(Debug)]
enum Action {
    Settings,
    RedirectAddr,
    RedirectUrl,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.trim() {
            "settings" => Ok(Self::Settings),
            "redirectAddr" => Ok(Self::RedirectAddr),
            "redirectUrl" => Ok(Self::RedirectUrl),
            _ => Err(serde::de::Error::custom("unsupported Action")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProtocolDocument {
    #[serde(rename(deserialize = "Type"))]
    kind: String,

    ews_url: Option<String>,

    #[serde(rename(deserialize = "ASUrl"))]
    as_url: Option<String>,
}

impl ProtocolDocument {
    fn ews_url(self) -> Option<String> {
        self.ews_url.or(self.as_url)
    }
}

pub fn parse_response(body: &str) -> Result<PoxResponse, AutodiscoverError> {
    let document: AutodiscoverDocument = serde_xml_rs::from_str(body)?;
    let response = document.response;

    if let Some(error) = response.error {
        return Err(AutodiscoverError::Server {
            code: error.error_code.unwrap_or_default(),
            message: error.message.unwrap_or_default(),
        });
    }

    let account = response
        .account
        .ok_or_else(|| AutodiscoverError::InvalidResponse(String::from("no Account element")))?;

    match account.action {
        Some(Action::RedirectAddr) => account
            .redirect_addr
            .map(PoxResponse::RedirectAddress)
            .ok_or_else(|| AutodiscoverError::InvalidResponse(String::from("redirectAddr without RedirectAddr"))),
        Some(Action::RedirectUrl) => account
            .redirect_url
            .map(PoxResponse::RedirectUrl)
            .ok_or_else(|| AutodiscoverError::InvalidResponse(String::from("redirectUrl without RedirectUrl"))),
        Some(Action::Settings) | None => {
            let mut settings = PoxSettings::default();
            if let Some(user) = response.user {
                settings.display_name = user.display_name;
                settings.smtp_address = user.smtp_address;
            }

            for protocol in account.protocols {
                match protocol.kind.as_str() {
                    "EXCH" => settings.internal_ews_url = protocol.ews_url(),
                    "EXPR" => settings.external_ews_url = protocol.ews_url(),
                    _ => {}
                }
            }

            Ok(PoxResponse::Settings(settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(response: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
                <Response xmlns="{RESPONSE_SCHEMA}">{response}</Response>
            </Autodiscover>"#
        )
    }

    #[test]
    fn request_names_the_address() {
        let body = String::from_utf8(request_body("mara@contoso.com").unwrap()).unwrap();

        assert!(body.contains(&format!(r#"<Autodiscover xmlns="{REQUEST_SCHEMA}">"#)), "{body}");
        assert!(body.contains("<EMailAddress>mara@contoso.com</EMailAddress>"));
        assert!(body.contains(&format!("<AcceptableResponseSchema>{RESPONSE_SCHEMA}</AcceptableResponseSchema>")));
    }

    #[test]
    fn settings_carry_both_ews_urls() {
        let response = parse_response(&document(
            r#"<User>
                <DisplayName>Mara Whitley</DisplayName>
                <AutoDiscoverSMTPAddress>mara@contoso.com</AutoDiscoverSMTPAddress>
            </User>
            <Account>
                <AccountType>email</AccountType>
                <Action>settings</Action>
                <Protocol>
                    <Type>EXCH</Type>
                    <Server>ex01.contoso.local</Server>
                    <ASUrl>https://ex01.contoso.local/EWS/Exchange.asmx</ASUrl>
                </Protocol>
                <Protocol>
                    <Type>EXPR</Type>
                    <Server>mail.contoso.com</Server>
                    <EwsUrl>https://mail.contoso.com/EWS/Exchange.asmx</EwsUrl>
                </Protocol>
            </Account>"#,
        ))
        .unwrap();

        let PoxResponse::Settings(settings) = response else {
            panic!("unexpected response {response:?}");
        };
        assert_eq!(settings.display_name.as_deref(), Some("Mara Whitley"));
        assert_eq!(settings.smtp_address.as_deref(), Some("mara@contoso.com"));
        assert_eq!(
            settings.internal_ews_url.as_deref(),
            Some("https://ex01.contoso.local/EWS/Exchange.asmx")
        );
        assert_eq!(settings.ews_url(), Some("https://mail.contoso.com/EWS/Exchange.asmx"));
    }

    #[test]
    fn redirections() {
        let address = parse_response(&document(
            r#"<Account>
                <Action>redirectAddr</Action>
                <RedirectAddr>mara@eu.contoso.com</RedirectAddr>
            </Account>"#,
        ))
        .unwrap();
        assert_eq!(address, PoxResponse::RedirectAddress(String::from("mara@eu.contoso.com")));

        let url = parse_response(&document(
            r#"<Account>
                <Action>redirectUrl</Action>
                <RedirectUrl>https://autodiscover.eu.contoso.com/autodiscover/autodiscover.xml</RedirectUrl>
            </Account>"#,
        ))
        .unwrap();
        assert_eq!(
            url,
            PoxResponse::RedirectUrl(String::from(
                "https://autodiscover.eu.contoso.com/autodiscover/autodiscover.xml"
            ))
        );
    }

    #[test]
    fn errors_are_reported_with_their_code() {
        let error = parse_response(&document(
            r#"<Error Time="16:38:28.1523123" Id="2779409718">
                <ErrorCode>500</ErrorCode>
                <Message>The e-mail address cannot be found.</Message>
            </Error>"#,
        ))
        .unwrap_err();

        match error {
            AutodiscoverError::Server { code, message } => {
                assert_eq!(code, "500");
                assert_eq!(message, "The e-mail address cannot be found.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
