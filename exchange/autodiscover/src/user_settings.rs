/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The SOAP `GetUserSettings` operation served at
//! `/autodiscover/autodiscover.svc`.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getusersettings-operation-soap>

use std::collections::BTreeMap;

use const_format::concatcp;
use ews::{
    request::read_envelope,
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace, AUTODISCOVER_NS_URI},
    ExchangeVersion, ValidationError,
};
use tracing::{debug, warn};

use crate::AutodiscoverError;

pub const GET_USER_SETTINGS_ACTION: &str = concatcp!(AUTODISCOVER_NS_URI, "/Autodiscover/GetUserSettings");

/// Settings which may be requested for a user.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/setting-soap>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum UserSettingName {
    UserDisplayName,
    #[xml_enum(rename = "UserDN")]
    UserDn,
    UserDeploymentId,
    #[xml_enum(rename = "AutoDiscoverSMTPAddress")]
    AutoDiscoverSmtpAddress,
    InternalMailboxServer,
    InternalEcpUrl,
    InternalEwsUrl,
    #[xml_enum(rename = "InternalOABUrl")]
    InternalOabUrl,
    ExternalMailboxServer,
    ExternalEcpUrl,
    ExternalEwsUrl,
    #[xml_enum(rename = "ExternalOABUrl")]
    ExternalOabUrl,
    EwsSupportedSchemas,
    CasVersion,
    #[xml_enum(rename = "MailboxDN")]
    MailboxDn,
    ActiveDirectoryServer,
    GroupingInformation,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/errorcode-soap>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum AutodiscoverErrorCode {
    NoError,
    RedirectAddress,
    RedirectUrl,
    InvalidUser,
    InvalidRequest,
    InvalidSetting,
    SettingIsNotAvailable,
    ServerBusy,
    InvalidDomain,
    NotFederated,
    #[xml_enum(fallback)]
    InternalServerError,
}

/// Writes a `GetUserSettings` request for `addresses`, to be posted to
/// `url`.
pub fn request_body(
    url: &str,
    addresses: &[String],
    settings: &[UserSettingName],
    version: ExchangeVersion,
) -> Result<Vec<u8>, AutodiscoverError> {
    if addresses.is_empty() {
        return Err(ews::Error::from(ValidationError::EmptyCollection("Users")).into());
    }
    if settings.is_empty() {
        return Err(ews::Error::from(ValidationError::EmptyCollection("RequestedSettings")).into());
    }

    let mut writer = EwsXmlWriter::new();
    writer.write_start_document()?;
    writer.write_start_element(XmlNamespace::Soap, "Envelope")?;

    writer.write_start_element(XmlNamespace::Soap, "Header")?;
    writer.write_element_enum(XmlNamespace::Autodiscover, "RequestedServerVersion", version)?;
    writer.write_element_value(XmlNamespace::WsAddressing, "Action", GET_USER_SETTINGS_ACTION)?;
    writer.write_element_value(XmlNamespace::WsAddressing, "To", url)?;
    writer.write_end_element()?;

    writer.write_start_element(XmlNamespace::Soap, "Body")?;
    writer.write_start_element(XmlNamespace::Autodiscover, "GetUserSettingsRequestMessage")?;
    writer.write_start_element(XmlNamespace::Autodiscover, "Request")?;

    writer.write_start_element(XmlNamespace::Autodiscover, "Users")?;
    for address in addresses {
        writer.write_start_element(XmlNamespace::Autodiscover, "User")?;
        writer.write_element_value(XmlNamespace::Autodiscover, "Mailbox", address)?;
        writer.write_end_element()?;
    }
    writer.write_end_element()?;

    writer.write_start_element(XmlNamespace::Autodiscover, "RequestedSettings")?;
    for setting in settings {
        writer.write_element_enum(XmlNamespace::Autodiscover, "Setting", *setting)?;
    }
    writer.write_end_element()?;

    writer.write_end_element()?;
    writer.write_end_element()?;
    writer.write_end_element()?;

    writer.write_end_element()?;
    Ok(writer.into_inner()?)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetUserSettingsResponse {
    /// One entry per user the server answered for, in the order the users
    /// were requested. Throttled servers may answer for fewer users than
    /// were requested.
    pub user_responses: Vec<UserResponse>,
}

impl GetUserSettingsResponse {
    pub fn response_for(&self, address: &str) -> Option<&UserResponse> {
        self.user_responses
            .iter()
            .find(|response| response.smtp_address.as_deref() == Some(address))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserResponse {
    /// The requested address this response answers, matched by position.
    pub smtp_address: Option<String>,
    pub error_code: AutodiscoverErrorCode,
    pub error_message: Option<String>,
    pub redirect_target: Option<String>,
    pub settings: BTreeMap<String, String>,
    pub setting_errors: Vec<UserSettingError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSettingError {
    pub setting_name: String,
    pub error_code: AutodiscoverErrorCode,
    pub error_message: Option<String>,
}

impl UserResponse {
    pub fn setting(&self, name: UserSettingName) -> Option<&str> {
        self.settings.get(name.as_xml_str()).map(String::as_str)
    }

    fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, ews::Error> {
        let mut response = Self {
            smtp_address: None,
            error_code: AutodiscoverErrorCode::NoError,
            error_message: None,
            redirect_target: None,
            settings: BTreeMap::new(),
            setting_errors: Vec::new(),
        };

        reader.read_children(|reader| {
            match reader.local_name() {
                "ErrorCode" => response.error_code = reader.read_element_value_as_enum()?,
                "ErrorMessage" => response.error_message = non_empty(reader.read_element_value()?),
                "RedirectTarget" => response.redirect_target = non_empty(reader.read_element_value()?),
                "UserSettings" => reader.read_children(|reader| read_setting(reader, &mut response.settings))?,
                "UserSettingErrors" => reader.read_children(|reader| {
                    if reader.local_name() == "UserSettingError" {
                        response.setting_errors.push(UserSettingError::read_from_xml(reader)?);
                        Ok(())
                    } else {
                        reader.skip_current_element()
                    }
                })?,
                _ => reader.skip_current_element()?,
            }
            Ok(())
        })?;

        Ok(response)
    }
}

impl UserSettingError {
    fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, ews::Error> {
        let mut error = Self {
            setting_name: String::new(),
            error_code: AutodiscoverErrorCode::InternalServerError,
            error_message: None,
        };

        reader.read_children(|reader| {
            match reader.local_name() {
                "SettingName" => error.setting_name = reader.read_element_value()?,
                "ErrorCode" => error.error_code = reader.read_element_value_as_enum()?,
                "ErrorMessage" => error.error_message = non_empty(reader.read_element_value()?),
                _ => reader.skip_current_element()?,
            }
            Ok(())
        })?;

        Ok(error)
    }
}

/// Reads a `UserSetting`. Only settings carrying a single `Value` are kept.
fn read_setting(reader: &mut EwsXmlReader<'_>, settings: &mut BTreeMap<String, String>) -> Result<(), ews::Error> {
    if reader.local_name() != "UserSetting" {
        return reader.skip_current_element();
    }

    let mut name = None;
    let mut value = None;
    reader.read_children(|reader| {
        match reader.local_name() {
            "Name" => name = Some(reader.read_element_value()?),
            "Value" => value = Some(reader.read_element_value()?),
            _ => reader.skip_current_element()?,
        }
        Ok(())
    })?;

    match (name, value) {
        (Some(name), Some(value)) => {
            settings.insert(name, value);
        }
        (name, None) => debug!("skipping setting {name:?} without a single value"),
        (None, Some(_)) => warn!("ignoring a user setting without a name"),
    }

    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Reads a `GetUserSettings` response, matching each user response to the
/// address requested at the same position.
pub fn parse_response(document: &[u8], requested: &[String]) -> Result<GetUserSettingsResponse, AutodiscoverError> {
    let mut error_code = AutodiscoverErrorCode::NoError;
    let mut error_message = None;
    let mut user_responses = Vec::new();

    read_envelope(document, |reader| {
        if reader.local_name() != "GetUserSettingsResponseMessage" {
            return reader.skip_current_element();
        }

        reader.read_children(|reader| {
            if reader.local_name() != "Response" {
                return reader.skip_current_element();
            }

            reader.read_children(|reader| {
                match reader.local_name() {
                    "ErrorCode" => error_code = reader.read_element_value_as_enum()?,
                    "ErrorMessage" => error_message = non_empty(reader.read_element_value()?),
                    "UserResponses" => reader.read_children(|reader| {
                        if reader.local_name() == "UserResponse" {
                            user_responses.push(UserResponse::read_from_xml(reader)?);
                            Ok(())
                        } else {
                            reader.skip_current_element()
                        }
                    })?,
                    _ => reader.skip_current_element()?,
                }
                Ok(())
            })
        })
    })?;

    if error_code != AutodiscoverErrorCode::NoError {
        return Err(AutodiscoverError::Server {
            code: error_code.as_xml_str().to_string(),
            message: error_message.unwrap_or_default(),
        });
    }

    if user_responses.len() != requested.len() {
        warn!(
            "requested settings for {} user(s) but received {} response(s)",
            requested.len(),
            user_responses.len()
        );
    }

    for (response, address) in user_responses.iter_mut().zip(requested) {
        response.smtp_address = Some(address.clone());
    }

    Ok(GetUserSettingsResponse { user_responses })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://autodiscover.contoso.com/autodiscover/autodiscover.svc";

    fn user_response(display_name: &str) -> String {
        format!(
            r#"<UserResponse>
                <ErrorCode>NoError</ErrorCode>
                <ErrorMessage>No error.</ErrorMessage>
                <RedirectTarget i:nil="true"/>
                <UserSettingErrors/>
                <UserSettings>
                    <UserSetting i:type="StringSetting">
                        <Name>UserDisplayName</Name>
                        <Value>{display_name}</Value>
                    </UserSetting>
                    <UserSetting i:type="StringSetting">
                        <Name>ExternalEwsUrl</Name>
                        <Value>https://mail.contoso.com/EWS/Exchange.asmx</Value>
                    </UserSetting>
                    <UserSetting i:type="WebClientUrlCollectionSetting">
                        <Name>ExternalWebClientUrls</Name>
                        <WebClientUrls/>
                    </UserSetting>
                </UserSettings>
            </UserResponse>"#
        )
    }

    fn document(error_code: &str, user_responses: &str) -> String {
        format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:a="http://www.w3.org/2005/08/addressing">
                <s:Header>
                    <a:Action s:mustUnderstand="1">http://schemas.microsoft.com/exchange/2010/Autodiscover/Autodiscover/GetUserSettingsResponse</a:Action>
                    <h:ServerVersionInfo xmlns:h="http://schemas.microsoft.com/exchange/2010/Autodiscover" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
                        <h:MajorVersion>15</h:MajorVersion>
                        <h:MinorVersion>20</h:MinorVersion>
                    </h:ServerVersionInfo>
                </s:Header>
                <s:Body>
                    <GetUserSettingsResponseMessage xmlns="http://schemas.microsoft.com/exchange/2010/Autodiscover">
                        <Response xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
                            <ErrorCode>{error_code}</ErrorCode>
                            <ErrorMessage/>
                            <UserResponses>{user_responses}</UserResponses>
                        </Response>
                    </GetUserSettingsResponseMessage>
                </s:Body>
            </s:Envelope>"#
        )
    }

    fn addresses(addresses: &[&str]) -> Vec<String> {
        addresses.iter().map(|address| address.to_string()).collect()
    }

    #[test]
    fn request_lists_users_and_settings() {
        let body = request_body(
            URL,
            &addresses(&["mara@contoso.com", "tomas@contoso.com"]),
            &[UserSettingName::UserDisplayName, UserSettingName::ExternalEwsUrl],
            ExchangeVersion::Exchange2013,
        )
        .unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.contains("<a:RequestedServerVersion>Exchange2013</a:RequestedServerVersion>"), "{body}");
        assert!(body.contains(&format!("<wsa:Action>{GET_USER_SETTINGS_ACTION}</wsa:Action>")));
        assert!(body.contains(&format!("<wsa:To>{URL}</wsa:To>")));
        assert!(body.contains(
            "<a:Users><a:User><a:Mailbox>mara@contoso.com</a:Mailbox></a:User>\
             <a:User><a:Mailbox>tomas@contoso.com</a:Mailbox></a:User></a:Users>"
        ));
        assert!(body.contains(
            "<a:RequestedSettings><a:Setting>UserDisplayName</a:Setting>\
             <a:Setting>ExternalEwsUrl</a:Setting></a:RequestedSettings>"
        ));
    }

    #[test]
    fn empty_requests_are_refused() {
        let error = request_body(URL, &[], &[UserSettingName::InternalEwsUrl], ExchangeVersion::Exchange2013)
            .unwrap_err();
        assert!(matches!(
            error,
            AutodiscoverError::Ews(ews::Error::Validation(ValidationError::EmptyCollection("Users")))
        ));

        let error = request_body(URL, &addresses(&["mara@contoso.com"]), &[], ExchangeVersion::Exchange2013)
            .unwrap_err();
        assert!(matches!(
            error,
            AutodiscoverError::Ews(ews::Error::Validation(ValidationError::EmptyCollection("RequestedSettings")))
        ));
    }

    #[test]
    fn responses_are_matched_to_addresses_by_position() {
        let requested = addresses(&["mara@contoso.com", "tomas@contoso.com"]);
        let document = document(
            "NoError",
            &format!("{}{}", user_response("Mara Whitley"), user_response("Tomas Lindqvist")),
        );

        let response = parse_response(document.as_bytes(), &requested).unwrap();
        assert_eq!(response.user_responses.len(), 2);

        let tomas = response.response_for("tomas@contoso.com").unwrap();
        assert_eq!(tomas.error_code, AutodiscoverErrorCode::NoError);
        assert_eq!(tomas.error_message.as_deref(), Some("No error."));
        assert_eq!(tomas.redirect_target, None);
        assert_eq!(tomas.setting(UserSettingName::UserDisplayName), Some("Tomas Lindqvist"));
        assert_eq!(
            tomas.setting(UserSettingName::ExternalEwsUrl),
            Some("https://mail.contoso.com/EWS/Exchange.asmx")
        );
        assert!(!tomas.settings.contains_key("ExternalWebClientUrls"));
    }

    #[test]
    fn throttled_responses_leave_the_remaining_addresses_unmatched() {
        let requested = addresses(&["mara@contoso.com", "tomas@contoso.com", "ines@contoso.com"]);
        let document = document(
            "NoError",
            &format!("{}{}", user_response("Mara Whitley"), user_response("Tomas Lindqvist")),
        );

        let response = parse_response(document.as_bytes(), &requested).unwrap();

        assert_eq!(response.user_responses.len(), 2);
        assert_eq!(response.user_responses[0].smtp_address.as_deref(), Some("mara@contoso.com"));
        assert_eq!(response.user_responses[1].smtp_address.as_deref(), Some("tomas@contoso.com"));
        assert!(response.response_for("ines@contoso.com").is_none());
    }

    #[test]
    fn per_user_and_per_setting_errors() {
        let requested = addresses(&["nobody@contoso.com"]);
        let document = document(
            "NoError",
            r#"<UserResponse>
                <ErrorCode>InvalidUser</ErrorCode>
                <ErrorMessage>Invalid user: 'nobody@contoso.com'</ErrorMessage>
                <RedirectTarget i:nil="true"/>
                <UserSettingErrors>
                    <UserSettingError>
                        <ErrorCode>SettingIsNotAvailable</ErrorCode>
                        <ErrorMessage>User setting 'CasVersion' is not available.</ErrorMessage>
                        <SettingName>CasVersion</SettingName>
                    </UserSettingError>
                </UserSettingErrors>
                <UserSettings/>
            </UserResponse>"#,
        );

        let response = parse_response(document.as_bytes(), &requested).unwrap();
        let user = response.response_for("nobody@contoso.com").unwrap();

        assert_eq!(user.error_code, AutodiscoverErrorCode::InvalidUser);
        assert!(user.settings.is_empty());
        assert_eq!(
            user.setting_errors,
            vec![UserSettingError {
                setting_name: String::from("CasVersion"),
                error_code: AutodiscoverErrorCode::SettingIsNotAvailable,
                error_message: Some(String::from("User setting 'CasVersion' is not available.")),
            }]
        );
    }

    #[test]
    fn request_level_errors_fail_the_whole_call() {
        let error = parse_response(document("ServerBusy", "").as_bytes(), &addresses(&["mara@contoso.com"]))
            .unwrap_err();

        assert!(matches!(error, AutodiscoverError::Server { code, .. } if code == "ServerBusy"));
    }
}
