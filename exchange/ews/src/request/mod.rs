/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! SOAP envelopes, and the operations sent inside them.
//!
//! Writing a request and reading its response are kept apart: a request
//! borrows the objects it sends, while reading the response may need to
//! update those same objects.

use tracing::warn;

use crate::{
    property::PropertyBag,
    response::{ServiceResponse, SoapFault},
    schema::ObjectKind,
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error,
};

mod create;
mod delete;
mod find;
mod get;
mod get_streaming_events;
mod phone_call;
mod subscribe;
mod update;

pub(crate) use create::CreateObjects;
pub(crate) use delete::DeleteObjects;
pub use find::{FindItemsResults, ItemView};
pub(crate) use find::{read_find_item_response, FindItem};
pub(crate) use get::{read_get_response, GetObjects};
pub(crate) use get_streaming_events::{read_streaming_events_response, GetStreamingEvents};
pub use get_streaming_events::{ConnectionStatus, StreamingEventsResponse};
pub(crate) use phone_call::{read_phone_call_response, GetPhoneCallInformation};
pub(crate) use subscribe::{read_subscribe_response, SubscribeToStreamingNotifications, Unsubscribe};
pub(crate) use update::UpdateObjects;

/// An EWS operation, written as the single child of the SOAP body.
pub(crate) trait ServiceRequest {
    /// The operation's element name, e.g. `GetItem`.
    fn name(&self) -> &'static str;

    fn minimum_version(&self) -> ExchangeVersion {
        ExchangeVersion::Exchange2007Sp1
    }

    /// Checks the request before anything is sent.
    fn validate(&self, _version: ExchangeVersion) -> Result<(), Error> {
        Ok(())
    }

    fn write_attributes_to_xml(&self, _writer: &mut EwsXmlWriter) -> Result<(), Error> {
        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error>;
}

/// The server's description of itself, sent in every response header.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/serverversioninfo>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerVersionInfo {
    pub major_version: Option<i32>,
    pub minor_version: Option<i32>,
    pub major_build_number: Option<i32>,
    pub minor_build_number: Option<i32>,
    pub version: Option<String>,
}

impl ServerVersionInfo {
    fn read_from_xml(reader: &EwsXmlReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            major_version: reader.read_attribute_as("MajorVersion")?,
            minor_version: reader.read_attribute_as("MinorVersion")?,
            major_build_number: reader.read_attribute_as("MajorBuildNumber")?,
            minor_build_number: reader.read_attribute_as("MinorBuildNumber")?,
            version: reader.read_attribute_value("Version").map(str::to_string),
        })
    }
}

/// Checks that `request` can be sent to a server speaking `version`, then
/// writes it inside a SOAP envelope.
pub(crate) fn write_envelope<R>(request: &R, version: ExchangeVersion) -> Result<Vec<u8>, Error>
where
    R: ServiceRequest + ?Sized,
{
    if request.minimum_version() > version {
        return Err(Error::VersionMismatch {
            name: request.name(),
            minimum: request.minimum_version(),
            requested: version,
        });
    }
    request.validate(version)?;

    let mut writer = EwsXmlWriter::new();
    writer.write_start_document()?;
    writer.write_start_element(XmlNamespace::Soap, "Envelope")?;

    writer.write_start_element(XmlNamespace::Soap, "Header")?;
    writer.write_start_element(XmlNamespace::Types, "RequestServerVersion")?;
    writer.write_attribute_value("Version", version.as_xml_str())?;
    writer.write_end_element()?;
    writer.write_end_element()?;

    writer.write_start_element(XmlNamespace::Soap, "Body")?;
    writer.write_start_element(XmlNamespace::Messages, request.name())?;
    request.write_attributes_to_xml(&mut writer)?;
    request.write_elements_to_xml(&mut writer)?;
    writer.write_end_element()?;
    writer.write_end_element()?;

    writer.write_end_element()?;
    writer.into_inner()
}

/// Reads a SOAP envelope, handing the body's child element to `read_body`.
///
/// Returns the server version from the header, if present. A SOAP fault in
/// the body is returned as [`Error::SoapFault`].
pub fn read_envelope<F>(document: &[u8], mut read_body: F) -> Result<Option<ServerVersionInfo>, Error>
where
    F: FnMut(&mut EwsXmlReader<'_>) -> Result<(), Error>,
{
    let mut reader = EwsXmlReader::new(document);
    reader.read_start_element(XmlNamespace::Soap, "Envelope")?;

    let mut server_version = None;
    let mut fault = None;
    reader.read_children(|reader| match reader.local_name() {
        "Header" => reader.read_children(|reader| {
            if reader.local_name() == "ServerVersionInfo" {
                server_version = Some(ServerVersionInfo::read_from_xml(reader)?);
            }
            reader.skip_current_element()
        }),
        "Body" => reader.read_children(|reader| {
            if reader.is_start_element_named(XmlNamespace::Soap, "Fault") {
                fault = Some(SoapFault::read_from_xml(reader)?);
                Ok(())
            } else {
                read_body(reader)
            }
        }),
        _ => reader.skip_current_element(),
    })?;

    if let Some(fault) = fault {
        warn!(code = %fault.code, message = %fault.string, "request failed with a SOAP fault");
        return Err(Error::SoapFault(Box::new(fault)));
    }

    Ok(server_version)
}

/// Reads the `ResponseMessages` of an operation's response element.
///
/// Elements of each message other than the common ones are offered to
/// `read_element` along with the message's position, which matches the
/// position of the corresponding target in the request. Servers may return
/// fewer messages than there were targets.
pub(crate) fn read_response_messages<F>(
    reader: &mut EwsXmlReader<'_>,
    mut read_element: F,
) -> Result<Vec<ServiceResponse>, Error>
where
    F: FnMut(usize, &mut EwsXmlReader<'_>) -> Result<bool, Error>,
{
    let mut responses = Vec::new();

    reader.read_children(|reader| {
        if reader.local_name() != "ResponseMessages" {
            return reader.skip_current_element();
        }

        reader.read_children(|reader| {
            let index = responses.len();
            let response = ServiceResponse::read_from_xml(reader, |reader| read_element(index, reader))?;
            if response.is_error() {
                warn!(index, %response, "response message reported an error");
            }
            responses.push(response);

            Ok(())
        })
    })?;

    Ok(responses)
}

/// Turns the responses to a request with a single target into a result.
pub(crate) fn into_single_result(responses: Vec<ServiceResponse>) -> Result<(), Error> {
    responses
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedXml(String::from("the response contained no response messages")))?
        .into_result()
}

/// Reads the response to an operation creating or updating objects, merging
/// the identifiers the server returns into `bags`.
pub(crate) fn read_saved_objects_response(
    reader: &mut EwsXmlReader<'_>,
    kind: ObjectKind,
    bags: &mut [PropertyBag],
) -> Result<Vec<ServiceResponse>, Error> {
    read_response_messages(reader, |index, reader| {
        if reader.local_name() != kind.collection_element_name() {
            return Ok(false);
        }

        reader.read_children(|reader| match bags.get_mut(index) {
            Some(bag) => bag.load_from_xml(reader, false, None, false),
            None => reader.skip_current_element(),
        })?;

        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ResponseClass, ServiceError};

    struct Ping;

    impl ServiceRequest for Ping {
        fn name(&self) -> &'static str {
            "Ping"
        }

        fn minimum_version(&self) -> ExchangeVersion {
            ExchangeVersion::Exchange2010
        }

        fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
            writer.write_element_value(XmlNamespace::Messages, "Payload", "hello")
        }
    }

    #[test]
    fn envelopes_carry_the_requested_version() {
        let envelope = write_envelope(&Ping, ExchangeVersion::Exchange2013).unwrap();
        let text = String::from_utf8(envelope).unwrap();

        assert!(text.starts_with("<?xml"));
        assert!(text.contains(r#"<t:RequestServerVersion Version="Exchange2013""#), "{text}");
        assert!(text.contains("<soap:Body><m:Ping><m:Payload>hello</m:Payload></m:Ping></soap:Body>"));
    }

    #[test]
    fn requests_newer_than_the_server_are_refused() {
        assert!(matches!(
            write_envelope(&Ping, ExchangeVersion::Exchange2007Sp1),
            Err(Error::VersionMismatch { name: "Ping", .. })
        ));
    }

    #[test]
    fn faults_are_reported_as_errors() {
        let document = br#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>a:ErrorSchemaValidation</faultcode>
                        <faultstring>The request failed schema validation.</faultstring>
                    </s:Fault>
                </s:Body>
            </s:Envelope>"#;

        let result = read_envelope(document, |reader| reader.skip_current_element());
        match result {
            Err(Error::SoapFault(fault)) => assert_eq!(fault.string, "The request failed schema validation."),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn partial_batches_are_correlated_by_position() {
        let document = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Header>
                <h:ServerVersionInfo MajorVersion="15" MinorVersion="20" MajorBuildNumber="7452" MinorBuildNumber="28"
                    Version="V2018_01_08" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/>
            </s:Header>
            <s:Body>
                <m:DeleteItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
                    <m:ResponseMessages>
                        <m:DeleteItemResponseMessage ResponseClass="Success">
                            <m:ResponseCode>NoError</m:ResponseCode>
                        </m:DeleteItemResponseMessage>
                        <m:DeleteItemResponseMessage ResponseClass="Error">
                            <m:MessageText>The specified object was not found in the store.</m:MessageText>
                            <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                        </m:DeleteItemResponseMessage>
                    </m:ResponseMessages>
                </m:DeleteItemResponse>
            </s:Body>
        </s:Envelope>"#;

        let mut responses = Vec::new();
        let server_version = read_envelope(document, |reader| {
            responses = read_response_messages(reader, |_, _| Ok(false))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(server_version.and_then(|info| info.major_version), Some(15));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].class, ResponseClass::Success);
        assert_eq!(responses[1].code, ServiceError::ErrorItemNotFound);
        assert!(into_single_result(responses).is_ok());
    }
}
