/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{collections::BTreeMap, fmt};

use tracing::warn;

use crate::{
    xml::{EwsXmlReader, XmlEnum, XmlNamespace},
    Error,
};

/// The overall outcome of a single response message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responseclass>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

/// An error code reported by Exchange.
///
/// Codes this crate does not know are reported as
/// [`ServiceError::ErrorInternalServerError`].
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsecode>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum ServiceError {
    NoError,
    ErrorAccessDenied,
    ErrorConnectionFailed,
    ErrorCorruptData,
    ErrorExceededConnectionCount,
    ErrorExpiredSubscription,
    ErrorFolderExists,
    ErrorFolderNotFound,
    ErrorIncorrectUpdatePropertyCount,
    #[xml_enum(fallback)]
    ErrorInternalServerError,
    ErrorInternalServerTransientError,
    ErrorInvalidChangeKey,
    ErrorInvalidId,
    ErrorInvalidIdMalformed,
    ErrorInvalidPropertyRequest,
    ErrorInvalidPropertySet,
    ErrorInvalidRequest,
    ErrorInvalidServerVersion,
    ErrorInvalidSubscription,
    ErrorInvalidSubscriptionRequest,
    ErrorIrresolvableConflict,
    ErrorItemNotFound,
    ErrorMailboxMoveInProgress,
    ErrorMissedNotificationEvents,
    ErrorNoRespondingCASInDestinationSite,
    ErrorProxyRequestNotAllowed,
    ErrorSchemaValidation,
    ErrorServerBusy,
    ErrorSubscriptionAccessDenied,
    ErrorSubscriptionNotFound,
    ErrorSubscriptionUnsubscribed,
    ErrorTimeoutExpired,
}

/// The common part of every EWS response message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsemessages>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceResponse {
    pub class: ResponseClass,
    pub code: ServiceError,
    pub message: Option<String>,

    /// Key/value pairs from the message's `MessageXml` element.
    pub details: BTreeMap<String, String>,
}

impl Default for ServiceResponse {
    fn default() -> Self {
        Self {
            class: ResponseClass::Success,
            code: ServiceError::NoError,
            message: None,
            details: BTreeMap::new(),
        }
    }
}

impl ServiceResponse {
    pub fn is_error(&self) -> bool {
        self.class == ResponseClass::Error
    }

    /// Turns an error response into an [`Error::Service`].
    pub fn into_result(self) -> Result<(), Error> {
        match self.class {
            ResponseClass::Error => Err(Error::Service(Box::new(self))),
            ResponseClass::Warning => {
                warn!(code = self.code.as_xml_str(), message = ?self.message, "EWS returned a warning");
                Ok(())
            }
            ResponseClass::Success => Ok(()),
        }
    }

    /// Reads a response message element, passing any element other than the
    /// common ones to `read_element`. Elements `read_element` doesn't
    /// recognize are skipped.
    pub(crate) fn read_from_xml<F>(reader: &mut EwsXmlReader<'_>, mut read_element: F) -> Result<Self, Error>
    where
        F: FnMut(&mut EwsXmlReader<'_>) -> Result<bool, Error>,
    {
        let mut response = ServiceResponse {
            class: reader
                .read_attribute_enum("ResponseClass")?
                .unwrap_or(ResponseClass::Success),
            ..Default::default()
        };

        reader.read_children(|reader| {
            match reader.local_name() {
                "MessageText" => response.message = Some(reader.read_element_value()?),
                "ResponseCode" => response.code = reader.read_element_value_as_enum()?,
                "MessageXml" => read_message_xml(reader, &mut response.details)?,
                _ => {
                    if !read_element(reader)? {
                        reader.skip_current_element()?;
                    }
                }
            }

            Ok(())
        })?;

        Ok(response)
    }
}

impl fmt::Display for ServiceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code.as_xml_str())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        Ok(())
    }
}

/// A structured representation of a SOAP fault.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383507>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SoapFault {
    pub code: String,
    pub string: String,
    pub actor: Option<String>,

    /// The EWS error code from the fault's `detail`, if any.
    pub response_code: Option<ServiceError>,

    /// The EWS error message from the fault's `detail`, if any.
    pub message: Option<String>,

    /// Key/value pairs from the detail's `MessageXml` element.
    pub details: BTreeMap<String, String>,
}

impl SoapFault {
    /// Reads a `soap:Fault` element.
    pub(crate) fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, Error> {
        let mut fault = SoapFault::default();

        reader.read_children(|reader| {
            match reader.local_name() {
                "faultcode" => fault.code = reader.read_element_value()?,
                "faultstring" => fault.string = reader.read_element_value()?,
                "faultactor" => fault.actor = Some(reader.read_element_value()?),
                "detail" => reader.read_children(|reader| {
                    match reader.local_name() {
                        "ResponseCode" => fault.response_code = Some(reader.read_element_value_as_enum()?),
                        "Message" => fault.message = Some(reader.read_element_value()?),
                        "MessageXml" => read_message_xml(reader, &mut fault.details)?,
                        _ => reader.skip_current_element()?,
                    }

                    Ok(())
                })?,
                _ => reader.skip_current_element()?,
            }

            Ok(())
        })?;

        Ok(fault)
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.string, self.code)
    }
}

/// Flattens a `MessageXml` element into name/value pairs. `Value` elements
/// are keyed by their `Name` attribute; other elements by their own name.
fn read_message_xml(reader: &mut EwsXmlReader<'_>, details: &mut BTreeMap<String, String>) -> Result<(), Error> {
    reader.read_children(|reader| {
        if reader.is_start_element_named(XmlNamespace::Types, "Value") {
            let name = reader.read_attribute_value("Name").unwrap_or_default().to_string();
            let value = reader.read_element_value()?;
            details.insert(name, value);
        } else {
            let name = reader.local_name().to_string();
            let value = reader.read_element_value()?;
            details.insert(name, value);
        }

        Ok(())
    })
}
