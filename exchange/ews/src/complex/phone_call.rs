/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum},
    Error,
};

use super::ComplexProperty;

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/phonecallstate>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum PhoneCallState {
    #[default]
    #[xml_enum(fallback)]
    Idle,
    Connecting,
    Alerted,
    Connected,
    Disconnected,
    Incoming,
    Transferring,
    Forwarding,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/connectionfailurecause>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum ConnectionFailureCause {
    #[default]
    None,
    UserBusy,
    NoAnswer,
    Unavailable,
    #[xml_enum(fallback)]
    Other,
}

/// The identifier of a call placed through Unified Messaging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhoneCallId {
    pub id: String,
}

impl PhoneCallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl ComplexProperty for PhoneCallId {
    fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        self.id = reader.read_attribute_value("Id").unwrap_or_default().to_string();

        Ok(())
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_value("Id", self.id.as_str())
    }
}

/// The state of a Unified Messaging phone call.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/phonecallinformation>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneCallInformation {
    pub state: PhoneCallState,
    pub connection_failure_cause: ConnectionFailureCause,
    pub sip_response_text: Option<String>,
    pub sip_response_code: Option<i32>,
}

impl ComplexProperty for PhoneCallInformation {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "PhoneCallState" => self.state = reader.read_element_value_as_enum()?,
            "ConnectionFailureCause" => self.connection_failure_cause = reader.read_element_value_as_enum()?,
            "SIPResponseText" => self.sip_response_text = Some(reader.read_element_value()?),
            "SIPResponseCode" => self.sip_response_code = Some(reader.read_element_value_as()?),
            _ => return Ok(false),
        }

        Ok(true)
    }
}
