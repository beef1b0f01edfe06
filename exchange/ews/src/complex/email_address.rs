/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::{DateTime, Utc};

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error, ValidationError,
};

use super::{ComplexProperty, ItemId};

/// The type of a mailbox.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/mailboxtype>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum MailboxType {
    Mailbox,
    PublicDL,
    PrivateDL,
    Contact,
    PublicFolder,
    #[xml_enum(fallback)]
    Unknown,
    OneOff,
    GroupMailbox,
}

/// An attendee's response to a meeting request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum MeetingResponseType {
    #[xml_enum(fallback)]
    Unknown,
    Organizer,
    Tentative,
    Accept,
    Decline,
    NoResponseReceived,
}

/// A mailbox, as used for senders and recipients.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/mailbox>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
    pub routing_type: Option<String>,
    pub mailbox_type: Option<MailboxType>,
    pub item_id: Option<ItemId>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Default::default()
        }
    }

    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: Some(address.into()),
            ..Default::default()
        }
    }
}

impl ComplexProperty for EmailAddress {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "Name" => self.name = Some(reader.read_element_value()?),
            "EmailAddress" => self.address = Some(reader.read_element_value()?),
            "RoutingType" => self.routing_type = Some(reader.read_element_value()?),
            "MailboxType" => self.mailbox_type = Some(reader.read_element_value_as_enum()?),
            "ItemId" => {
                let mut item_id = ItemId::default();
                item_id.load_from_xml(reader)?;
                self.item_id = Some(item_id);
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(name) = &self.name {
            writer.write_element_value(XmlNamespace::Types, "Name", name)?;
        }
        if let Some(address) = &self.address {
            writer.write_element_value(XmlNamespace::Types, "EmailAddress", address)?;
        }
        if let Some(routing_type) = &self.routing_type {
            writer.write_element_value(XmlNamespace::Types, "RoutingType", routing_type)?;
        }
        if let Some(mailbox_type) = self.mailbox_type {
            writer.write_element_enum(XmlNamespace::Types, "MailboxType", mailbox_type)?;
        }
        if let Some(item_id) = &self.item_id {
            item_id.write_to_xml(writer, XmlNamespace::Types, "ItemId")?;
        }

        Ok(())
    }
}

/// A meeting attendee.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/attendee>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attendee {
    pub mailbox: EmailAddress,
    pub response_type: Option<MeetingResponseType>,
    pub last_response_time: Option<DateTime<Utc>>,
}

impl Attendee {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            mailbox: EmailAddress::new(address),
            ..Default::default()
        }
    }
}

impl From<EmailAddress> for Attendee {
    fn from(mailbox: EmailAddress) -> Self {
        Self {
            mailbox,
            ..Default::default()
        }
    }
}

impl ComplexProperty for Attendee {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "Mailbox" => self.mailbox.load_from_xml(reader)?,
            "ResponseType" => self.response_type = Some(reader.read_element_value_as_enum()?),
            "LastResponseTime" => self.last_response_time = Some(reader.read_element_value_as_date_time()?),
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.mailbox.write_to_xml(writer, XmlNamespace::Types, "Mailbox")?;
        if let Some(response_type) = self.response_type {
            writer.write_element_enum(XmlNamespace::Types, "ResponseType", response_type)?;
        }
        if let Some(last_response_time) = &self.last_response_time {
            writer.write_element_date_time(XmlNamespace::Types, "LastResponseTime", last_response_time)?;
        }

        Ok(())
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        match self.mailbox.address.as_deref() {
            Some(address) if !address.is_empty() => Ok(()),
            _ => Err(ValidationError::FieldNotSpecified("EmailAddress")),
        }
    }
}
