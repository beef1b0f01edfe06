/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    types::{write_folder_ids, EventType, FolderIdentifier},
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{into_single_result, read_response_messages, ServiceRequest};

/// A `Subscribe` request for a streaming subscription.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/streamingsubscriptionrequest>
pub(crate) struct SubscribeToStreamingNotifications<'a> {
    /// The folders to watch; every folder of the mailbox if empty.
    pub folders: &'a [FolderIdentifier],
    pub event_types: &'a [EventType],
}

impl ServiceRequest for SubscribeToStreamingNotifications<'_> {
    fn name(&self) -> &'static str {
        "Subscribe"
    }

    fn minimum_version(&self) -> ExchangeVersion {
        ExchangeVersion::Exchange2010Sp1
    }

    fn validate(&self, _version: ExchangeVersion) -> Result<(), Error> {
        if self.event_types.is_empty() {
            return Err(ValidationError::EmptyCollection("EventTypes").into());
        }
        if self.event_types.contains(&EventType::StatusEvent) {
            return Err(Error::InvalidOperation("status events are sent without being subscribed to"));
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Messages, "StreamingSubscriptionRequest")?;
        if self.folders.is_empty() {
            writer.write_attribute_value("SubscribeToAllFolders", "true")?;
        } else {
            write_folder_ids(writer, XmlNamespace::Types, "FolderIds", self.folders)?;
        }

        writer.write_start_element(XmlNamespace::Types, "EventTypes")?;
        for event_type in self.event_types {
            writer.write_element_enum(XmlNamespace::Types, "EventType", *event_type)?;
        }
        writer.write_end_element()?;

        writer.write_end_element()
    }
}

/// Reads a `SubscribeResponse`, returning the new subscription's id.
pub(crate) fn read_subscribe_response(reader: &mut EwsXmlReader<'_>) -> Result<String, Error> {
    let mut subscription_id = None;
    let responses = read_response_messages(reader, |_, reader| {
        if reader.local_name() != "SubscriptionId" {
            return Ok(false);
        }

        subscription_id = Some(reader.read_element_value()?);
        Ok(true)
    })?;

    into_single_result(responses)?;

    subscription_id.ok_or_else(|| Error::UnexpectedXml(String::from("the response contained no subscription id")))
}

/// An `Unsubscribe` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/unsubscribe>
pub(crate) struct Unsubscribe<'a> {
    pub subscription_id: &'a str,
}

impl ServiceRequest for Unsubscribe<'_> {
    fn name(&self) -> &'static str {
        "Unsubscribe"
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_element_value(XmlNamespace::Messages, "SubscriptionId", self.subscription_id)
    }
}
