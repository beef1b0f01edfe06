/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    complex::ComplexProperty,
    response::ServiceResponse,
    streaming::NotificationGroup,
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error, ValidationError,
};

use super::{read_response_messages, ServiceRequest};

/// Whether the server is keeping a hanging request open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum ConnectionStatus {
    #[xml_enum(rename = "OK")]
    Ok,
    Closed,
}

/// A `GetStreamingEvents` request, answered with a stream of responses
/// until the connection times out or is closed.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getstreamingevents>
pub(crate) struct GetStreamingEvents<'a> {
    pub subscription_ids: &'a [String],

    /// How long the server keeps the request open, in minutes.
    pub connection_timeout: u32,
}

impl ServiceRequest for GetStreamingEvents<'_> {
    fn name(&self) -> &'static str {
        "GetStreamingEvents"
    }

    fn minimum_version(&self) -> ExchangeVersion {
        ExchangeVersion::Exchange2010Sp1
    }

    fn validate(&self, _version: ExchangeVersion) -> Result<(), Error> {
        if self.subscription_ids.is_empty() {
            return Err(ValidationError::EmptyCollection("SubscriptionIds").into());
        }
        if !(1..=30).contains(&self.connection_timeout) {
            return Err(ValidationError::ConnectionLifetimeOutOfRange.into());
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Messages, "SubscriptionIds")?;
        for id in self.subscription_ids {
            writer.write_element_value(XmlNamespace::Types, "SubscriptionId", id)?;
        }
        writer.write_end_element()?;

        writer.write_element_value(
            XmlNamespace::Messages,
            "ConnectionTimeout",
            &self.connection_timeout.to_string(),
        )
    }
}

/// One response received over a hanging `GetStreamingEvents` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingEventsResponse {
    pub response: ServiceResponse,
    pub connection_status: Option<ConnectionStatus>,
    pub notifications: Vec<NotificationGroup>,

    /// Subscriptions the error in `response` applies to.
    pub error_subscription_ids: Vec<String>,
}

/// Reads a `GetStreamingEventsResponse` element.
pub(crate) fn read_streaming_events_response(
    reader: &mut EwsXmlReader<'_>,
) -> Result<Vec<StreamingEventsResponse>, Error> {
    let mut notifications: Vec<Vec<NotificationGroup>> = Vec::new();
    let mut error_subscription_ids: Vec<Vec<String>> = Vec::new();
    let mut statuses: Vec<Option<ConnectionStatus>> = Vec::new();

    let responses = read_response_messages(reader, |index, reader| {
        notifications.resize_with(index + 1, Vec::new);
        error_subscription_ids.resize_with(index + 1, Vec::new);
        statuses.resize(index + 1, None);

        match reader.local_name() {
            "Notifications" => reader.read_children(|reader| {
                if reader.local_name() != "Notification" {
                    return reader.skip_current_element();
                }

                let mut group = NotificationGroup::default();
                group.load_from_xml(reader)?;
                notifications[index].push(group);

                Ok(())
            })?,
            "ErrorSubscriptionIds" => reader.read_children(|reader| {
                if reader.local_name() == "SubscriptionId" {
                    error_subscription_ids[index].push(reader.read_element_value()?);
                    Ok(())
                } else {
                    reader.skip_current_element()
                }
            })?,
            "ConnectionStatus" => statuses[index] = Some(reader.read_element_value_as_enum()?),
            _ => return Ok(false),
        }

        Ok(true)
    })?;

    let count = responses.len();
    notifications.resize_with(count, Vec::new);
    error_subscription_ids.resize_with(count, Vec::new);
    statuses.resize(count, None);

    Ok(responses
        .into_iter()
        .zip(notifications)
        .zip(error_subscription_ids)
        .zip(statuses)
        .map(
            |(((response, notifications), error_subscription_ids), connection_status)| StreamingEventsResponse {
                response,
                connection_status,
                notifications,
                error_subscription_ids,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        request::{read_envelope, write_envelope},
        response::ServiceError,
    };

    #[test]
    fn connection_lifetime_is_bounded() {
        let ids = [String::from("sub-1")];
        for (timeout, valid) in [(0, false), (1, true), (30, true), (31, false)] {
            let request = GetStreamingEvents {
                subscription_ids: &ids,
                connection_timeout: timeout,
            };
            assert_eq!(request.validate(ExchangeVersion::Exchange2013).is_ok(), valid, "{timeout}");
        }
    }

    #[test]
    fn request_lists_every_subscription() {
        let ids = [String::from("sub-1"), String::from("sub-2")];
        let request = GetStreamingEvents {
            subscription_ids: &ids,
            connection_timeout: 10,
        };

        let envelope = String::from_utf8(write_envelope(&request, ExchangeVersion::Exchange2013).unwrap()).unwrap();
        assert!(envelope.contains(
            "<m:SubscriptionIds><t:SubscriptionId>sub-1</t:SubscriptionId><t:SubscriptionId>sub-2</t:SubscriptionId></m:SubscriptionIds><m:ConnectionTimeout>10</m:ConnectionTimeout>"
        ), "{envelope}");
    }

    #[test]
    fn responses_carry_notifications_errors_and_status() {
        let document = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body>
                <m:GetStreamingEventsResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                    <m:ResponseMessages>
                        <m:GetStreamingEventsResponseMessage ResponseClass="Success">
                            <m:ResponseCode>NoError</m:ResponseCode>
                            <m:Notifications>
                                <m:Notification>
                                    <t:SubscriptionId>sub-1</t:SubscriptionId>
                                    <t:CreatedEvent><t:ItemId Id="A1"/><t:ParentFolderId Id="F1"/></t:CreatedEvent>
                                </m:Notification>
                            </m:Notifications>
                        </m:GetStreamingEventsResponseMessage>
                        <m:GetStreamingEventsResponseMessage ResponseClass="Error">
                            <m:MessageText>The subscription has expired.</m:MessageText>
                            <m:ResponseCode>ErrorExpiredSubscription</m:ResponseCode>
                            <m:ErrorSubscriptionIds><m:SubscriptionId>sub-2</m:SubscriptionId></m:ErrorSubscriptionIds>
                            <m:ConnectionStatus>Closed</m:ConnectionStatus>
                        </m:GetStreamingEventsResponseMessage>
                    </m:ResponseMessages>
                </m:GetStreamingEventsResponse>
            </s:Body>
        </s:Envelope>"#;

        let mut responses = Vec::new();
        read_envelope(document, |reader| {
            responses = read_streaming_events_response(reader)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].notifications.len(), 1);
        assert_eq!(responses[0].notifications[0].events.len(), 1);
        assert_eq!(responses[0].connection_status, None);

        assert_eq!(responses[1].response.code, ServiceError::ErrorExpiredSubscription);
        assert_eq!(responses[1].error_subscription_ids, ["sub-2"]);
        assert_eq!(responses[1].connection_status, Some(ConnectionStatus::Closed));
    }
}
