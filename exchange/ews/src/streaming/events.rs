/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::{DateTime, Utc};

use crate::{
    complex::{ComplexProperty, FolderId, ItemId},
    types::EventType,
    xml::{EwsXmlReader, XmlEnum},
    Error,
};

/// The object an event happened to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventTarget {
    Item(ItemId),
    Folder(FolderId),
}

/// A single change reported by a subscription.
///
/// Item and folder events share one shape; which fields are present depends
/// on the event type. Copy and move events carry the object's previous
/// identity, folder modifications may carry the folder's unread count, and
/// status events carry only a watermark.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/notification-ex15websvcsotherref>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationEvent {
    pub event_type: EventType,
    pub watermark: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub target: Option<EventTarget>,
    pub parent_folder_id: Option<FolderId>,
    pub old_target: Option<EventTarget>,
    pub old_parent_folder_id: Option<FolderId>,
    pub unread_count: Option<i32>,
}

impl NotificationEvent {
    /// Creates an empty event for an event element, e.g. `NewMailEvent`, or
    /// `None` if the element isn't an event.
    pub fn create_from_xml(element_name: &str) -> Option<Self> {
        EventType::from_xml_str(element_name).map(|event_type| Self {
            event_type,
            watermark: None,
            timestamp: None,
            target: None,
            parent_folder_id: None,
            old_target: None,
            old_parent_folder_id: None,
            unread_count: None,
        })
    }

    pub fn is_item_event(&self) -> bool {
        matches!(self.target, Some(EventTarget::Item(_)))
    }

    pub fn is_folder_event(&self) -> bool {
        matches!(self.target, Some(EventTarget::Folder(_)))
    }
}

fn read_folder_id(reader: &mut EwsXmlReader<'_>) -> Result<FolderId, Error> {
    let mut id = FolderId::default();
    id.load_from_xml(reader)?;

    Ok(id)
}

fn read_item_id(reader: &mut EwsXmlReader<'_>) -> Result<ItemId, Error> {
    let mut id = ItemId::default();
    id.load_from_xml(reader)?;

    Ok(id)
}

impl ComplexProperty for NotificationEvent {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "Watermark" => self.watermark = Some(reader.read_element_value()?),
            "TimeStamp" => self.timestamp = Some(reader.read_element_value_as_date_time()?),
            "ItemId" => self.target = Some(EventTarget::Item(read_item_id(reader)?)),
            "FolderId" => self.target = Some(EventTarget::Folder(read_folder_id(reader)?)),
            "ParentFolderId" => self.parent_folder_id = Some(read_folder_id(reader)?),
            "OldItemId" => self.old_target = Some(EventTarget::Item(read_item_id(reader)?)),
            "OldFolderId" => self.old_target = Some(EventTarget::Folder(read_folder_id(reader)?)),
            "OldParentFolderId" => self.old_parent_folder_id = Some(read_folder_id(reader)?),
            "UnreadCount" => self.unread_count = Some(reader.read_element_value_as()?),
            _ => return Ok(false),
        }

        Ok(true)
    }
}

/// The events delivered for one subscription in one response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationGroup {
    pub subscription_id: String,
    pub previous_watermark: Option<String>,
    pub more_events: bool,
    pub events: Vec<NotificationEvent>,
}

impl ComplexProperty for NotificationGroup {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "SubscriptionId" => self.subscription_id = reader.read_element_value()?,
            "PreviousWatermark" => self.previous_watermark = Some(reader.read_element_value()?),
            "MoreEvents" => self.more_events = reader.read_element_value_as_bool()?,
            name => match NotificationEvent::create_from_xml(name) {
                Some(mut event) => {
                    event.load_from_xml(reader)?;
                    self.events.push(event);
                }
                None => return Ok(false),
            },
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlNamespace;

    #[test]
    fn events_are_dispatched_by_element_name() {
        let xml = br#"<m:Notification xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:SubscriptionId>sub-1</t:SubscriptionId>
            <t:NewMailEvent>
                <t:Watermark>AQAAAA==</t:Watermark>
                <t:TimeStamp>2024-03-01T09:30:00Z</t:TimeStamp>
                <t:ItemId Id="AAMk" ChangeKey="CQAA"/>
                <t:ParentFolderId Id="AQMk" ChangeKey="AQAA"/>
            </t:NewMailEvent>
            <t:MovedEvent>
                <t:TimeStamp>2024-03-01T09:31:00Z</t:TimeStamp>
                <t:FolderId Id="F2"/>
                <t:ParentFolderId Id="P2"/>
                <t:OldFolderId Id="F1"/>
                <t:OldParentFolderId Id="P1"/>
            </t:MovedEvent>
            <t:ModifiedEvent>
                <t:FolderId Id="F3"/>
                <t:ParentFolderId Id="P3"/>
                <t:UnreadCount>4</t:UnreadCount>
            </t:ModifiedEvent>
            <t:SomeFutureEvent><t:Watermark>x</t:Watermark></t:SomeFutureEvent>
            <t:StatusEvent><t:Watermark>AQAAAB==</t:Watermark></t:StatusEvent>
        </m:Notification>"#;

        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Messages, "Notification").unwrap();
        let mut group = NotificationGroup::default();
        group.load_from_xml(&mut reader).unwrap();

        assert_eq!(group.subscription_id, "sub-1");
        let types: Vec<_> = group.events.iter().map(|event| event.event_type).collect();
        assert_eq!(
            types,
            [
                EventType::NewMailEvent,
                EventType::MovedEvent,
                EventType::ModifiedEvent,
                EventType::StatusEvent
            ]
        );

        let new_mail = &group.events[0];
        assert!(new_mail.is_item_event());
        assert_eq!(new_mail.target, Some(EventTarget::Item(ItemId::with_change_key("AAMk", "CQAA"))));

        let moved = &group.events[1];
        assert!(moved.is_folder_event());
        assert_eq!(moved.old_target, Some(EventTarget::Folder(FolderId::new("F1"))));
        assert_eq!(moved.old_parent_folder_id, Some(FolderId::new("P1")));

        assert_eq!(group.events[2].unread_count, Some(4));
        assert!(group.events[3].target.is_none());
    }

    #[test]
    fn unknown_event_names_create_nothing() {
        assert!(NotificationEvent::create_from_xml("SomeFutureEvent").is_none());
        assert!(NotificationEvent::create_from_xml("FreeBusyChangedEvent").is_some());
    }
}
