/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Structured property values and the XML contract they share.
//!
//! A complex property reads itself from the element the reader is currently
//! positioned on, one child at a time: [`ComplexProperty::load_from_xml`]
//! offers every child element to
//! [`ComplexProperty::try_read_element_from_xml`], and skips the ones the
//! property doesn't claim. Families with several concrete shapes (recurrence
//! patterns, search filters, time zone transitions, notification events)
//! pick the shape from the element's local name with a `create_from_xml`
//! function over a fixed table.

use std::fmt;

use tracing::debug;

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

mod body;
mod collection;
mod email_address;
mod ids;
mod phone_call;
mod recurrence;
mod search_filter;
mod time_zone;

pub use body::{BodyType, MessageBody};
pub use collection::{
    AttendeeCollection, CollectionItem, ComplexPropertyCollection, EmailAddressCollection, StringList,
};
pub(crate) use collection::ChangeTrackedCollection;
pub use email_address::{Attendee, EmailAddress, MailboxType, MeetingResponseType};
pub use ids::{FolderId, ItemId};
pub use phone_call::{ConnectionFailureCause, PhoneCallId, PhoneCallInformation, PhoneCallState};
pub use recurrence::{DayOfTheWeek, DayOfTheWeekIndex, Month, Recurrence, RecurrencePattern, RecurrenceRange};
pub use search_filter::{
    Comparison, ContainmentComparison, ContainmentMode, FilterValue, SearchFilter, SearchFolderParameters,
};
pub use time_zone::{
    TimeZoneDefinition, TimeZonePeriod, TimeZoneTransition, TimeZoneTransitionGroup, TransitionTarget,
};

/// The XML load/save contract shared by every structured property value.
pub trait ComplexProperty: fmt::Debug {
    fn read_attributes_from_xml(&mut self, _reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Consumes the reader's current child element if it is one of this
    /// property's fields, returning whether it did.
    fn try_read_element_from_xml(&mut self, _reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        Ok(false)
    }

    fn write_attributes_to_xml(&self, _writer: &mut EwsXmlWriter) -> Result<(), Error> {
        Ok(())
    }

    /// Writes the property's child elements in schema order.
    fn write_elements_to_xml(&self, _writer: &mut EwsXmlWriter) -> Result<(), Error> {
        Ok(())
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Reads the element the reader is positioned on, leaving the reader on
    /// its end tag.
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        self.read_attributes_from_xml(reader)?;
        reader.read_children(|reader| {
            if !self.try_read_element_from_xml(reader)? {
                debug!(element = reader.local_name(), "skipping unrecognized element");
                reader.skip_current_element()?;
            }

            Ok(())
        })
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter, namespace: XmlNamespace, element_name: &str) -> Result<(), Error> {
        writer.write_start_element(namespace, element_name)?;
        self.write_attributes_to_xml(writer)?;
        self.write_elements_to_xml(writer)?;
        writer.write_end_element()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.internal_validate()
    }
}
