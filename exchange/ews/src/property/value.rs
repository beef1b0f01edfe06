/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::{DateTime, Utc};

use crate::{
    complex::{
        AttendeeCollection, ChangeTrackedCollection, ComplexProperty, EmailAddress, EmailAddressCollection, FolderId,
        ItemId, MessageBody, Recurrence, SearchFolderParameters, StringList, TimeZoneDefinition,
    },
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error, ValidationError,
};

/// The type of value a property holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Boolean,
    Integer,
    Double,
    DateTime,
    Base64,

    /// One of a fixed set of text values, usually an [`XmlEnum`]'s
    /// `VARIANTS`.
    Enum(&'static [&'static str]),
    ItemId,
    FolderId,
    Body,

    /// A single mailbox wrapped in the property element.
    EmailAddress,
    EmailAddresses,
    Attendees,
    Strings,
    Recurrence,
    TimeZone,
    SearchParameters,
}

impl PropertyKind {
    /// Reads the value of a property element the reader is positioned on.
    pub(crate) fn load_from_xml(self, reader: &mut EwsXmlReader<'_>) -> Result<PropertyValue, Error> {
        let value = match self {
            Self::String => PropertyValue::String(reader.read_element_value()?),
            Self::Boolean => PropertyValue::Boolean(reader.read_element_value_as_bool()?),
            Self::Integer => PropertyValue::Integer(reader.read_element_value_as()?),
            Self::Double => PropertyValue::Double(reader.read_element_value_as()?),
            Self::DateTime => PropertyValue::DateTime(reader.read_element_value_as_date_time()?),
            Self::Base64 => PropertyValue::Base64(reader.read_element_value_as_base64()?),
            Self::Enum(variants) => {
                let name = reader.local_name().to_string();
                let value = reader.read_element_value()?;
                let variant = variants
                    .iter()
                    .find(|variant| **variant == value.trim())
                    .copied()
                    .ok_or_else(|| Error::UnexpectedXml(format!("invalid value `{value}` in element {name}")))?;
                PropertyValue::Enum(variant)
            }
            Self::ItemId => PropertyValue::ItemId(load_complex(reader)?),
            Self::FolderId => PropertyValue::FolderId(load_complex(reader)?),
            Self::Body => PropertyValue::Body(load_complex(reader)?),
            Self::EmailAddress => {
                let mut mailbox = EmailAddress::default();
                reader.read_children(|reader| {
                    if reader.local_name() == "Mailbox" {
                        mailbox.load_from_xml(reader)
                    } else {
                        reader.skip_current_element()
                    }
                })?;
                PropertyValue::EmailAddress(mailbox)
            }
            Self::EmailAddresses => {
                let mut collection = EmailAddressCollection::new();
                collection.load_from_xml(reader)?;
                PropertyValue::EmailAddresses(collection)
            }
            Self::Attendees => {
                let mut collection = AttendeeCollection::new();
                collection.load_from_xml(reader)?;
                PropertyValue::Attendees(collection)
            }
            Self::Strings => {
                let mut collection = StringList::new();
                collection.load_from_xml(reader)?;
                PropertyValue::Strings(collection)
            }
            Self::Recurrence => PropertyValue::Recurrence(load_complex(reader)?),
            Self::TimeZone => PropertyValue::TimeZone(load_complex(reader)?),
            Self::SearchParameters => PropertyValue::SearchParameters(load_complex(reader)?),
        };

        Ok(value)
    }
}

fn load_complex<T: ComplexProperty + Default>(reader: &mut EwsXmlReader<'_>) -> Result<T, Error> {
    let mut value = T::default();
    value.load_from_xml(reader)?;

    Ok(value)
}

/// The value of one property in a property bag.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Integer(i32),
    Double(f64),
    DateTime(DateTime<Utc>),
    Base64(Vec<u8>),
    Enum(&'static str),
    ItemId(ItemId),
    FolderId(FolderId),
    Body(MessageBody),
    EmailAddress(EmailAddress),
    EmailAddresses(EmailAddressCollection),
    Attendees(AttendeeCollection),
    Strings(StringList),
    Recurrence(Recurrence),
    TimeZone(TimeZoneDefinition),
    SearchParameters(SearchFolderParameters),
}

impl PropertyValue {
    pub fn from_enum<T: XmlEnum>(value: T) -> Self {
        Self::Enum(value.as_xml_str())
    }

    /// Whether the value can be stored in a property of the given kind.
    pub fn matches(&self, kind: PropertyKind) -> bool {
        match (self, kind) {
            (Self::Enum(value), PropertyKind::Enum(variants)) => variants.contains(value),
            (Self::String(_), PropertyKind::String)
            | (Self::Boolean(_), PropertyKind::Boolean)
            | (Self::Integer(_), PropertyKind::Integer)
            | (Self::Double(_), PropertyKind::Double)
            | (Self::DateTime(_), PropertyKind::DateTime)
            | (Self::Base64(_), PropertyKind::Base64)
            | (Self::ItemId(_), PropertyKind::ItemId)
            | (Self::FolderId(_), PropertyKind::FolderId)
            | (Self::Body(_), PropertyKind::Body)
            | (Self::EmailAddress(_), PropertyKind::EmailAddress)
            | (Self::EmailAddresses(_), PropertyKind::EmailAddresses)
            | (Self::Attendees(_), PropertyKind::Attendees)
            | (Self::Strings(_), PropertyKind::Strings)
            | (Self::Recurrence(_), PropertyKind::Recurrence)
            | (Self::TimeZone(_), PropertyKind::TimeZone)
            | (Self::SearchParameters(_), PropertyKind::SearchParameters) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            Self::Enum(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Base64(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn as_enum<T: XmlEnum>(&self) -> Option<T> {
        match self {
            Self::Enum(value) => T::from_xml_str(value),
            _ => None,
        }
    }

    pub fn as_item_id(&self) -> Option<&ItemId> {
        match self {
            Self::ItemId(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_folder_id(&self) -> Option<&FolderId> {
        match self {
            Self::FolderId(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_body(&self) -> Option<&MessageBody> {
        match self {
            Self::Body(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_email_address(&self) -> Option<&EmailAddress> {
        match self {
            Self::EmailAddress(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_email_addresses(&self) -> Option<&EmailAddressCollection> {
        match self {
            Self::EmailAddresses(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_email_addresses_mut(&mut self) -> Option<&mut EmailAddressCollection> {
        match self {
            Self::EmailAddresses(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_attendees(&self) -> Option<&AttendeeCollection> {
        match self {
            Self::Attendees(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_attendees_mut(&mut self) -> Option<&mut AttendeeCollection> {
        match self {
            Self::Attendees(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&StringList> {
        match self {
            Self::Strings(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_strings_mut(&mut self) -> Option<&mut StringList> {
        match self {
            Self::Strings(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_recurrence(&self) -> Option<&Recurrence> {
        match self {
            Self::Recurrence(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_recurrence_mut(&mut self) -> Option<&mut Recurrence> {
        match self {
            Self::Recurrence(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_time_zone(&self) -> Option<&TimeZoneDefinition> {
        match self {
            Self::TimeZone(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_search_parameters(&self) -> Option<&SearchFolderParameters> {
        match self {
            Self::SearchParameters(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_search_parameters_mut(&mut self) -> Option<&mut SearchFolderParameters> {
        match self {
            Self::SearchParameters(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn as_collection(&self) -> Option<&dyn ChangeTrackedCollection> {
        match self {
            Self::EmailAddresses(value) => Some(value as &dyn ChangeTrackedCollection),
            Self::Attendees(value) => Some(value as &dyn ChangeTrackedCollection),
            Self::Strings(value) => Some(value as &dyn ChangeTrackedCollection),
            _ => None,
        }
    }

    pub(crate) fn as_collection_mut(&mut self) -> Option<&mut dyn ChangeTrackedCollection> {
        match self {
            Self::EmailAddresses(value) => Some(value as &mut dyn ChangeTrackedCollection),
            Self::Attendees(value) => Some(value as &mut dyn ChangeTrackedCollection),
            Self::Strings(value) => Some(value as &mut dyn ChangeTrackedCollection),
            _ => None,
        }
    }

    /// Writes the value as the named property element.
    pub(crate) fn write_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<(), Error> {
        const NS: XmlNamespace = XmlNamespace::Types;

        match self {
            Self::String(value) => writer.write_element_value(NS, element_name, value),
            Self::Boolean(value) => writer.write_element_bool(NS, element_name, *value),
            Self::Integer(value) => writer.write_element_value(NS, element_name, &value.to_string()),
            Self::Double(value) => writer.write_element_value(NS, element_name, &value.to_string()),
            Self::DateTime(value) => writer.write_element_date_time(NS, element_name, value),
            Self::Base64(value) => {
                writer.write_start_element(NS, element_name)?;
                writer.write_base64_value(value)?;
                writer.write_end_element()
            }
            Self::Enum(value) => writer.write_element_value(NS, element_name, value),
            Self::ItemId(value) => value.write_to_xml(writer, NS, element_name),
            Self::FolderId(value) => value.write_to_xml(writer, NS, element_name),
            Self::Body(value) => value.write_to_xml(writer, NS, element_name),
            Self::EmailAddress(value) => {
                writer.write_start_element(NS, element_name)?;
                value.write_to_xml(writer, NS, "Mailbox")?;
                writer.write_end_element()
            }
            Self::EmailAddresses(_) | Self::Attendees(_) | Self::Strings(_) => {
                writer.write_start_element(NS, element_name)?;
                if let Some(collection) = self.as_collection() {
                    collection.write_items_to_xml(writer)?;
                }
                writer.write_end_element()
            }
            Self::Recurrence(value) => value.write_to_xml(writer, NS, element_name),
            Self::TimeZone(value) => value.write_to_xml(writer, NS, element_name),
            Self::SearchParameters(value) => value.write_to_xml(writer, NS, element_name),
        }
    }

    /// Writes a collection value with only the items added since it was
    /// loaded.
    pub(crate) fn write_added_items_to_xml(&self, writer: &mut EwsXmlWriter, element_name: &str) -> Result<(), Error> {
        let Some(collection) = self.as_collection() else {
            return self.write_to_xml(writer, element_name);
        };

        writer.write_start_element(XmlNamespace::Types, element_name)?;
        collection.write_added_items_to_xml(writer)?;
        writer.write_end_element()
    }

    /// Runs the value's self-validation, if it has any.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Recurrence(value) => value.validate(),
            Self::TimeZone(value) => value.validate(),
            Self::SearchParameters(value) => value.validate(),
            Self::EmailAddresses(_) | Self::Attendees(_) | Self::Strings(_) => match self.as_collection() {
                Some(collection) => collection.validate_items(),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Base64(value)
    }
}

impl From<ItemId> for PropertyValue {
    fn from(value: ItemId) -> Self {
        Self::ItemId(value)
    }
}

impl From<FolderId> for PropertyValue {
    fn from(value: FolderId) -> Self {
        Self::FolderId(value)
    }
}

impl From<MessageBody> for PropertyValue {
    fn from(value: MessageBody) -> Self {
        Self::Body(value)
    }
}

impl From<EmailAddress> for PropertyValue {
    fn from(value: EmailAddress) -> Self {
        Self::EmailAddress(value)
    }
}

impl From<EmailAddressCollection> for PropertyValue {
    fn from(value: EmailAddressCollection) -> Self {
        Self::EmailAddresses(value)
    }
}

impl From<AttendeeCollection> for PropertyValue {
    fn from(value: AttendeeCollection) -> Self {
        Self::Attendees(value)
    }
}

impl From<StringList> for PropertyValue {
    fn from(value: StringList) -> Self {
        Self::Strings(value)
    }
}

impl From<Recurrence> for PropertyValue {
    fn from(value: Recurrence) -> Self {
        Self::Recurrence(value)
    }
}

impl From<TimeZoneDefinition> for PropertyValue {
    fn from(value: TimeZoneDefinition) -> Self {
        Self::TimeZone(value)
    }
}

impl From<SearchFolderParameters> for PropertyValue {
    fn from(value: SearchFolderParameters) -> Self {
        Self::SearchParameters(value)
    }
}
