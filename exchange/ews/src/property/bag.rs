/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    complex::{AttendeeCollection, EmailAddressCollection, StringList},
    schema::{Schema, ServiceObjectType},
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{PropertyDefinition, PropertyDefinitionFlags, PropertyKind, PropertySet, PropertyValue};

/// The property values of one service object, along with what has been
/// loaded from the server and what has changed since.
///
/// A property with no entry in the bag is either unknown (neither loaded nor
/// assigned), which makes reading it an error, or loaded without a value,
/// which reads as `None`.
#[derive(Clone, Debug)]
pub struct PropertyBag {
    object_type: &'static ServiceObjectType,
    version: ExchangeVersion,
    is_new: bool,
    values: HashMap<&'static PropertyDefinition, PropertyValue>,
    loaded_properties: HashSet<&'static PropertyDefinition>,
    modified_properties: Vec<&'static PropertyDefinition>,
    deleted_properties: Vec<&'static PropertyDefinition>,
    is_dirty: bool,
}

impl PropertyBag {
    /// Creates an empty bag for a new object of the given type.
    pub fn new(object_type: &'static ServiceObjectType, version: ExchangeVersion) -> Self {
        Self {
            object_type,
            version,
            is_new: true,
            values: HashMap::new(),
            loaded_properties: HashSet::new(),
            modified_properties: Vec::new(),
            deleted_properties: Vec::new(),
            is_dirty: false,
        }
    }

    pub fn object_type(&self) -> &'static ServiceObjectType {
        self.object_type
    }

    pub fn schema(&self) -> &'static Schema {
        self.object_type.schema()
    }

    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    /// Whether the object has yet to be created on the server.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether anything has changed since the bag was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn contains(&self, property: &PropertyDefinition) -> bool {
        self.values.contains_key(property)
    }

    pub fn is_property_loaded(&self, property: &PropertyDefinition) -> bool {
        self.loaded_properties.contains(property)
    }

    /// The properties assigned since the last load or save, in the order
    /// they were first assigned.
    pub fn modified_properties(&self) -> &[&'static PropertyDefinition] {
        &self.modified_properties
    }

    /// The properties cleared since the last load or save.
    pub fn deleted_properties(&self) -> &[&'static PropertyDefinition] {
        &self.deleted_properties
    }

    /// The object's identifier, once it has one.
    pub fn id(&self) -> Option<&PropertyValue> {
        self.schema()
            .id_property()
            .and_then(|property| self.values.get(property))
    }

    /// Returns the value of `property`, or `None` if the property was loaded
    /// or cleared and has no value.
    pub fn get(&self, property: &'static PropertyDefinition) -> Result<Option<&PropertyValue>, Error> {
        self.check_access(property)?;

        match self.values.get(property) {
            Some(value) => Ok(Some(value)),
            None if self.loaded_properties.contains(property) => Ok(None),
            None if self.schema().id_property() == Some(property) => Ok(None),
            None => Err(Error::PropertyNotLoaded(property.xml_element_name())),
        }
    }

    /// Assigns a value to `property`.
    ///
    /// The property is recorded as modified even when the new value equals
    /// the current one.
    pub fn set(
        &mut self,
        property: &'static PropertyDefinition,
        value: impl Into<PropertyValue>,
    ) -> Result<(), Error> {
        self.check_writable(property, false)?;

        let value = value.into();
        if !value.matches(property.kind()) {
            return Err(Error::PropertyTypeMismatch(property.xml_element_name()));
        }

        self.values.insert(property, value);
        self.deleted_properties.retain(|deleted| *deleted != property);
        self.mark_modified(property);

        Ok(())
    }

    /// Gives mutable access to the value of `property`, marking it as
    /// modified.
    ///
    /// Collection properties without a value start out as an empty
    /// collection if the object is new or the property has been loaded.
    pub fn get_mut(&mut self, property: &'static PropertyDefinition) -> Result<&mut PropertyValue, Error> {
        self.check_writable(property, false)?;

        if !self.values.contains_key(property) {
            let can_create = self.is_new || self.loaded_properties.contains(property);
            match empty_collection(property.kind()) {
                Some(empty) if can_create => {
                    self.values.insert(property, empty);
                }
                _ => return Err(Error::PropertyNotLoaded(property.xml_element_name())),
            }
        }

        self.deleted_properties.retain(|deleted| *deleted != property);
        self.mark_modified(property);

        self.values
            .get_mut(property)
            .ok_or(Error::PropertyNotLoaded(property.xml_element_name()))
    }

    /// Removes the value of `property`. For an existing object, the
    /// property is deleted on the server by the next update.
    pub fn clear(&mut self, property: &'static PropertyDefinition) -> Result<(), Error> {
        self.check_writable(property, true)?;

        self.values.remove(property);
        self.modified_properties.retain(|modified| *modified != property);
        self.loaded_properties.insert(property);
        if !self.is_new && !self.deleted_properties.contains(&property) {
            self.deleted_properties.push(property);
        }
        self.is_dirty = true;

        Ok(())
    }

    /// Forgets every change, as after a successful load or save.
    pub fn clear_change_log(&mut self) {
        self.modified_properties.clear();
        self.deleted_properties.clear();
        for value in self.values.values_mut() {
            if let Some(collection) = value.as_collection_mut() {
                collection.clear_change_log();
            }
        }
        self.is_dirty = false;
    }

    /// Reads the children of the object element the reader is positioned
    /// on, leaving the reader on its end tag.
    ///
    /// Properties included in `requested_properties` are considered loaded
    /// even when the response carries no value for them. With
    /// `clear_existing` unset, the values read are merged into the bag, as
    /// for the identifiers returned when an object is created.
    pub fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        clear_existing: bool,
        requested_properties: Option<&PropertySet>,
        summary_only: bool,
    ) -> Result<(), Error> {
        if clear_existing {
            self.values.clear();
            self.loaded_properties.clear();
        }

        let schema = self.schema();
        reader.read_children(|reader| {
            let Some(property) = schema.find_by_element_name(reader.local_name()) else {
                debug!(
                    object = self.object_type.xml_element_name(),
                    element = reader.local_name(),
                    "skipping unknown property element"
                );
                return reader.skip_current_element();
            };

            let value = property.kind().load_from_xml(reader)?;
            self.values.insert(property, value);
            self.loaded_properties.insert(property);

            Ok(())
        })?;

        if let Some(requested_properties) = requested_properties {
            for property in schema.properties() {
                if requested_properties.includes(property, schema, summary_only) {
                    self.loaded_properties.insert(property);
                }
            }
        }

        if self.id().is_some() {
            self.is_new = false;
        }

        self.clear_change_log();

        Ok(())
    }

    /// Writes the object element with every property that has a value, in
    /// schema order, as sent when creating the object.
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, self.object_type.xml_element_name())?;

        for property in self.schema().properties() {
            let Some(value) = self.values.get(property) else {
                continue;
            };
            if value.as_collection().is_some_and(|collection| collection.len() == 0) {
                continue;
            }

            property.check_version(self.version)?;
            value.write_to_xml(writer, property.xml_element_name())?;
        }

        writer.write_end_element()
    }

    /// Writes an `ItemChange` or `FolderChange` element holding one update
    /// for each modified or cleared property.
    pub fn write_to_xml_for_update(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        let kind = self.object_type.kind();
        let id = self
            .id()
            .ok_or(Error::InvalidOperation("only objects which exist on the server can be updated"))?;

        writer.write_start_element(XmlNamespace::Types, kind.change_element_name())?;
        id.write_to_xml(writer, kind.id_element_name())?;
        writer.write_start_element(XmlNamespace::Types, "Updates")?;

        for property in &self.modified_properties {
            match self.values.get(*property) {
                Some(value) => self.write_set_field(writer, property, value)?,
                None => self.write_delete_field(writer, property)?,
            }
        }

        for property in &self.deleted_properties {
            self.write_delete_field(writer, property)?;
        }

        writer.write_end_element()?;
        writer.write_end_element()
    }

    /// Checks that every property required for creation is set, then runs
    /// the self-validation of each value about to be sent.
    pub fn validate(&self) -> Result<(), Error> {
        let schema = self.schema();

        if self.is_new {
            let missing = schema.properties().find(|property| {
                property.has_flag(PropertyDefinitionFlags::REQUIRED_FOR_CREATE) && !self.values.contains_key(property)
            });
            if let Some(property) = missing {
                return Err(Error::PropertyValidation {
                    property: property.xml_element_name(),
                    source: ValidationError::RequiredPropertyMissing(property.xml_element_name()),
                });
            }
        }

        for property in schema.properties() {
            if !self.is_new && !self.modified_properties.contains(&property) {
                continue;
            }

            if let Some(value) = self.values.get(property) {
                value.validate().map_err(|source| Error::PropertyValidation {
                    property: property.xml_element_name(),
                    source,
                })?;
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn mark_existing(&mut self) {
        self.is_new = false;
    }

    fn mark_modified(&mut self, property: &'static PropertyDefinition) {
        if !self.modified_properties.contains(&property) {
            self.modified_properties.push(property);
        }
        self.is_dirty = true;
    }

    fn check_access(&self, property: &PropertyDefinition) -> Result<(), Error> {
        property.check_version(self.version)?;

        if !self.schema().contains(property) {
            return Err(Error::InvalidOperation(
                "the property does not belong to the object's schema",
            ));
        }

        Ok(())
    }

    fn check_writable(&self, property: &PropertyDefinition, deleting: bool) -> Result<(), Error> {
        self.check_access(property)?;

        let name = property.xml_element_name();
        if self.is_new {
            if !property.has_flag(PropertyDefinitionFlags::CAN_SET) {
                return Err(Error::PropertyReadOnly(name));
            }
        } else {
            if deleting && !property.has_flag(PropertyDefinitionFlags::CAN_DELETE) {
                return Err(Error::PropertyCannotBeDeleted(name));
            }
            if !property.has_flag(PropertyDefinitionFlags::CAN_UPDATE) {
                return Err(Error::PropertyReadOnly(name));
            }
        }

        Ok(())
    }

    fn write_set_field(
        &self,
        writer: &mut EwsXmlWriter,
        property: &PropertyDefinition,
        value: &PropertyValue,
    ) -> Result<(), Error> {
        let kind = self.object_type.kind();
        let element_name = property.xml_element_name();

        if let Some(collection) = value.as_collection() {
            if collection.len() == 0 {
                return self.write_delete_field(writer, property);
            }

            let append_only = property.has_flag(PropertyDefinitionFlags::CAN_APPEND)
                && collection.removed_count() == 0
                && collection.added_count() > 0
                && collection.added_count() < collection.len();
            if append_only {
                return self.write_field_update(writer, kind.append_field_element_name(), property, |writer| {
                    value.write_added_items_to_xml(writer, element_name)
                });
            }
        }

        self.write_field_update(writer, kind.set_field_element_name(), property, |writer| {
            value.write_to_xml(writer, element_name)
        })
    }

    fn write_field_update<F>(
        &self,
        writer: &mut EwsXmlWriter,
        update_element_name: &str,
        property: &PropertyDefinition,
        write_value: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut EwsXmlWriter) -> Result<(), Error>,
    {
        writer.write_start_element(XmlNamespace::Types, update_element_name)?;
        property.write_to_xml(writer)?;
        writer.write_start_element(XmlNamespace::Types, self.object_type.xml_element_name())?;
        write_value(writer)?;
        writer.write_end_element()?;
        writer.write_end_element()
    }

    fn write_delete_field(&self, writer: &mut EwsXmlWriter, property: &PropertyDefinition) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, self.object_type.kind().delete_field_element_name())?;
        property.write_to_xml(writer)?;
        writer.write_end_element()
    }
}

fn empty_collection(kind: PropertyKind) -> Option<PropertyValue> {
    match kind {
        PropertyKind::EmailAddresses => Some(PropertyValue::EmailAddresses(EmailAddressCollection::new())),
        PropertyKind::Attendees => Some(PropertyValue::Attendees(AttendeeCollection::new())),
        PropertyKind::Strings => Some(PropertyValue::Strings(StringList::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        complex::{Attendee, EmailAddress, ItemId, MessageBody},
        schema::{folder, item},
        types::BaseShape,
    };

    use super::*;

    const MESSAGE: &str = r#"<t:Message xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
        <t:ItemId Id="AAMkADk=" ChangeKey="CQAAABYA"/>
        <t:Subject>Quarterly report</t:Subject>
        <t:DateTimeReceived>2024-03-01T09:30:00Z</t:DateTimeReceived>
        <t:Categories><t:String>Work</t:String><t:String>Finance</t:String></t:Categories>
        <t:MailboxOwnerFlags><t:Flag>1</t:Flag></t:MailboxOwnerFlags>
        <t:ToRecipients>
            <t:Mailbox><t:Name>Ann</t:Name><t:EmailAddress>ann@contoso.com</t:EmailAddress></t:Mailbox>
        </t:ToRecipients>
        <t:IsRead>false</t:IsRead>
    </t:Message>"#;

    fn load(xml: &str, bag: &mut PropertyBag, requested: Option<&PropertySet>) {
        let mut reader = EwsXmlReader::new(xml.as_bytes());
        reader.read().unwrap();
        bag.load_from_xml(&mut reader, true, requested, false).unwrap();
    }

    fn loaded_message() -> PropertyBag {
        let mut bag = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        load(MESSAGE, &mut bag, None);
        bag
    }

    fn update_xml(bag: &PropertyBag) -> String {
        let mut writer = EwsXmlWriter::new();
        bag.write_to_xml_for_update(&mut writer).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn loads_known_elements_and_skips_others() {
        let bag = loaded_message();

        assert!(!bag.is_new());
        assert!(!bag.is_dirty());
        assert_eq!(
            bag.id().and_then(PropertyValue::as_item_id),
            Some(&ItemId::with_change_key("AAMkADk=", "CQAAABYA"))
        );
        assert_eq!(
            bag.get(&item::SUBJECT).unwrap().and_then(PropertyValue::as_str),
            Some("Quarterly report")
        );
        assert_eq!(bag.get(&item::CATEGORIES).unwrap().and_then(PropertyValue::as_strings).map(|c| c.len()), Some(2));
        assert_eq!(bag.get(&item::IS_READ).unwrap().and_then(PropertyValue::as_bool), Some(false));
    }

    #[test]
    fn read_only_properties_cannot_be_set() {
        let schema = item::MESSAGE.schema();
        let mut new_bag = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        let mut existing_bag = loaded_message();

        for property in schema.properties().filter(|property| property.is_read_only()) {
            for bag in [&mut new_bag, &mut existing_bag] {
                let result = bag.set(property, PropertyValue::Boolean(true));
                assert!(matches!(result, Err(Error::PropertyReadOnly(_))), "{property}");
                assert!(bag.modified_properties().is_empty(), "{property}");
            }
        }
    }

    #[test]
    fn create_only_properties_are_read_only_once_saved() {
        let mut bag = PropertyBag::new(&item::APPOINTMENT, ExchangeVersion::Exchange2013);
        bag.set(&item::UID, "040000008200E00074C5B7101A82E008").unwrap();

        bag.set(&item::ITEM_ID, ItemId::new("AAMkADk=")).unwrap_err();
        bag.mark_existing();
        assert!(matches!(
            bag.set(&item::UID, "040000008200E00074C5B7101A82E009"),
            Err(Error::PropertyReadOnly("UID"))
        ));
    }

    #[test]
    fn setting_a_property_repeatedly_records_it_once() {
        let mut bag = loaded_message();

        // An identical value still counts as a modification.
        bag.set(&item::SUBJECT, "Quarterly report").unwrap();
        assert!(bag.is_dirty());
        assert_eq!(bag.modified_properties(), [&item::SUBJECT]);

        bag.set(&item::SUBJECT, "Q1 report").unwrap();
        bag.set(&item::IS_READ, true).unwrap();
        bag.set(&item::SUBJECT, "Q1 report (final)").unwrap();
        assert_eq!(bag.modified_properties(), [&item::SUBJECT, &item::IS_READ]);
    }

    #[test]
    fn values_must_match_the_property_type() {
        let mut bag = loaded_message();

        assert!(matches!(
            bag.set(&item::SUBJECT, 42),
            Err(Error::PropertyTypeMismatch("Subject"))
        ));
        assert!(matches!(
            bag.set(&item::IMPORTANCE, PropertyValue::Enum("Urgent")),
            Err(Error::PropertyTypeMismatch("Importance"))
        ));
        bag.set(&item::IMPORTANCE, PropertyValue::from_enum(item::Importance::High))
            .unwrap();
    }

    #[test]
    fn properties_must_be_loaded_or_assigned_before_reading() {
        let bag = loaded_message();
        assert!(matches!(
            bag.get(&item::SENDER),
            Err(Error::PropertyNotLoaded("Sender"))
        ));

        let mut bag = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        let requested = PropertySet::new(BaseShape::AllProperties);
        load(MESSAGE, &mut bag, Some(&requested));
        assert_eq!(bag.get(&item::SENDER).unwrap(), None);
        assert!(matches!(
            bag.get(&item::UNIQUE_BODY),
            Err(Error::PropertyNotLoaded("UniqueBody"))
        ));

        let requested = PropertySet::new(BaseShape::AllProperties).with(&item::UNIQUE_BODY);
        load(MESSAGE, &mut bag, Some(&requested));
        assert_eq!(bag.get(&item::UNIQUE_BODY).unwrap(), None);
    }

    #[test]
    fn properties_are_gated_by_version() {
        let mut bag = PropertyBag::new(&item::APPOINTMENT, ExchangeVersion::Exchange2007Sp1);

        assert!(matches!(
            bag.get(&item::START_TIME_ZONE),
            Err(Error::VersionMismatch { name: "StartTimeZone", .. })
        ));
        assert!(matches!(
            bag.set(&item::END_TIME_ZONE, crate::complex::TimeZoneDefinition::utc()),
            Err(Error::VersionMismatch { name: "EndTimeZone", .. })
        ));
        assert!(bag.modified_properties().is_empty());
    }

    #[test]
    fn properties_of_other_types_are_rejected() {
        let mut bag = PropertyBag::new(&folder::FOLDER, ExchangeVersion::Exchange2013);
        assert!(matches!(
            bag.set(&item::SUBJECT, "Inbox"),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn written_objects_load_back_identically() {
        let mut bag = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        bag.set(&item::SUBJECT, "Lunch").unwrap();
        bag.set(&item::BODY, MessageBody::html("<p>Noon at the usual place?</p>"))
            .unwrap();
        bag.set(&item::IMPORTANCE, PropertyValue::from_enum(item::Importance::Low))
            .unwrap();
        bag.set(&item::REMINDER_MINUTES_BEFORE_START, 15).unwrap();
        bag.set(&item::IS_READ, false).unwrap();
        bag.set(&item::CATEGORIES, StringList::from(vec![String::from("Personal")]))
            .unwrap();
        bag.set(
            &item::TO_RECIPIENTS,
            EmailAddressCollection::from(vec![
                EmailAddress::with_name("Ann", "ann@contoso.com"),
                EmailAddress::new("bob@contoso.com"),
            ]),
        )
        .unwrap();

        let mut writer = EwsXmlWriter::new();
        bag.write_to_xml(&mut writer).unwrap();
        let xml = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let mut loaded = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        load(&xml, &mut loaded, None);

        for property in bag.modified_properties() {
            assert!(loaded.is_property_loaded(property), "{property}");
            assert_eq!(loaded.get(property).unwrap(), bag.get(property).unwrap(), "{property}");
        }
        assert_eq!(loaded.loaded_properties.len(), bag.modified_properties().len());
    }

    #[test]
    fn updates_contain_exactly_the_modified_properties() {
        let mut bag = loaded_message();
        bag.set(&item::SUBJECT, "Q1 report").unwrap();
        bag.set(&item::IS_READ, true).unwrap();

        let xml = update_xml(&bag);
        assert!(xml.contains(r#"<t:ItemId Id="AAMkADk=" ChangeKey="CQAAABYA""#));
        assert_eq!(xml.matches("<t:SetItemField>").count(), 2);
        assert_eq!(xml.matches("FieldURI=").count(), 2);

        let subject = xml.find(r#"FieldURI="item:Subject""#).unwrap();
        let is_read = xml.find(r#"FieldURI="message:IsRead""#).unwrap();
        assert!(subject < is_read);
        assert!(xml.contains("<t:Message><t:Subject>Q1 report</t:Subject></t:Message>"));
        assert!(!xml.contains("item:Categories"));
    }

    #[test]
    fn cleared_properties_are_deleted() {
        let mut bag = loaded_message();
        bag.set(&item::SUBJECT, "Q1 report").unwrap();
        bag.clear(&item::SUBJECT).unwrap();

        assert_eq!(bag.get(&item::SUBJECT).unwrap(), None);
        assert!(bag.modified_properties().is_empty());
        assert_eq!(bag.deleted_properties(), [&item::SUBJECT]);

        let xml = update_xml(&bag);
        assert!(!xml.contains("SetItemField"));
        assert_eq!(xml.matches("<t:DeleteItemField>").count(), 1);
        assert!(xml.contains(r#"FieldURI="item:Subject""#));

        assert!(matches!(
            bag.clear(&item::IS_READ),
            Err(Error::PropertyCannotBeDeleted("IsRead"))
        ));
    }

    #[test]
    fn collection_additions_are_appended() {
        let mut bag = loaded_message();
        bag.get_mut(&item::CATEGORIES)
            .unwrap()
            .as_strings_mut()
            .unwrap()
            .add(String::from("Urgent"));

        let xml = update_xml(&bag);
        assert!(xml.contains("<t:AppendToItemField>"));
        assert!(xml.contains("<t:Categories><t:String>Urgent</t:String></t:Categories>"));
        assert!(!xml.contains("Finance"));
    }

    #[test]
    fn collection_removals_replace_the_collection() {
        let mut bag = loaded_message();
        let categories = bag.get_mut(&item::CATEGORIES).unwrap().as_strings_mut().unwrap();
        categories.remove(&String::from("Finance"));
        categories.add(String::from("Finance"));

        // Removing and re-adding an element is not reconciled.
        assert_eq!(categories.removed_items(), [String::from("Finance")]);
        assert_eq!(categories.added_items(), [String::from("Finance")]);

        let xml = update_xml(&bag);
        assert!(xml.contains("<t:SetItemField>"));
        assert!(xml.contains("<t:String>Work</t:String><t:String>Finance</t:String>"));

        let mut bag = loaded_message();
        bag.get_mut(&item::TO_RECIPIENTS)
            .unwrap()
            .as_email_addresses_mut()
            .unwrap()
            .clear();
        let xml = update_xml(&bag);
        assert!(xml.contains("<t:DeleteItemField>"));
        assert!(xml.contains(r#"FieldURI="message:ToRecipients""#));
    }

    #[test]
    fn new_objects_cannot_be_written_as_updates() {
        let mut bag = PropertyBag::new(&item::MESSAGE, ExchangeVersion::Exchange2013);
        bag.set(&item::SUBJECT, "Draft").unwrap();

        let mut writer = EwsXmlWriter::new();
        assert!(matches!(
            bag.write_to_xml_for_update(&mut writer),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn required_properties_are_validated_for_new_objects() {
        let mut bag = PropertyBag::new(&folder::FOLDER, ExchangeVersion::Exchange2013);
        match bag.validate() {
            Err(Error::PropertyValidation { property, source }) => {
                assert_eq!(property, "DisplayName");
                assert_eq!(source, ValidationError::RequiredPropertyMissing("DisplayName"));
            }
            other => panic!("unexpected result {other:?}"),
        }

        bag.set(&folder::DISPLAY_NAME, "Receipts").unwrap();
        bag.validate().unwrap();
    }

    #[test]
    fn set_values_are_self_validated() {
        use chrono::{TimeZone, Utc};

        let mut bag = PropertyBag::new(&item::APPOINTMENT, ExchangeVersion::Exchange2013);
        bag.set(&item::START, Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap())
            .unwrap();
        bag.set(&item::END, Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap())
            .unwrap();
        bag.validate().unwrap();

        bag.set(
            &item::REQUIRED_ATTENDEES,
            AttendeeCollection::from(vec![Attendee::new("")]),
        )
        .unwrap();
        assert!(matches!(
            bag.validate(),
            Err(Error::PropertyValidation {
                property: "RequiredAttendees",
                source: ValidationError::FieldNotSpecified("EmailAddress"),
            })
        ));
    }
}
