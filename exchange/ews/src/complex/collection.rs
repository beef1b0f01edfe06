/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;

use tracing::debug;

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{Attendee, ComplexProperty, EmailAddress};

/// An element of a change-tracked collection property.
pub trait CollectionItem: Clone + fmt::Debug + PartialEq {
    /// Creates an empty item for the given child element name, or `None` if
    /// the collection doesn't hold elements of that name.
    fn create_from_xml_element_name(name: &str) -> Option<Self>;

    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error>;

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error>;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl CollectionItem for String {
    fn create_from_xml_element_name(name: &str) -> Option<Self> {
        (name == "String").then(String::new)
    }

    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        *self = reader.read_element_value()?;

        Ok(())
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_element_value(XmlNamespace::Types, "String", self)
    }
}

impl CollectionItem for EmailAddress {
    fn create_from_xml_element_name(name: &str) -> Option<Self> {
        (name == "Mailbox").then(EmailAddress::default)
    }

    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        ComplexProperty::load_from_xml(self, reader)
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        ComplexProperty::write_to_xml(self, writer, XmlNamespace::Types, "Mailbox")
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ComplexProperty::validate(self)
    }
}

impl CollectionItem for Attendee {
    fn create_from_xml_element_name(name: &str) -> Option<Self> {
        (name == "Attendee").then(Attendee::default)
    }

    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        ComplexProperty::load_from_xml(self, reader)
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        ComplexProperty::write_to_xml(self, writer, XmlNamespace::Types, "Attendee")
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ComplexProperty::validate(self)
    }
}

/// A collection property which remembers the items added and removed since
/// it was loaded, so that an update can append rather than replace.
///
/// Removing an item and adding it back records both operations; the two are
/// not reconciled.
#[derive(Clone, Debug)]
pub struct ComplexPropertyCollection<T> {
    items: Vec<T>,
    added_items: Vec<T>,
    removed_items: Vec<T>,
}

pub type StringList = ComplexPropertyCollection<String>;
pub type EmailAddressCollection = ComplexPropertyCollection<EmailAddress>;
pub type AttendeeCollection = ComplexPropertyCollection<Attendee>;

impl<T> Default for ComplexPropertyCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            added_items: Vec::new(),
            removed_items: Vec::new(),
        }
    }
}

// Two collections are equal when they hold the same items, whatever their
// change history.
impl<T: PartialEq> PartialEq for ComplexPropertyCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: CollectionItem> ComplexPropertyCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn add(&mut self, item: T) {
        self.added_items.push(item.clone());
        self.items.push(item);
    }

    /// Removes the first item equal to `item`, returning whether one was
    /// found.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|existing| existing == item) {
            Some(position) => {
                let removed = self.items.remove(position);
                self.removed_items.push(removed);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.removed_items.append(&mut self.items);
    }

    pub fn added_items(&self) -> &[T] {
        &self.added_items
    }

    pub fn removed_items(&self) -> &[T] {
        &self.removed_items
    }

    pub fn clear_change_log(&mut self) {
        self.added_items.clear();
        self.removed_items.clear();
    }

    /// Replaces the contents with the children of the current element.
    pub(crate) fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        self.items.clear();
        reader.read_children(|reader| {
            match T::create_from_xml_element_name(reader.local_name()) {
                Some(mut item) => {
                    item.load_from_xml(reader)?;
                    self.items.push(item);
                }
                None => {
                    debug!(element = reader.local_name(), "skipping unexpected collection element");
                    reader.skip_current_element()?;
                }
            }

            Ok(())
        })?;
        self.clear_change_log();

        Ok(())
    }
}

impl<T: CollectionItem> From<Vec<T>> for ComplexPropertyCollection<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }
}

impl<T: CollectionItem> FromIterator<T> for ComplexPropertyCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a, T> IntoIterator for &'a ComplexPropertyCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The view of a collection property the property bag needs to build
/// update diffs, independent of the item type.
pub(crate) trait ChangeTrackedCollection {
    fn len(&self) -> usize;

    fn added_count(&self) -> usize;

    fn removed_count(&self) -> usize;

    fn write_items_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error>;

    fn write_added_items_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error>;

    fn validate_items(&self) -> Result<(), ValidationError>;

    fn clear_change_log(&mut self);
}

impl<T: CollectionItem> ChangeTrackedCollection for ComplexPropertyCollection<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn added_count(&self) -> usize {
        self.added_items.len()
    }

    fn removed_count(&self) -> usize {
        self.removed_items.len()
    }

    fn write_items_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.items.iter().try_for_each(|item| item.write_to_xml(writer))
    }

    fn write_added_items_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.added_items.iter().try_for_each(|item| item.write_to_xml(writer))
    }

    fn validate_items(&self) -> Result<(), ValidationError> {
        self.items.iter().try_for_each(|item| item.validate())
    }

    fn clear_change_log(&mut self) {
        ComplexPropertyCollection::clear_change_log(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_then_re_adding_records_both_operations() {
        let mut categories = StringList::from(vec![String::from("Red"), String::from("Blue")]);

        assert!(categories.remove(&String::from("Red")));
        categories.add(String::from("Red"));

        // The two operations are kept as they were made, not netted out.
        assert_eq!(categories.removed_items(), [String::from("Red")]);
        assert_eq!(categories.added_items(), [String::from("Red")]);
        assert_eq!(categories.items(), [String::from("Blue"), String::from("Red")]);
    }

    #[test]
    fn unknown_children_are_skipped() {
        let xml = br#"<t:Categories xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:String>Red</t:String>
            <t:Colour>ignored</t:Colour>
            <t:String>Blue</t:String>
        </t:Categories>"#;

        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Types, "Categories").unwrap();

        let mut categories = StringList::new();
        categories.add(String::from("stale"));
        categories.load_from_xml(&mut reader).unwrap();

        assert_eq!(categories.items(), [String::from("Red"), String::from("Blue")]);
        assert!(categories.added_items().is_empty());
    }
}
