/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The property schemas of each service object type, and the registry
//! mapping XML element names to those types.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::{property::PropertyDefinition, version::ExchangeVersion};

pub mod folder;
pub mod item;

/// The ordered set of properties of one service object type.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    id_property: Option<&'static PropertyDefinition>,
    properties: Vec<&'static PropertyDefinition>,
    by_element_name: HashMap<&'static str, &'static PropertyDefinition>,
}

impl Schema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            name,
            id_property: None,
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The property holding the object's identity.
    pub fn id_property(&self) -> Option<&'static PropertyDefinition> {
        self.id_property
    }

    /// Every property, in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &'static PropertyDefinition> + '_ {
        self.properties.iter().copied()
    }

    pub fn contains(&self, property: &PropertyDefinition) -> bool {
        self.by_element_name
            .get(property.xml_element_name())
            .is_some_and(|found| *found == property)
    }

    pub fn find_by_element_name(&self, name: &str) -> Option<&'static PropertyDefinition> {
        self.by_element_name.get(name).copied()
    }
}

/// Builds a [`Schema`], usually by extending the schema of the parent type.
pub struct SchemaBuilder {
    name: &'static str,
    id_property: Option<&'static PropertyDefinition>,
    properties: Vec<&'static PropertyDefinition>,
}

impl SchemaBuilder {
    pub fn extend(mut self, parent: &Schema) -> Self {
        self.id_property = self.id_property.or(parent.id_property);
        self.properties.extend(parent.properties());
        self
    }

    pub fn id(mut self, property: &'static PropertyDefinition) -> Self {
        self.id_property = Some(property);
        self.add(property)
    }

    pub fn add(mut self, property: &'static PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Builds the schema.
    ///
    /// # Panics
    ///
    /// Panics if two properties share an XML element name, since elements
    /// could then not be mapped back to properties.
    pub fn build(self) -> Schema {
        let mut by_element_name = HashMap::with_capacity(self.properties.len());
        for property in &self.properties {
            if let Some(existing) = by_element_name.insert(property.xml_element_name(), *property) {
                panic!(
                    "schema {} maps element {} to both {} and {}",
                    self.name,
                    property.xml_element_name(),
                    existing.uri(),
                    property.uri()
                );
            }
        }

        Schema {
            name: self.name,
            id_property: self.id_property,
            properties: self.properties,
            by_element_name,
        }
    }
}

/// Whether an object type is stored as an item or a folder, which decides
/// the element names used to update it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Item,
    Folder,
}

impl ObjectKind {
    pub fn change_element_name(self) -> &'static str {
        match self {
            Self::Item => "ItemChange",
            Self::Folder => "FolderChange",
        }
    }

    pub fn set_field_element_name(self) -> &'static str {
        match self {
            Self::Item => "SetItemField",
            Self::Folder => "SetFolderField",
        }
    }

    pub fn append_field_element_name(self) -> &'static str {
        match self {
            Self::Item => "AppendToItemField",
            Self::Folder => "AppendToFolderField",
        }
    }

    pub fn delete_field_element_name(self) -> &'static str {
        match self {
            Self::Item => "DeleteItemField",
            Self::Folder => "DeleteFolderField",
        }
    }

    pub fn id_element_name(self) -> &'static str {
        match self {
            Self::Item => "ItemId",
            Self::Folder => "FolderId",
        }
    }

    /// The element listing identifiers of this kind, e.g. `ItemIds`.
    pub fn ids_element_name(self) -> &'static str {
        match self {
            Self::Item => "ItemIds",
            Self::Folder => "FolderIds",
        }
    }

    /// The element wrapping objects of this kind in requests and responses.
    pub fn collection_element_name(self) -> &'static str {
        match self {
            Self::Item => "Items",
            Self::Folder => "Folders",
        }
    }

    pub fn shape_element_name(self) -> &'static str {
        match self {
            Self::Item => "ItemShape",
            Self::Folder => "FolderShape",
        }
    }
}

/// A concrete service object type, e.g. a message or a calendar folder.
#[derive(Debug)]
pub struct ServiceObjectType {
    xml_element_name: &'static str,
    kind: ObjectKind,
    schema: &'static Lazy<Schema>,
    minimum_version: ExchangeVersion,
}

impl ServiceObjectType {
    pub const fn new(
        xml_element_name: &'static str,
        kind: ObjectKind,
        schema: &'static Lazy<Schema>,
        minimum_version: ExchangeVersion,
    ) -> Self {
        Self {
            xml_element_name,
            kind,
            schema,
            minimum_version,
        }
    }

    pub fn xml_element_name(&self) -> &'static str {
        self.xml_element_name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn schema(&self) -> &'static Schema {
        Lazy::force(self.schema)
    }

    pub fn minimum_version(&self) -> ExchangeVersion {
        self.minimum_version
    }
}

impl PartialEq for ServiceObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.xml_element_name == other.xml_element_name
    }
}

impl Eq for ServiceObjectType {}

static OBJECT_TYPES: &[&ServiceObjectType] = &[
    &item::ITEM,
    &item::MESSAGE,
    &item::APPOINTMENT,
    &item::TASK,
    &item::CONTACT,
    &folder::FOLDER,
    &folder::CALENDAR_FOLDER,
    &folder::CONTACTS_FOLDER,
    &folder::TASKS_FOLDER,
    &folder::SEARCH_FOLDER,
];

static PROPERTIES_BY_URI: Lazy<HashMap<&'static str, &'static PropertyDefinition>> = Lazy::new(|| {
    OBJECT_TYPES
        .iter()
        .flat_map(|object_type| object_type.schema().properties())
        .map(|property| (property.uri(), property))
        .collect()
});

/// Finds the object type written with the given element name.
pub fn object_type_for_element(name: &str) -> Option<&'static ServiceObjectType> {
    OBJECT_TYPES
        .iter()
        .copied()
        .find(|object_type| object_type.xml_element_name == name)
}

/// Finds a property of any object type by its FieldURI.
pub fn property_for_uri(uri: &str) -> Option<&'static PropertyDefinition> {
    PROPERTIES_BY_URI.get(uri).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_schema_builds() {
        for object_type in OBJECT_TYPES {
            let schema = object_type.schema();
            assert!(schema.id_property().is_some(), "{}", schema.name());

            for property in schema.properties() {
                assert_eq!(
                    schema.find_by_element_name(property.xml_element_name()),
                    Some(property),
                    "{}",
                    property
                );
            }
        }
    }

    #[test]
    fn derived_schemas_keep_parent_order() {
        let item = item::ITEM.schema();
        let message = item::MESSAGE.schema();

        let inherited: Vec<_> = message.properties().take(item.properties().count()).collect();
        assert_eq!(inherited, item.properties().collect::<Vec<_>>());
        assert!(message.contains(&item::SUBJECT));
        assert!(!item.contains(&item::TO_RECIPIENTS));
    }

    #[test]
    fn registry_lookups() {
        assert_eq!(object_type_for_element("CalendarItem"), Some(&item::APPOINTMENT));
        assert_eq!(object_type_for_element("SearchFolder"), Some(&folder::SEARCH_FOLDER));
        assert!(object_type_for_element("PostItem").is_none());

        assert_eq!(property_for_uri("item:Subject"), Some(&item::SUBJECT));
        assert_eq!(property_for_uri("calendar:Recurrence"), Some(&item::APPOINTMENT_RECURRENCE));
    }

    #[test]
    #[should_panic(expected = "maps element Subject")]
    fn duplicate_element_names_are_rejected() {
        Schema::builder("Broken")
            .add(&item::SUBJECT)
            .add(&item::SUBJECT)
            .build();
    }
}
