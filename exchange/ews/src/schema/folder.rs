/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Folder types and their properties.

use once_cell::sync::Lazy;

use crate::{
    property::{PropertyDefinition, PropertyDefinitionFlags as F, PropertyKind},
    version::ExchangeVersion::Exchange2007Sp1,
};

use super::{ObjectKind, Schema, ServiceObjectType};

const fn property(
    xml_element_name: &'static str,
    uri: &'static str,
    kind: PropertyKind,
    flags: F,
) -> PropertyDefinition {
    PropertyDefinition::new(xml_element_name, uri, kind, flags, Exchange2007Sp1)
}

pub static FOLDER_ID: PropertyDefinition = property("FolderId", "folder:FolderId", PropertyKind::FolderId, F::CAN_FIND);
pub static PARENT_FOLDER_ID: PropertyDefinition = property(
    "ParentFolderId",
    "folder:ParentFolderId",
    PropertyKind::FolderId,
    F::CAN_FIND,
);
pub static FOLDER_CLASS: PropertyDefinition = property(
    "FolderClass",
    "folder:FolderClass",
    PropertyKind::String,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_FIND),
);
pub static DISPLAY_NAME: PropertyDefinition = property(
    "DisplayName",
    "folder:DisplayName",
    PropertyKind::String,
    F::CAN_SET
        .union(F::CAN_UPDATE)
        .union(F::CAN_FIND)
        .union(F::REQUIRED_FOR_CREATE),
);
pub static TOTAL_COUNT: PropertyDefinition = property(
    "TotalCount",
    "folder:TotalCount",
    PropertyKind::Integer,
    F::CAN_FIND,
);
pub static CHILD_FOLDER_COUNT: PropertyDefinition = property(
    "ChildFolderCount",
    "folder:ChildFolderCount",
    PropertyKind::Integer,
    F::CAN_FIND,
);
pub static UNREAD_COUNT: PropertyDefinition = property(
    "UnreadCount",
    "folder:UnreadCount",
    PropertyKind::Integer,
    F::CAN_FIND,
);
pub static SEARCH_PARAMETERS: PropertyDefinition = property(
    "SearchParameters",
    "folder:SearchParameters",
    PropertyKind::SearchParameters,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::REQUIRED_FOR_CREATE),
);

/// Properties shared by every folder type, including calendar and contacts
/// folders which carry no unread count.
pub static BASE_FOLDER_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("BaseFolder")
        .id(&FOLDER_ID)
        .add(&PARENT_FOLDER_ID)
        .add(&FOLDER_CLASS)
        .add(&DISPLAY_NAME)
        .add(&TOTAL_COUNT)
        .add(&CHILD_FOLDER_COUNT)
        .build()
});

pub static FOLDER_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Folder")
        .extend(&BASE_FOLDER_SCHEMA)
        .add(&UNREAD_COUNT)
        .build()
});

pub static SEARCH_FOLDER_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("SearchFolder")
        .extend(&FOLDER_SCHEMA)
        .add(&SEARCH_PARAMETERS)
        .build()
});

pub static FOLDER: ServiceObjectType =
    ServiceObjectType::new("Folder", ObjectKind::Folder, &FOLDER_SCHEMA, Exchange2007Sp1);
pub static CALENDAR_FOLDER: ServiceObjectType =
    ServiceObjectType::new("CalendarFolder", ObjectKind::Folder, &BASE_FOLDER_SCHEMA, Exchange2007Sp1);
pub static CONTACTS_FOLDER: ServiceObjectType =
    ServiceObjectType::new("ContactsFolder", ObjectKind::Folder, &BASE_FOLDER_SCHEMA, Exchange2007Sp1);
pub static TASKS_FOLDER: ServiceObjectType =
    ServiceObjectType::new("TasksFolder", ObjectKind::Folder, &FOLDER_SCHEMA, Exchange2007Sp1);
pub static SEARCH_FOLDER: ServiceObjectType =
    ServiceObjectType::new("SearchFolder", ObjectKind::Folder, &SEARCH_FOLDER_SCHEMA, Exchange2007Sp1);
