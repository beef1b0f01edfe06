/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::{
    version::ExchangeVersion,
    xml::{EwsXmlWriter, XmlNamespace},
    Error,
};

use super::PropertyKind;

bitflags::bitflags! {
    /// What may be done with a property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyDefinitionFlags: u16 {
        /// The property may be given a value on a new object.
        const CAN_SET = 1 << 0;
        /// The property may be changed on an existing object.
        const CAN_UPDATE = 1 << 1;
        /// The property may be cleared on an existing object.
        const CAN_DELETE = 1 << 2;
        /// Items may be appended to the collection without resending it.
        const CAN_APPEND = 1 << 3;
        /// The property is returned by FindItem / FindFolder.
        const CAN_FIND = 1 << 4;
        /// The property is only returned when requested by name.
        const MUST_BE_EXPLICITLY_LOADED = 1 << 5;
        /// The property must have a value before the object is created.
        const REQUIRED_FOR_CREATE = 1 << 6;
        /// Settable, updatable, deletable and returned by FindItem.
        const EDITABLE = Self::CAN_SET.bits()
            | Self::CAN_UPDATE.bits()
            | Self::CAN_DELETE.bits()
            | Self::CAN_FIND.bits();
    }
}

/// The immutable description of one property of a service object type.
///
/// Definitions are statics, compared and hashed by their FieldURI, which is
/// unique across all schemas.
#[derive(Debug)]
pub struct PropertyDefinition {
    xml_element_name: &'static str,
    uri: &'static str,
    kind: PropertyKind,
    flags: PropertyDefinitionFlags,
    version: ExchangeVersion,
}

impl PropertyDefinition {
    pub const fn new(
        xml_element_name: &'static str,
        uri: &'static str,
        kind: PropertyKind,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self {
            xml_element_name,
            uri,
            kind,
            flags,
            version,
        }
    }

    pub fn xml_element_name(&self) -> &'static str {
        self.xml_element_name
    }

    /// The FieldURI identifying the property in requests, e.g.
    /// `item:Subject`.
    pub fn uri(&self) -> &'static str {
        self.uri
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn flags(&self) -> PropertyDefinitionFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: PropertyDefinitionFlags) -> bool {
        self.flags.contains(flag)
    }

    /// The first version of Exchange which supports the property.
    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    /// Whether the property can never be written by a client.
    pub fn is_read_only(&self) -> bool {
        !self.has_flag(PropertyDefinitionFlags::CAN_SET) && !self.has_flag(PropertyDefinitionFlags::CAN_UPDATE)
    }

    pub(crate) fn check_version(&self, requested: ExchangeVersion) -> Result<(), Error> {
        if self.version > requested {
            return Err(Error::VersionMismatch {
                name: self.xml_element_name,
                minimum: self.version,
                requested,
            });
        }

        Ok(())
    }

    /// Writes the property's path, `<t:FieldURI FieldURI="…"/>`.
    pub(crate) fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, "FieldURI")?;
        writer.write_attribute_value("FieldURI", self.uri)?;
        writer.write_end_element()
    }
}

impl PartialEq for PropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for PropertyDefinition {}

impl Hash for PropertyDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl fmt::Display for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri)
    }
}
