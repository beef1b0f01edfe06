/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter},
    Error,
};

use super::ComplexProperty;

macro_rules! service_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            pub id: String,

            /// The version of the object the id was issued for.
            pub change_key: Option<String>,
        }

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self {
                    id: id.into(),
                    change_key: None,
                }
            }

            pub fn with_change_key(id: impl Into<String>, change_key: impl Into<String>) -> Self {
                Self {
                    id: id.into(),
                    change_key: Some(change_key.into()),
                }
            }
        }

        impl ComplexProperty for $name {
            fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
                self.id = reader.read_attribute_value("Id").unwrap_or_default().to_string();
                self.change_key = reader.read_attribute_value("ChangeKey").map(str::to_string);

                Ok(())
            }

            fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
                writer.write_attribute_value("Id", self.id.as_str())?;
                if let Some(change_key) = &self.change_key {
                    writer.write_attribute_value("ChangeKey", change_key.as_str())?;
                }

                Ok(())
            }
        }
    };
}

service_id!(
    /// The identifier of an item.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemid>
    ItemId
);

service_id!(
    /// The identifier of a folder.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderid>
    FolderId
);
