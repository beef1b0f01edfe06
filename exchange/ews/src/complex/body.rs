/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum},
    Error,
};

use super::ComplexProperty;

/// The content type of a body.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/body>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum BodyType {
    #[xml_enum(rename = "HTML")]
    Html,
    #[default]
    Text,
}

/// The body of an item, or its unique body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageBody {
    pub body_type: BodyType,
    pub text: String,
}

impl MessageBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::Text,
            text: text.into(),
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::Html,
            text: text.into(),
        }
    }
}

impl ComplexProperty for MessageBody {
    fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        self.body_type = reader.read_attribute_enum("BodyType")?.unwrap_or_default();

        Ok(())
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_enum("BodyType", self.body_type)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_value(&self.text)
    }

    // The body is text content rather than child elements.
    fn load_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<(), Error> {
        self.read_attributes_from_xml(reader)?;
        self.text = reader.read_element_value()?;

        Ok(())
    }
}
