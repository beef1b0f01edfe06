/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    schema::Schema,
    types::BaseShape,
    version::ExchangeVersion,
    xml::{EwsXmlWriter, XmlNamespace},
    Error,
};

use super::{PropertyDefinition, PropertyDefinitionFlags};

/// The properties to request from the server when loading objects.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemshape>
#[derive(Clone, Debug, Default)]
pub struct PropertySet {
    base_shape: BaseShape,
    additional_properties: Vec<&'static PropertyDefinition>,
}

impl PropertySet {
    pub fn new(base_shape: BaseShape) -> Self {
        Self {
            base_shape,
            additional_properties: Vec::new(),
        }
    }

    pub fn id_only() -> Self {
        Self::new(BaseShape::IdOnly)
    }

    pub fn first_class_properties() -> Self {
        Self::new(BaseShape::AllProperties)
    }

    /// Adds a property to those requested.
    pub fn with(mut self, property: &'static PropertyDefinition) -> Self {
        if !self.additional_properties.contains(&property) {
            self.additional_properties.push(property);
        }

        self
    }

    pub fn base_shape(&self) -> BaseShape {
        self.base_shape
    }

    pub fn additional_properties(&self) -> &[&'static PropertyDefinition] {
        &self.additional_properties
    }

    /// Whether a response to a request with this property set carries the
    /// value of `property`, so that its absence means the value is unset.
    ///
    /// FindItem responses (`summary_only`) leave out properties which can't
    /// be returned by a search, even when the shape would include them.
    pub fn includes(&self, property: &'static PropertyDefinition, schema: &Schema, summary_only: bool) -> bool {
        if self.additional_properties.contains(&property) {
            return true;
        }

        match self.base_shape {
            BaseShape::IdOnly | BaseShape::Default => schema.id_property() == Some(property),
            BaseShape::AllProperties => {
                schema.contains(property)
                    && !property.has_flag(PropertyDefinitionFlags::MUST_BE_EXPLICITLY_LOADED)
                    && (!summary_only || property.has_flag(PropertyDefinitionFlags::CAN_FIND))
            }
        }
    }

    /// Fails if any requested property is newer than `version`.
    pub(crate) fn check_version(&self, version: ExchangeVersion) -> Result<(), Error> {
        self.additional_properties
            .iter()
            .try_for_each(|property| property.check_version(version))
    }

    /// Writes the set as an `ItemShape` or `FolderShape` element.
    pub(crate) fn write_to_xml(&self, writer: &mut EwsXmlWriter, shape_element_name: &str) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Messages, shape_element_name)?;
        writer.write_element_enum(XmlNamespace::Types, "BaseShape", self.base_shape)?;

        if !self.additional_properties.is_empty() {
            writer.write_start_element(XmlNamespace::Types, "AdditionalProperties")?;
            for property in &self.additional_properties {
                property.write_to_xml(writer)?;
            }
            writer.write_end_element()?;
        }

        writer.write_end_element()
    }
}
