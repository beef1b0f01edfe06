/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    property::PropertyDefinition,
    types::{write_folder_ids, FolderIdentifier, SearchFolderTraversal},
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error, ValidationError,
};

use super::ComplexProperty;

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/contains>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum ContainmentMode {
    FullString,
    Prefixed,
    Substring,
    PrefixOnWords,
    ExactPhrase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum ContainmentComparison {
    Exact,
    IgnoreCase,
    IgnoreNonSpacingCharacters,
    Loose,
    IgnoreCaseAndNonSpacingCharacters,
    LooseAndIgnoreCase,
    LooseAndIgnoreNonSpace,
    LooseAndIgnoreCaseAndIgnoreNonSpace,
}

/// The right-hand side of a comparison: either a constant or the value of
/// another property of the same item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Constant(String),
    Property(String),
}

/// The fields shared by the relational filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comparison {
    /// The FieldURI of the property being compared.
    pub property: Option<String>,
    pub value: Option<FilterValue>,
}

/// A restriction on the items returned by a search.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/restriction>
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchFilter {
    IsEqualTo(Comparison),
    IsNotEqualTo(Comparison),
    IsGreaterThan(Comparison),
    IsGreaterThanOrEqualTo(Comparison),
    IsLessThan(Comparison),
    IsLessThanOrEqualTo(Comparison),
    Contains {
        property: Option<String>,
        value: Option<String>,
        mode: Option<ContainmentMode>,
        comparison: Option<ContainmentComparison>,
    },
    Excludes {
        property: Option<String>,
        bitmask: Option<String>,
    },
    Exists {
        property: Option<String>,
    },
    And(Vec<SearchFilter>),
    Or(Vec<SearchFilter>),
    Not(Option<Box<SearchFilter>>),
}

fn comparison(property: &PropertyDefinition, value: impl Into<String>) -> Comparison {
    Comparison {
        property: Some(property.uri().to_string()),
        value: Some(FilterValue::Constant(value.into())),
    }
}

impl SearchFilter {
    pub fn is_equal_to(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsEqualTo(comparison(property, value))
    }

    pub fn is_not_equal_to(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsNotEqualTo(comparison(property, value))
    }

    pub fn is_greater_than(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsGreaterThan(comparison(property, value))
    }

    pub fn is_greater_than_or_equal_to(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsGreaterThanOrEqualTo(comparison(property, value))
    }

    pub fn is_less_than(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsLessThan(comparison(property, value))
    }

    pub fn is_less_than_or_equal_to(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::IsLessThanOrEqualTo(comparison(property, value))
    }

    pub fn contains_substring(property: &PropertyDefinition, value: impl Into<String>) -> Self {
        Self::Contains {
            property: Some(property.uri().to_string()),
            value: Some(value.into()),
            mode: Some(ContainmentMode::Substring),
            comparison: Some(ContainmentComparison::IgnoreCase),
        }
    }

    pub fn exists(property: &PropertyDefinition) -> Self {
        Self::Exists {
            property: Some(property.uri().to_string()),
        }
    }

    pub fn not(filter: SearchFilter) -> Self {
        Self::Not(Some(Box::new(filter)))
    }

    /// Creates an empty filter of the kind named by an element, or `None` if
    /// the name isn't a search filter.
    pub fn create_from_xml(element_name: &str) -> Option<Self> {
        let filter = match element_name {
            "IsEqualTo" => Self::IsEqualTo(Comparison::default()),
            "IsNotEqualTo" => Self::IsNotEqualTo(Comparison::default()),
            "IsGreaterThan" => Self::IsGreaterThan(Comparison::default()),
            "IsGreaterThanOrEqualTo" => Self::IsGreaterThanOrEqualTo(Comparison::default()),
            "IsLessThan" => Self::IsLessThan(Comparison::default()),
            "IsLessThanOrEqualTo" => Self::IsLessThanOrEqualTo(Comparison::default()),
            "Contains" => Self::Contains {
                property: None,
                value: None,
                mode: None,
                comparison: None,
            },
            "Excludes" => Self::Excludes {
                property: None,
                bitmask: None,
            },
            "Exists" => Self::Exists { property: None },
            "And" => Self::And(Vec::new()),
            "Or" => Self::Or(Vec::new()),
            "Not" => Self::Not(None),
            _ => return None,
        };

        Some(filter)
    }

    pub fn xml_element_name(&self) -> &'static str {
        match self {
            Self::IsEqualTo(_) => "IsEqualTo",
            Self::IsNotEqualTo(_) => "IsNotEqualTo",
            Self::IsGreaterThan(_) => "IsGreaterThan",
            Self::IsGreaterThanOrEqualTo(_) => "IsGreaterThanOrEqualTo",
            Self::IsLessThan(_) => "IsLessThan",
            Self::IsLessThanOrEqualTo(_) => "IsLessThanOrEqualTo",
            Self::Contains { .. } => "Contains",
            Self::Excludes { .. } => "Excludes",
            Self::Exists { .. } => "Exists",
            Self::And(_) => "And",
            Self::Or(_) => "Or",
            Self::Not(_) => "Not",
        }
    }

    fn property_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Self::IsEqualTo(comparison)
            | Self::IsNotEqualTo(comparison)
            | Self::IsGreaterThan(comparison)
            | Self::IsGreaterThanOrEqualTo(comparison)
            | Self::IsLessThan(comparison)
            | Self::IsLessThanOrEqualTo(comparison) => Some(&mut comparison.property),
            Self::Contains { property, .. } | Self::Excludes { property, .. } | Self::Exists { property } => {
                Some(property)
            }
            Self::And(_) | Self::Or(_) | Self::Not(_) => None,
        }
    }

    fn property(&self) -> Option<&Option<String>> {
        match self {
            Self::IsEqualTo(comparison)
            | Self::IsNotEqualTo(comparison)
            | Self::IsGreaterThan(comparison)
            | Self::IsGreaterThanOrEqualTo(comparison)
            | Self::IsLessThan(comparison)
            | Self::IsLessThanOrEqualTo(comparison) => Some(&comparison.property),
            Self::Contains { property, .. } | Self::Excludes { property, .. } | Self::Exists { property } => {
                Some(property)
            }
            Self::And(_) | Self::Or(_) | Self::Not(_) => None,
        }
    }

    /// Writes the filter wrapped in a `Restriction` element.
    pub(crate) fn write_restriction(&self, writer: &mut EwsXmlWriter, namespace: XmlNamespace) -> Result<(), Error> {
        writer.write_start_element(namespace, "Restriction")?;
        self.write_to_xml(writer, XmlNamespace::Types, self.xml_element_name())?;
        writer.write_end_element()
    }
}

impl ComplexProperty for SearchFilter {
    fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        if let Self::Contains { mode, comparison, .. } = self {
            *mode = reader.read_attribute_enum("ContainmentMode")?;
            *comparison = reader.read_attribute_enum("ContainmentComparison")?;
        }

        Ok(())
    }

    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        if reader.local_name() == "FieldURI" {
            if let Some(property) = self.property_mut() {
                *property = reader.read_attribute_value("FieldURI").map(str::to_string);
                reader.skip_current_element()?;
                return Ok(true);
            }
        }

        match self {
            Self::IsEqualTo(comparison)
            | Self::IsNotEqualTo(comparison)
            | Self::IsGreaterThan(comparison)
            | Self::IsGreaterThanOrEqualTo(comparison)
            | Self::IsLessThan(comparison)
            | Self::IsLessThanOrEqualTo(comparison) => {
                if reader.local_name() != "FieldURIOrConstant" {
                    return Ok(false);
                }

                reader.read_children(|reader| {
                    match reader.local_name() {
                        "Constant" => {
                            let value = reader.read_attribute_value("Value").unwrap_or_default();
                            comparison.value = Some(FilterValue::Constant(value.to_string()));
                        }
                        "FieldURI" => {
                            let uri = reader.read_attribute_value("FieldURI").unwrap_or_default();
                            comparison.value = Some(FilterValue::Property(uri.to_string()));
                        }
                        _ => {}
                    }
                    reader.skip_current_element()
                })?;
            }
            Self::Contains { value, .. } => {
                if reader.local_name() != "Constant" {
                    return Ok(false);
                }
                *value = reader.read_attribute_value("Value").map(str::to_string);
                reader.skip_current_element()?;
            }
            Self::Excludes { bitmask, .. } => {
                if reader.local_name() != "Bitmask" {
                    return Ok(false);
                }
                *bitmask = reader.read_attribute_value("Value").map(str::to_string);
                reader.skip_current_element()?;
            }
            Self::Exists { .. } => return Ok(false),
            Self::And(filters) | Self::Or(filters) => match SearchFilter::create_from_xml(reader.local_name()) {
                Some(mut filter) => {
                    filter.load_from_xml(reader)?;
                    filters.push(filter);
                }
                None => return Ok(false),
            },
            Self::Not(negated) => match SearchFilter::create_from_xml(reader.local_name()) {
                Some(mut filter) => {
                    filter.load_from_xml(reader)?;
                    *negated = Some(Box::new(filter));
                }
                None => return Ok(false),
            },
        }

        Ok(true)
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Self::Contains { mode, comparison, .. } = self {
            if let Some(mode) = mode {
                writer.write_attribute_enum("ContainmentMode", *mode)?;
            }
            if let Some(comparison) = comparison {
                writer.write_attribute_enum("ContainmentComparison", *comparison)?;
            }
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(Some(property)) = self.property() {
            write_field_uri(writer, property)?;
        }

        match self {
            Self::IsEqualTo(comparison)
            | Self::IsNotEqualTo(comparison)
            | Self::IsGreaterThan(comparison)
            | Self::IsGreaterThanOrEqualTo(comparison)
            | Self::IsLessThan(comparison)
            | Self::IsLessThanOrEqualTo(comparison) => {
                writer.write_start_element(XmlNamespace::Types, "FieldURIOrConstant")?;
                match &comparison.value {
                    Some(FilterValue::Constant(value)) => {
                        writer.write_start_element(XmlNamespace::Types, "Constant")?;
                        writer.write_attribute_value("Value", value.as_str())?;
                        writer.write_end_element()?;
                    }
                    Some(FilterValue::Property(uri)) => write_field_uri(writer, uri)?,
                    None => {}
                }
                writer.write_end_element()
            }
            Self::Contains { value, .. } => {
                writer.write_start_element(XmlNamespace::Types, "Constant")?;
                writer.write_attribute_value("Value", value.as_deref().unwrap_or_default())?;
                writer.write_end_element()
            }
            Self::Excludes { bitmask, .. } => {
                writer.write_start_element(XmlNamespace::Types, "Bitmask")?;
                writer.write_attribute_value("Value", bitmask.as_deref().unwrap_or_default())?;
                writer.write_end_element()
            }
            Self::Exists { .. } => Ok(()),
            Self::And(filters) | Self::Or(filters) => filters
                .iter()
                .try_for_each(|filter| filter.write_to_xml(writer, XmlNamespace::Types, filter.xml_element_name())),
            Self::Not(negated) => match negated {
                Some(filter) => filter.write_to_xml(writer, XmlNamespace::Types, filter.xml_element_name()),
                None => Ok(()),
            },
        }
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        if let Some(None) = self.property() {
            return Err(ValidationError::SearchFilterPropertyMissing);
        }

        match self {
            Self::IsEqualTo(comparison)
            | Self::IsNotEqualTo(comparison)
            | Self::IsGreaterThan(comparison)
            | Self::IsGreaterThanOrEqualTo(comparison)
            | Self::IsLessThan(comparison)
            | Self::IsLessThanOrEqualTo(comparison) => match comparison.value {
                Some(_) => Ok(()),
                None => Err(ValidationError::FieldNotSpecified("FieldURIOrConstant")),
            },
            Self::Contains { value: None, .. } => Err(ValidationError::FieldNotSpecified("Constant")),
            Self::Excludes { bitmask: None, .. } => Err(ValidationError::FieldNotSpecified("Bitmask")),
            Self::And(filters) | Self::Or(filters) => filters.iter().try_for_each(|filter| filter.validate()),
            Self::Not(None) => Err(ValidationError::NotFilterWithoutFilter),
            Self::Not(Some(filter)) => filter.validate(),
            _ => Ok(()),
        }
    }
}

fn write_field_uri(writer: &mut EwsXmlWriter, uri: &str) -> Result<(), Error> {
    writer.write_start_element(XmlNamespace::Types, "FieldURI")?;
    writer.write_attribute_value("FieldURI", uri)?;
    writer.write_end_element()
}

/// The definition of a search folder's contents.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/searchparameters>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchFolderParameters {
    pub traversal: SearchFolderTraversal,
    pub restriction: Option<SearchFilter>,
    pub base_folder_ids: Vec<FolderIdentifier>,
}

impl ComplexProperty for SearchFolderParameters {
    fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        self.traversal = reader.read_attribute_enum("Traversal")?.unwrap_or_default();

        Ok(())
    }

    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "Restriction" => {
                let mut restriction = None;
                reader.read_children(|reader| {
                    match SearchFilter::create_from_xml(reader.local_name()) {
                        Some(mut filter) => {
                            filter.load_from_xml(reader)?;
                            restriction = Some(filter);
                            Ok(())
                        }
                        None => reader.skip_current_element(),
                    }
                })?;
                self.restriction = restriction;
            }
            "BaseFolderIds" => {
                let mut ids = Vec::new();
                reader.read_children(|reader| {
                    match FolderIdentifier::try_read_from_xml(reader)? {
                        Some(id) => ids.push(id),
                        None => reader.skip_current_element()?,
                    }

                    Ok(())
                })?;
                self.base_folder_ids = ids;
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_enum("Traversal", self.traversal)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(restriction) = &self.restriction {
            restriction.write_restriction(writer, XmlNamespace::Types)?;
        }

        write_folder_ids(writer, XmlNamespace::Types, "BaseFolderIds", &self.base_folder_ids)
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        if self.base_folder_ids.is_empty() {
            return Err(ValidationError::EmptyCollection("BaseFolderIds"));
        }

        match &self.restriction {
            Some(restriction) => restriction.validate(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistinguishedFolderName;

    #[test]
    fn nested_filters_are_dispatched_by_element_name() {
        let xml = br#"<t:Restriction xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:And>
                <t:IsGreaterThan>
                    <t:FieldURI FieldURI="item:DateTimeReceived"/>
                    <t:FieldURIOrConstant><t:Constant Value="2024-01-01T00:00:00Z"/></t:FieldURIOrConstant>
                </t:IsGreaterThan>
                <t:Not>
                    <t:Exists><t:FieldURI FieldURI="item:Categories"/></t:Exists>
                </t:Not>
                <t:Contains ContainmentMode="Substring" ContainmentComparison="IgnoreCase">
                    <t:FieldURI FieldURI="item:Subject"/>
                    <t:Constant Value="report"/>
                </t:Contains>
                <t:SomethingNew/>
            </t:And>
        </t:Restriction>"#;

        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Types, "Restriction").unwrap();
        reader.read_start_element(XmlNamespace::Types, "And").unwrap();

        let mut filter = SearchFilter::create_from_xml(reader.local_name()).unwrap();
        filter.load_from_xml(&mut reader).unwrap();

        let SearchFilter::And(filters) = &filter else {
            panic!("expected an And filter, got {filter:?}");
        };
        assert_eq!(filters.len(), 3);
        assert_eq!(
            filters[0],
            SearchFilter::IsGreaterThan(Comparison {
                property: Some(String::from("item:DateTimeReceived")),
                value: Some(FilterValue::Constant(String::from("2024-01-01T00:00:00Z"))),
            })
        );
        assert_eq!(
            filters[1],
            SearchFilter::Not(Some(Box::new(SearchFilter::Exists {
                property: Some(String::from("item:Categories"))
            })))
        );
        assert!(matches!(
            &filters[2],
            SearchFilter::Contains {
                mode: Some(ContainmentMode::Substring),
                value: Some(value),
                ..
            } if value == "report"
        ));
        assert_eq!(filter.validate(), Ok(()));
    }

    #[test]
    fn unknown_filter_names_are_not_dispatched() {
        assert!(SearchFilter::create_from_xml("IsSimilarTo").is_none());
    }

    #[test]
    fn filters_without_a_property_fail_validation() {
        let filter = SearchFilter::IsEqualTo(Comparison {
            property: None,
            value: Some(FilterValue::Constant(String::from("x"))),
        });
        assert_eq!(filter.validate(), Err(ValidationError::SearchFilterPropertyMissing));

        assert_eq!(
            SearchFilter::Not(None).validate(),
            Err(ValidationError::NotFilterWithoutFilter)
        );
    }

    #[test]
    fn search_parameters_require_base_folders() {
        let mut parameters = SearchFolderParameters {
            traversal: SearchFolderTraversal::Deep,
            restriction: None,
            base_folder_ids: Vec::new(),
        };
        assert_eq!(
            parameters.validate(),
            Err(ValidationError::EmptyCollection("BaseFolderIds"))
        );

        parameters.base_folder_ids.push(DistinguishedFolderName::Inbox.into());
        assert_eq!(parameters.validate(), Ok(()));
    }
}
