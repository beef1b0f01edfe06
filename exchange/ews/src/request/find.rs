/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use tracing::debug;

use crate::{
    complex::{ComplexProperty, SearchFilter},
    property::{PropertyBag, PropertySet},
    schema::object_type_for_element,
    types::{write_folder_ids, FolderIdentifier, ItemTraversal, OffsetBasePoint},
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{into_single_result, read_response_messages, ServiceRequest};

/// A page of items to be returned by a search, counted from the start or
/// the end of the full result set.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/indexedpageitemview>
#[derive(Clone, Debug)]
pub struct ItemView {
    page_size: usize,
    offset: usize,
    offset_base_point: OffsetBasePoint,
    property_set: PropertySet,
    traversal: ItemTraversal,
}

impl ItemView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            offset: 0,
            offset_base_point: OffsetBasePoint::Beginning,
            property_set: PropertySet::first_class_properties(),
            traversal: ItemTraversal::Shallow,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_offset_base_point(mut self, base_point: OffsetBasePoint) -> Self {
        self.offset_base_point = base_point;
        self
    }

    pub fn with_property_set(mut self, property_set: PropertySet) -> Self {
        self.property_set = property_set;
        self
    }

    pub fn with_traversal(mut self, traversal: ItemTraversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn property_set(&self) -> &PropertySet {
        &self.property_set
    }

    /// Moves the view to the page starting at `offset`, as returned in
    /// [`FindItemsResults::next_page_offset`].
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }
}

/// One page of search results.
#[derive(Clone, Debug)]
pub struct FindItemsResults<T> {
    pub items: Vec<T>,

    /// The number of items matching the search, across all pages.
    pub total_count: usize,

    /// Whether items remain beyond this page.
    pub more_available: bool,

    /// The offset of the next page, if there is one.
    pub next_page_offset: Option<usize>,
}

/// A `FindItem` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/finditem>
pub(crate) struct FindItem<'a> {
    pub parent_folders: &'a [FolderIdentifier],
    pub view: &'a ItemView,
    pub restriction: Option<&'a SearchFilter>,
}

impl ServiceRequest for FindItem<'_> {
    fn name(&self) -> &'static str {
        "FindItem"
    }

    fn validate(&self, version: ExchangeVersion) -> Result<(), Error> {
        if self.parent_folders.is_empty() {
            return Err(ValidationError::EmptyCollection("ParentFolderIds").into());
        }
        if self.view.page_size == 0 {
            return Err(ValidationError::PageSizeMustBeGreaterThanZero.into());
        }
        if let Some(restriction) = self.restriction {
            restriction.validate()?;
        }

        self.view.property_set.check_version(version)
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_enum("Traversal", self.view.traversal)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.view.property_set.write_to_xml(writer, "ItemShape")?;

        writer.write_start_element(XmlNamespace::Messages, "IndexedPageItemView")?;
        writer.write_attribute_value("MaxEntriesReturned", self.view.page_size.to_string())?;
        writer.write_attribute_value("Offset", self.view.offset.to_string())?;
        writer.write_attribute_enum("BasePoint", self.view.offset_base_point)?;
        writer.write_end_element()?;

        if let Some(restriction) = self.restriction {
            restriction.write_restriction(writer, XmlNamespace::Messages)?;
        }

        write_folder_ids(writer, XmlNamespace::Messages, "ParentFolderIds", self.parent_folders)
    }
}

/// Reads a `FindItemResponse` for a search over a single folder.
///
/// Items are loaded as search summaries: properties a search can't return
/// are left unloaded.
pub(crate) fn read_find_item_response(
    reader: &mut EwsXmlReader<'_>,
    view: &ItemView,
    version: ExchangeVersion,
) -> Result<FindItemsResults<PropertyBag>, Error> {
    let mut results = FindItemsResults {
        items: Vec::new(),
        total_count: 0,
        more_available: false,
        next_page_offset: None,
    };

    let responses = read_response_messages(reader, |_, reader| {
        if reader.local_name() != "RootFolder" {
            return Ok(false);
        }

        let next_offset: Option<usize> = reader.read_attribute_as("IndexedPagingOffset")?;
        results.total_count = reader.read_attribute_as("TotalItemsInView")?.unwrap_or_default();
        let more_available = !reader.read_attribute_bool("IncludesLastItemInRange")?.unwrap_or(true);
        results.more_available = more_available;
        results.next_page_offset = next_offset.filter(|_| more_available);

        reader.read_children(|reader| {
            if reader.local_name() != "Items" {
                return reader.skip_current_element();
            }

            reader.read_children(|reader| {
                let Some(object_type) = object_type_for_element(reader.local_name()) else {
                    debug!(element = reader.local_name(), "skipping item of unsupported type");
                    return reader.skip_current_element();
                };

                let mut bag = PropertyBag::new(object_type, version);
                bag.load_from_xml(reader, true, Some(&view.property_set), true)?;
                results.items.push(bag);

                Ok(())
            })
        })?;

        Ok(true)
    })?;

    into_single_result(responses)?;

    Ok(results)
}
