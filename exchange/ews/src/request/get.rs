/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use tracing::debug;

use crate::{
    property::{PropertyBag, PropertySet},
    schema::{object_type_for_element, ObjectKind},
    types::ServiceObjectId,
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{read_response_messages, ServiceRequest};

/// A `GetItem` or `GetFolder` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getitem>
pub(crate) struct GetObjects<'a> {
    pub kind: ObjectKind,
    pub ids: &'a [ServiceObjectId],
    pub property_set: &'a PropertySet,
}

impl ServiceRequest for GetObjects<'_> {
    fn name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Item => "GetItem",
            ObjectKind::Folder => "GetFolder",
        }
    }

    fn validate(&self, version: ExchangeVersion) -> Result<(), Error> {
        if self.ids.is_empty() {
            return Err(ValidationError::EmptyCollection(self.kind.ids_element_name()).into());
        }
        if self.ids.iter().any(|id| id.kind() != self.kind) {
            return Err(Error::InvalidOperation("a request can only get objects of one kind"));
        }

        self.property_set.check_version(version)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.property_set.write_to_xml(writer, self.kind.shape_element_name())?;

        writer.write_start_element(XmlNamespace::Messages, self.kind.ids_element_name())?;
        for id in self.ids {
            id.write_to_xml(writer)?;
        }
        writer.write_end_element()
    }
}

/// Reads a `GetItemResponse` or `GetFolderResponse`, with one result per
/// response message in request order.
pub(crate) fn read_get_response(
    reader: &mut EwsXmlReader<'_>,
    kind: ObjectKind,
    property_set: &PropertySet,
    version: ExchangeVersion,
) -> Result<Vec<Result<PropertyBag, Error>>, Error> {
    let mut bags: Vec<Option<PropertyBag>> = Vec::new();

    let responses = read_response_messages(reader, |index, reader| {
        if reader.local_name() != kind.collection_element_name() {
            return Ok(false);
        }

        reader.read_children(|reader| {
            let Some(object_type) = object_type_for_element(reader.local_name()) else {
                debug!(element = reader.local_name(), "skipping object of unsupported type");
                return reader.skip_current_element();
            };

            let mut bag = PropertyBag::new(object_type, version);
            bag.load_from_xml(reader, true, Some(property_set), false)?;

            bags.resize_with(index + 1, || None);
            bags[index] = Some(bag);

            Ok(())
        })?;

        Ok(true)
    })?;

    bags.resize_with(responses.len(), || None);

    Ok(responses
        .into_iter()
        .zip(bags)
        .map(|(response, bag)| {
            response.into_result()?;
            bag.ok_or_else(|| Error::UnexpectedXml(String::from("the response message contained no object")))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        complex::ItemId,
        request::{read_envelope, write_envelope},
        schema::item,
        types::{BaseShape, DistinguishedFolderName},
    };

    #[test]
    fn ids_of_mixed_kinds_are_rejected() {
        let ids = [
            ServiceObjectId::from(ItemId::new("AAMk")),
            ServiceObjectId::from(DistinguishedFolderName::Inbox),
        ];
        let property_set = PropertySet::id_only();
        let request = GetObjects {
            kind: ObjectKind::Item,
            ids: &ids,
            property_set: &property_set,
        };

        assert!(matches!(
            request.validate(ExchangeVersion::Exchange2013),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn request_names_the_shape_and_ids() {
        let ids = [ServiceObjectId::from(ItemId::with_change_key("AAMk", "CQAA"))];
        let property_set = PropertySet::new(BaseShape::IdOnly).with(&item::SUBJECT);
        let request = GetObjects {
            kind: ObjectKind::Item,
            ids: &ids,
            property_set: &property_set,
        };

        let envelope = String::from_utf8(write_envelope(&request, ExchangeVersion::Exchange2013).unwrap()).unwrap();
        assert!(
            envelope.contains(
                "<m:ItemShape><t:BaseShape>IdOnly</t:BaseShape><t:AdditionalProperties><t:FieldURI FieldURI=\"item:Subject\""
            ),
            "{envelope}"
        );
        assert!(envelope.contains(r#"<m:ItemIds><t:ItemId Id="AAMk" ChangeKey="CQAA""#));
    }

    #[test]
    fn responses_are_typed_by_element_name() {
        let document = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body>
                <m:GetItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                    <m:ResponseMessages>
                        <m:GetItemResponseMessage ResponseClass="Success">
                            <m:ResponseCode>NoError</m:ResponseCode>
                            <m:Items>
                                <t:CalendarItem>
                                    <t:ItemId Id="AAMkCal" ChangeKey="DwAA"/>
                                    <t:Subject>Planning</t:Subject>
                                </t:CalendarItem>
                            </m:Items>
                        </m:GetItemResponseMessage>
                        <m:GetItemResponseMessage ResponseClass="Error">
                            <m:MessageText>The specified object was not found in the store.</m:MessageText>
                            <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                            <m:Items/>
                        </m:GetItemResponseMessage>
                    </m:ResponseMessages>
                </m:GetItemResponse>
            </s:Body>
        </s:Envelope>"#;

        let property_set = PropertySet::first_class_properties();
        let mut results = Vec::new();
        read_envelope(document, |reader| {
            results = read_get_response(reader, ObjectKind::Item, &property_set, ExchangeVersion::Exchange2013)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(results.len(), 2);
        let bag = results[0].as_ref().unwrap();
        assert_eq!(bag.object_type(), &item::APPOINTMENT);
        assert!(!bag.is_new());
        assert_eq!(bag.get(&item::SUBJECT).unwrap().and_then(|value| value.as_str()), Some("Planning"));
        assert_eq!(bag.get(&item::LOCATION).unwrap(), None);
        assert!(matches!(results[1], Err(Error::Service(_))));
    }
}
