/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    property::PropertyBag,
    schema::ObjectKind,
    types::{ConflictResolutionMode, FolderIdentifier, MessageDisposition, SendInvitationsOrCancellationsMode},
    version::ExchangeVersion,
    xml::{EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::ServiceRequest;

/// An `UpdateItem` or `UpdateFolder` request, carrying the changes recorded
/// in each object's property bag.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem>
pub(crate) struct UpdateObjects<'a> {
    pub kind: ObjectKind,
    pub bags: &'a [PropertyBag],
    pub conflict_resolution: ConflictResolutionMode,
    pub message_disposition: Option<MessageDisposition>,
    pub send_invitations_or_cancellations: Option<SendInvitationsOrCancellationsMode>,

    /// Where to save a message sent by the update.
    pub saved_item_folder: Option<&'a FolderIdentifier>,
}

impl ServiceRequest for UpdateObjects<'_> {
    fn name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Item => "UpdateItem",
            ObjectKind::Folder => "UpdateFolder",
        }
    }

    fn validate(&self, _version: ExchangeVersion) -> Result<(), Error> {
        if self.bags.is_empty() {
            return Err(ValidationError::EmptyCollection(self.kind.collection_element_name()).into());
        }

        for bag in self.bags {
            if bag.object_type().kind() != self.kind {
                return Err(Error::InvalidOperation("a request can only update objects of one kind"));
            }
            if bag.is_new() {
                return Err(Error::InvalidOperation("only objects which exist on the server can be updated"));
            }

            bag.validate()?;
        }

        Ok(())
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if self.kind == ObjectKind::Folder {
            return Ok(());
        }

        writer.write_attribute_enum("ConflictResolution", self.conflict_resolution)?;
        if let Some(disposition) = self.message_disposition {
            writer.write_attribute_enum("MessageDisposition", disposition)?;
        }
        if let Some(mode) = self.send_invitations_or_cancellations {
            writer.write_attribute_enum("SendMeetingInvitationsOrCancellations", mode)?;
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let (ObjectKind::Item, Some(folder)) = (self.kind, self.saved_item_folder) {
            writer.write_start_element(XmlNamespace::Messages, "SavedItemFolderId")?;
            folder.write_to_xml(writer)?;
            writer.write_end_element()?;
        }

        let changes_element_name = match self.kind {
            ObjectKind::Item => "ItemChanges",
            ObjectKind::Folder => "FolderChanges",
        };
        writer.write_start_element(XmlNamespace::Messages, changes_element_name)?;
        for bag in self.bags {
            bag.write_to_xml_for_update(writer)?;
        }
        writer.write_end_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        request::{read_envelope, read_saved_objects_response, write_envelope},
        schema::folder,
        xml::EwsXmlReader,
    };

    fn existing_folder() -> PropertyBag {
        let xml = br#"<t:Folder xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
            <t:FolderId Id="AQMk" ChangeKey="AQAA"/>
            <t:DisplayName>Projects</t:DisplayName>
        </t:Folder>"#;

        let mut bag = PropertyBag::new(&folder::FOLDER, ExchangeVersion::Exchange2013);
        let mut reader = EwsXmlReader::new(xml);
        reader.read().unwrap();
        bag.load_from_xml(&mut reader, true, None, false).unwrap();
        bag
    }

    #[test]
    fn folder_updates_carry_no_item_attributes() {
        let mut bag = existing_folder();
        bag.set(&folder::DISPLAY_NAME, "Archive").unwrap();

        let request = UpdateObjects {
            kind: ObjectKind::Folder,
            bags: std::slice::from_ref(&bag),
            conflict_resolution: ConflictResolutionMode::AlwaysOverwrite,
            message_disposition: None,
            send_invitations_or_cancellations: None,
            saved_item_folder: None,
        };
        let envelope = String::from_utf8(write_envelope(&request, ExchangeVersion::Exchange2013).unwrap()).unwrap();

        assert!(envelope.contains("<m:UpdateFolder><m:FolderChanges><t:FolderChange>"), "{envelope}");
        assert!(envelope.contains("<t:SetFolderField><t:FieldURI FieldURI=\"folder:DisplayName\""));
    }

    #[test]
    fn new_change_keys_are_merged_into_the_object() {
        let mut bags = vec![existing_folder()];
        let document = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body>
                <m:UpdateFolderResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                    <m:ResponseMessages>
                        <m:UpdateFolderResponseMessage ResponseClass="Success">
                            <m:ResponseCode>NoError</m:ResponseCode>
                            <m:Folders>
                                <t:Folder><t:FolderId Id="AQMk" ChangeKey="AQAB"/></t:Folder>
                            </m:Folders>
                        </m:UpdateFolderResponseMessage>
                    </m:ResponseMessages>
                </m:UpdateFolderResponse>
            </s:Body>
        </s:Envelope>"#;

        read_envelope(document, |reader| {
            read_saved_objects_response(reader, ObjectKind::Folder, &mut bags)?;
            Ok(())
        })
        .unwrap();

        let id = bags[0].id().and_then(|value| value.as_folder_id()).unwrap();
        assert_eq!(id.change_key.as_deref(), Some("AQAB"));
        assert_eq!(
            bags[0].get(&folder::DISPLAY_NAME).unwrap().and_then(|value| value.as_str()),
            Some("Projects")
        );
    }
}
