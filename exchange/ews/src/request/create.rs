/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    property::PropertyBag,
    schema::ObjectKind,
    types::{FolderIdentifier, MessageDisposition, SendInvitationsMode},
    version::ExchangeVersion,
    xml::{EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::ServiceRequest;

/// A `CreateItem` or `CreateFolder` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem>
/// and <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createfolder>
pub(crate) struct CreateObjects<'a> {
    pub kind: ObjectKind,
    pub bags: &'a [PropertyBag],

    /// The folder to save the new objects in. Required for folders; items
    /// default to a folder chosen by the server, e.g. Drafts for messages.
    pub parent_folder: Option<&'a FolderIdentifier>,

    pub message_disposition: Option<MessageDisposition>,
    pub send_meeting_invitations: Option<SendInvitationsMode>,
}

impl ServiceRequest for CreateObjects<'_> {
    fn name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Item => "CreateItem",
            ObjectKind::Folder => "CreateFolder",
        }
    }

    fn validate(&self, version: ExchangeVersion) -> Result<(), Error> {
        if self.bags.is_empty() {
            return Err(ValidationError::EmptyCollection(self.kind.collection_element_name()).into());
        }
        if self.kind == ObjectKind::Folder && self.parent_folder.is_none() {
            return Err(ValidationError::FieldNotSpecified("ParentFolderId").into());
        }

        for bag in self.bags {
            let object_type = bag.object_type();
            if object_type.kind() != self.kind {
                return Err(Error::InvalidOperation("a request can only create objects of one kind"));
            }
            if !bag.is_new() {
                return Err(Error::InvalidOperation("the object has already been saved"));
            }
            if object_type.minimum_version() > version {
                return Err(Error::VersionMismatch {
                    name: object_type.xml_element_name(),
                    minimum: object_type.minimum_version(),
                    requested: version,
                });
            }

            bag.validate()?;
        }

        Ok(())
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if self.kind == ObjectKind::Folder {
            return Ok(());
        }

        if let Some(disposition) = self.message_disposition {
            writer.write_attribute_enum("MessageDisposition", disposition)?;
        }
        if let Some(mode) = self.send_meeting_invitations {
            writer.write_attribute_enum("SendMeetingInvitations", mode)?;
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(parent_folder) = self.parent_folder {
            let element_name = match self.kind {
                ObjectKind::Item => "SavedItemFolderId",
                ObjectKind::Folder => "ParentFolderId",
            };

            writer.write_start_element(XmlNamespace::Messages, element_name)?;
            parent_folder.write_to_xml(writer)?;
            writer.write_end_element()?;
        }

        writer.write_start_element(XmlNamespace::Messages, self.kind.collection_element_name())?;
        for bag in self.bags {
            bag.write_to_xml(writer)?;
        }
        writer.write_end_element()
    }
}
