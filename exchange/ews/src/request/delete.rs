/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    schema::ObjectKind,
    types::{AffectedTaskOccurrences, DeleteMode, SendCancellationsMode, ServiceObjectId},
    version::ExchangeVersion,
    xml::{EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::ServiceRequest;

/// A `DeleteItem` or `DeleteFolder` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deleteitem>
pub(crate) struct DeleteObjects<'a> {
    pub kind: ObjectKind,
    pub ids: &'a [ServiceObjectId],
    pub delete_mode: DeleteMode,
    pub send_cancellations: Option<SendCancellationsMode>,
    pub affected_task_occurrences: Option<AffectedTaskOccurrences>,
}

impl ServiceRequest for DeleteObjects<'_> {
    fn name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Item => "DeleteItem",
            ObjectKind::Folder => "DeleteFolder",
        }
    }

    fn validate(&self, _version: ExchangeVersion) -> Result<(), Error> {
        if self.ids.is_empty() {
            return Err(ValidationError::EmptyCollection(self.kind.ids_element_name()).into());
        }
        if self.ids.iter().any(|id| id.kind() != self.kind) {
            return Err(Error::InvalidOperation("a request can only delete objects of one kind"));
        }

        Ok(())
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_enum("DeleteType", self.delete_mode)?;
        if self.kind == ObjectKind::Folder {
            return Ok(());
        }

        if let Some(mode) = self.send_cancellations {
            writer.write_attribute_enum("SendMeetingCancellations", mode)?;
        }
        if let Some(occurrences) = self.affected_task_occurrences {
            writer.write_attribute_enum("AffectedTaskOccurrences", occurrences)?;
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Messages, self.kind.ids_element_name())?;
        for id in self.ids {
            id.write_to_xml(writer)?;
        }
        writer.write_end_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{complex::ItemId, request::write_envelope};

    #[test]
    fn item_deletions_carry_their_options() {
        let ids = [ServiceObjectId::from(ItemId::new("AAMk"))];
        let request = DeleteObjects {
            kind: ObjectKind::Item,
            ids: &ids,
            delete_mode: DeleteMode::HardDelete,
            send_cancellations: Some(SendCancellationsMode::SendToNone),
            affected_task_occurrences: Some(AffectedTaskOccurrences::AllOccurrences),
        };

        let envelope = String::from_utf8(write_envelope(&request, ExchangeVersion::Exchange2013).unwrap()).unwrap();
        assert!(
            envelope.contains(
                r#"<m:DeleteItem DeleteType="HardDelete" SendMeetingCancellations="SendToNone" AffectedTaskOccurrences="AllOccurrences">"#
            ),
            "{envelope}"
        );
        assert!(envelope.contains(r#"<m:ItemIds><t:ItemId Id="AAMk""#));
    }

    #[test]
    fn nothing_to_delete_is_an_error() {
        let request = DeleteObjects {
            kind: ObjectKind::Folder,
            ids: &[],
            delete_mode: DeleteMode::SoftDelete,
            send_cancellations: None,
            affected_task_occurrences: None,
        };

        assert!(matches!(
            request.validate(ExchangeVersion::Exchange2013),
            Err(Error::Validation(ValidationError::EmptyCollection("FolderIds")))
        ));
    }
}
