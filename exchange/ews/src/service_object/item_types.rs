/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::{DateTime, Utc};

use crate::{
    property::PropertyBag,
    schema::{item, ObjectKind},
    types::{
        AffectedTaskOccurrences, ConflictResolutionMode, DeleteMode, FolderIdentifier, MessageDisposition,
        SendCancellationsMode, SendInvitationsMode, SendInvitationsOrCancellationsMode,
    },
    Error, ExchangeService,
};

use super::ServiceObject;

typed_service_object!(
    /// Any item. Items loaded by a search are returned as this type
    /// whatever their concrete type, which [`Item::object_type`] reports.
    Item,
    item::ITEM,
    |object_type| object_type.kind() == ObjectKind::Item
);

typed_service_object!(
    /// An e-mail message.
    Message,
    item::MESSAGE,
    |object_type| object_type == &item::MESSAGE
);

typed_service_object!(
    /// A calendar item, or meeting when it has attendees.
    Appointment,
    item::APPOINTMENT,
    |object_type| object_type == &item::APPOINTMENT
);

typed_service_object!(Task, item::TASK, |object_type| object_type == &item::TASK);

typed_service_object!(Contact, item::CONTACT, |object_type| object_type == &item::CONTACT);

impl Item {
    pub(crate) fn from_bag(service: ExchangeService, bag: PropertyBag) -> Result<Self, Error> {
        ServiceObject::from_bag(service, bag).try_into()
    }

    pub fn subject(&self) -> Result<Option<&str>, Error> {
        self.get_str(&item::SUBJECT)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), Error> {
        self.set(&item::SUBJECT, subject.into())
    }
}

impl Message {
    pub fn subject(&self) -> Result<Option<&str>, Error> {
        self.get_str(&item::SUBJECT)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), Error> {
        self.set(&item::SUBJECT, subject.into())
    }

    pub fn is_read(&self) -> Result<Option<bool>, Error> {
        Ok(self.get(&item::IS_READ)?.and_then(|value| value.as_bool()))
    }

    pub fn set_is_read(&mut self, is_read: bool) -> Result<(), Error> {
        self.set(&item::IS_READ, is_read)
    }

    /// Creates the message in `folder` and sends it, keeping a copy in the
    /// sent items folder.
    pub async fn send_and_save_copy(&mut self, folder: Option<&FolderIdentifier>) -> Result<(), Error> {
        self.0
            .create(folder, Some(MessageDisposition::SendAndSaveCopy), None)
            .await
    }

    /// Creates and sends the message without keeping a copy.
    pub async fn send(&mut self) -> Result<(), Error> {
        self.0.create(None, Some(MessageDisposition::SendOnly), None).await
    }
}

impl Appointment {
    pub fn start(&self) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(self.get(&item::START)?.and_then(|value| value.as_date_time()).copied())
    }

    pub fn set_start(&mut self, start: DateTime<Utc>) -> Result<(), Error> {
        self.set(&item::START, start)
    }

    pub fn end(&self) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(self.get(&item::END)?.and_then(|value| value.as_date_time()).copied())
    }

    pub fn set_end(&mut self, end: DateTime<Utc>) -> Result<(), Error> {
        self.set(&item::END, end)
    }

    /// Creates the appointment, sending invitations to its attendees
    /// according to `mode`.
    pub async fn save_with_invitations(
        &mut self,
        folder: Option<&FolderIdentifier>,
        mode: SendInvitationsMode,
    ) -> Result<(), Error> {
        self.0.create(folder, None, Some(mode)).await
    }

    pub async fn update_with_invitations(
        &mut self,
        conflict_resolution: ConflictResolutionMode,
        mode: SendInvitationsOrCancellationsMode,
    ) -> Result<(), Error> {
        self.0.update_with(conflict_resolution, None, Some(mode)).await
    }

    pub async fn delete_with_cancellations(
        self,
        delete_mode: DeleteMode,
        mode: SendCancellationsMode,
    ) -> Result<(), Error> {
        self.0.delete_with(delete_mode, Some(mode), None).await
    }
}

impl Task {
    /// Deletes only the current occurrence of a recurring task, or the whole
    /// task if `occurrences` is [`AffectedTaskOccurrences::AllOccurrences`].
    pub async fn delete_occurrences(
        self,
        delete_mode: DeleteMode,
        occurrences: AffectedTaskOccurrences,
    ) -> Result<(), Error> {
        self.0.delete_with(delete_mode, None, Some(occurrences)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{ExchangeService, ServiceObject};

    fn service() -> ExchangeService {
        ExchangeService::builder().build().unwrap()
    }

    #[test]
    fn typed_views_accept_only_their_types() {
        let service = service();

        let message = ServiceObject::new(&service, &item::MESSAGE);
        assert!(Item::try_from(message.clone()).is_ok());
        assert!(Message::try_from(message.clone()).is_ok());
        assert!(matches!(
            Appointment::try_from(message),
            Err(Error::InvalidOperation(_))
        ));

        let folder = ServiceObject::new(&service, &crate::schema::folder::FOLDER);
        assert!(Item::try_from(folder).is_err());
    }

    #[test]
    fn accessors_go_through_the_property_bag() {
        let service = service();

        let mut message = Message::new(&service);
        assert!(matches!(message.subject(), Err(Error::PropertyNotLoaded("Subject"))));
        message.set_subject("Quarterly report").unwrap();
        message.set_is_read(false).unwrap();

        assert_eq!(message.subject().unwrap(), Some("Quarterly report"));
        assert_eq!(message.is_read().unwrap(), Some(false));
        assert!(message.is_new());

        let mut appointment = Appointment::new(&service);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        appointment.set_start(start).unwrap();
        assert_eq!(appointment.start().unwrap(), Some(start));
        assert!(appointment.end().is_err());
    }

    #[tokio::test]
    async fn unsaved_objects_cannot_be_deleted() {
        let task = Task::new(&service());

        assert!(matches!(
            task.delete(DeleteMode::HardDelete).await,
            Err(Error::InvalidOperation(_))
        ));
    }
}
