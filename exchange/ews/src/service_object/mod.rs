/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Items and folders bound to a service.

use tracing::debug;

use crate::{
    property::{PropertyBag, PropertyDefinition, PropertySet, PropertyValue},
    request::into_single_result,
    response::ServiceResponse,
    schema::{item, ObjectKind, ServiceObjectType},
    service::ExchangeService,
    types::{
        AffectedTaskOccurrences, ConflictResolutionMode, DeleteMode, FolderIdentifier, MessageDisposition,
        SendCancellationsMode, SendInvitationsMode, SendInvitationsOrCancellationsMode, ServiceObjectId,
    },
    Error,
};

/// Declares a typed view of [`ServiceObject`] for the object types accepted
/// by `$accepts`.
macro_rules! typed_service_object {
    ($(#[$attr:meta])* $name:ident, $object_type:path, $accepts:expr) => {
        $(#[$attr])*
        #[derive(Clone, Debug)]
        pub struct $name(crate::service_object::ServiceObject);

        impl $name {
            /// Creates a new, unsaved object.
            pub fn new(service: &crate::ExchangeService) -> Self {
                Self(crate::service_object::ServiceObject::new(service, &$object_type))
            }

            pub async fn bind(
                service: &crate::ExchangeService,
                id: impl Into<crate::types::ServiceObjectId>,
                property_set: &crate::property::PropertySet,
            ) -> Result<Self, crate::Error> {
                crate::service_object::ServiceObject::bind(service, id, property_set)
                    .await?
                    .try_into()
            }

            pub fn into_inner(self) -> crate::service_object::ServiceObject {
                self.0
            }

            /// Deletes the object from the server.
            pub async fn delete(self, delete_mode: crate::types::DeleteMode) -> Result<(), crate::Error> {
                self.0.delete(delete_mode).await
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::service_object::ServiceObject;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl TryFrom<crate::service_object::ServiceObject> for $name {
            type Error = crate::Error;

            fn try_from(object: crate::service_object::ServiceObject) -> Result<Self, Self::Error> {
                let accepts: fn(&crate::schema::ServiceObjectType) -> bool = $accepts;
                if accepts(object.object_type()) {
                    Ok(Self(object))
                } else {
                    Err(crate::Error::InvalidOperation(concat!(
                        "the object is not of a type that can be viewed as ",
                        stringify!($name)
                    )))
                }
            }
        }

        impl From<$name> for crate::service_object::ServiceObject {
            fn from(object: $name) -> Self {
                object.0
            }
        }
    };
}

mod folder;
mod item_types;

pub use folder::{CalendarFolder, ContactsFolder, Folder, SearchFolder, TasksFolder};
pub use item_types::{Appointment, Contact, Item, Message, Task};

/// An item or folder, held as a property bag bound to the service it was
/// created on or loaded from.
///
/// A new object becomes an existing one once saved. Deleting an object
/// consumes it.
#[derive(Clone, Debug)]
pub struct ServiceObject {
    service: ExchangeService,
    bag: PropertyBag,
}

impl ServiceObject {
    /// Creates a new, unsaved object of the given type.
    pub fn new(service: &ExchangeService, object_type: &'static ServiceObjectType) -> Self {
        Self {
            service: service.clone(),
            bag: PropertyBag::new(object_type, service.version()),
        }
    }

    pub(crate) fn from_bag(service: ExchangeService, bag: PropertyBag) -> Self {
        Self { service, bag }
    }

    /// Loads an existing object from the server.
    pub async fn bind(
        service: &ExchangeService,
        id: impl Into<ServiceObjectId>,
        property_set: &PropertySet,
    ) -> Result<Self, Error> {
        let id = id.into();
        let bag = get_single(service, id, property_set).await?;

        Ok(Self::from_bag(service.clone(), bag))
    }

    pub fn service(&self) -> &ExchangeService {
        &self.service
    }

    pub fn object_type(&self) -> &'static ServiceObjectType {
        self.bag.object_type()
    }

    pub fn property_bag(&self) -> &PropertyBag {
        &self.bag
    }

    pub fn is_new(&self) -> bool {
        self.bag.is_new()
    }

    /// Whether there are changes not yet sent to the server.
    pub fn is_dirty(&self) -> bool {
        self.bag.is_dirty()
    }

    /// The object's identifier, once it exists on the server.
    pub fn id(&self) -> Option<ServiceObjectId> {
        let value = self.bag.id()?;
        match self.object_type().kind() {
            ObjectKind::Item => value.as_item_id().cloned().map(ServiceObjectId::Item),
            ObjectKind::Folder => value
                .as_folder_id()
                .cloned()
                .map(|id| ServiceObjectId::Folder(FolderIdentifier::Id(id))),
        }
    }

    pub fn get(&self, property: &'static PropertyDefinition) -> Result<Option<&PropertyValue>, Error> {
        self.bag.get(property)
    }

    pub fn set(&mut self, property: &'static PropertyDefinition, value: impl Into<PropertyValue>) -> Result<(), Error> {
        self.bag.set(property, value)
    }

    pub fn get_mut(&mut self, property: &'static PropertyDefinition) -> Result<&mut PropertyValue, Error> {
        self.bag.get_mut(property)
    }

    pub fn clear(&mut self, property: &'static PropertyDefinition) -> Result<(), Error> {
        self.bag.clear(property)
    }

    /// Reads a text property.
    pub fn get_str(&self, property: &'static PropertyDefinition) -> Result<Option<&str>, Error> {
        Ok(self.get(property)?.and_then(PropertyValue::as_str))
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.bag.validate()
    }

    /// Reloads the object's properties, discarding any unsaved changes.
    pub async fn load(&mut self, property_set: &PropertySet) -> Result<(), Error> {
        let id = self
            .id()
            .ok_or(Error::InvalidOperation("only objects which exist on the server can be loaded"))?;

        self.bag = get_single(&self.service, id, property_set).await?;

        Ok(())
    }

    /// Creates the object on the server, in `parent_folder` if given.
    ///
    /// Folders must be given a parent. Messages are saved without being
    /// sent, and appointments without sending invitations.
    pub async fn save(&mut self, parent_folder: Option<&FolderIdentifier>) -> Result<(), Error> {
        let object_type = self.object_type();
        let (message_disposition, send_meeting_invitations) = match object_type.kind() {
            ObjectKind::Folder => (None, None),
            ObjectKind::Item if object_type == &item::APPOINTMENT => (None, Some(SendInvitationsMode::SendToNone)),
            ObjectKind::Item => (Some(MessageDisposition::SaveOnly), None),
        };

        self.create(parent_folder, message_disposition, send_meeting_invitations).await
    }

    pub(crate) async fn create(
        &mut self,
        parent_folder: Option<&FolderIdentifier>,
        message_disposition: Option<MessageDisposition>,
        send_meeting_invitations: Option<SendInvitationsMode>,
    ) -> Result<(), Error> {
        if !self.bag.is_new() {
            return Err(Error::InvalidOperation("the object has already been saved"));
        }

        let responses = self
            .service
            .create_objects(
                std::slice::from_mut(&mut self.bag),
                parent_folder,
                message_disposition,
                send_meeting_invitations,
            )
            .await?;
        single_response(responses)?;

        // Objects which are sent rather than saved come back without an id.
        self.bag.clear_change_log();

        Ok(())
    }

    /// Sends the changes made since the object was loaded or saved. Does
    /// nothing if there are none.
    pub async fn update(&mut self, conflict_resolution: ConflictResolutionMode) -> Result<(), Error> {
        let object_type = self.object_type();
        let (message_disposition, send_invitations) = match object_type.kind() {
            ObjectKind::Folder => (None, None),
            ObjectKind::Item if object_type == &item::APPOINTMENT => {
                (None, Some(SendInvitationsOrCancellationsMode::SendToNone))
            }
            ObjectKind::Item => (Some(MessageDisposition::SaveOnly), None),
        };

        self.update_with(conflict_resolution, message_disposition, send_invitations)
            .await
    }

    pub(crate) async fn update_with(
        &mut self,
        conflict_resolution: ConflictResolutionMode,
        message_disposition: Option<MessageDisposition>,
        send_invitations_or_cancellations: Option<SendInvitationsOrCancellationsMode>,
    ) -> Result<(), Error> {
        if self.bag.is_new() {
            return Err(Error::InvalidOperation("only objects which exist on the server can be updated"));
        }
        if !self.bag.is_dirty() {
            debug!(object = self.object_type().xml_element_name(), "no changes to update");
            return Ok(());
        }

        let responses = self
            .service
            .update_objects(
                std::slice::from_mut(&mut self.bag),
                conflict_resolution,
                message_disposition,
                send_invitations_or_cancellations,
            )
            .await?;
        single_response(responses)?;

        self.bag.clear_change_log();

        Ok(())
    }

    /// Deletes the object from the server.
    pub async fn delete(self, delete_mode: DeleteMode) -> Result<(), Error> {
        let object_type = self.object_type();
        let (send_cancellations, affected_task_occurrences) = if object_type == &item::APPOINTMENT {
            (Some(SendCancellationsMode::SendToNone), None)
        } else if object_type == &item::TASK {
            (None, Some(AffectedTaskOccurrences::AllOccurrences))
        } else {
            (None, None)
        };

        self.delete_with(delete_mode, send_cancellations, affected_task_occurrences)
            .await
    }

    pub(crate) async fn delete_with(
        self,
        delete_mode: DeleteMode,
        send_cancellations: Option<SendCancellationsMode>,
        affected_task_occurrences: Option<AffectedTaskOccurrences>,
    ) -> Result<(), Error> {
        let id = self
            .id()
            .ok_or(Error::InvalidOperation("only objects which exist on the server can be deleted"))?;

        let responses = self
            .service
            .delete_objects(
                self.object_type().kind(),
                &[id],
                delete_mode,
                send_cancellations,
                affected_task_occurrences,
            )
            .await?;

        single_response(responses)
    }
}

async fn get_single(
    service: &ExchangeService,
    id: ServiceObjectId,
    property_set: &PropertySet,
) -> Result<PropertyBag, Error> {
    let kind = id.kind();
    service
        .get_objects(kind, &[id], property_set)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedXml(String::from("the response contained no response messages")))?
}

fn single_response(responses: Vec<ServiceResponse>) -> Result<(), Error> {
    into_single_result(responses)
}
