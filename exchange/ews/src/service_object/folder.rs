/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    complex::{SearchFilter, SearchFolderParameters},
    request::{FindItemsResults, ItemView},
    schema::{folder, ObjectKind},
    types::FolderIdentifier,
    Error, Item,
};

typed_service_object!(
    /// Any folder.
    Folder,
    folder::FOLDER,
    |object_type| object_type.kind() == ObjectKind::Folder
);

typed_service_object!(
    CalendarFolder,
    folder::CALENDAR_FOLDER,
    |object_type| object_type == &folder::CALENDAR_FOLDER
);

typed_service_object!(
    ContactsFolder,
    folder::CONTACTS_FOLDER,
    |object_type| object_type == &folder::CONTACTS_FOLDER
);

typed_service_object!(
    TasksFolder,
    folder::TASKS_FOLDER,
    |object_type| object_type == &folder::TASKS_FOLDER
);

typed_service_object!(
    /// A folder whose contents are the results of a standing search.
    SearchFolder,
    folder::SEARCH_FOLDER,
    |object_type| object_type == &folder::SEARCH_FOLDER
);

impl Folder {
    pub fn display_name(&self) -> Result<Option<&str>, Error> {
        self.get_str(&folder::DISPLAY_NAME)
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), Error> {
        self.set(&folder::DISPLAY_NAME, display_name.into())
    }

    /// The number of unread items, as last loaded.
    pub fn unread_count(&self) -> Result<Option<i32>, Error> {
        Ok(self.get(&folder::UNREAD_COUNT)?.and_then(|value| value.as_i32()))
    }

    /// Searches this folder for items, one page at a time.
    pub async fn find_items(
        &self,
        view: &ItemView,
        restriction: Option<&SearchFilter>,
    ) -> Result<FindItemsResults<Item>, Error> {
        let id = self.folder_identifier()?;
        self.service().find_items(id, view, restriction).await
    }

    fn folder_identifier(&self) -> Result<FolderIdentifier, Error> {
        self.property_bag()
            .id()
            .and_then(|value| value.as_folder_id())
            .cloned()
            .map(FolderIdentifier::Id)
            .ok_or(Error::InvalidOperation("only folders which exist on the server can be searched"))
    }
}

impl SearchFolder {
    pub fn search_parameters(&self) -> Result<Option<&SearchFolderParameters>, Error> {
        Ok(self
            .get(&folder::SEARCH_PARAMETERS)?
            .and_then(|value| value.as_search_parameters()))
    }

    pub fn set_search_parameters(&mut self, parameters: SearchFolderParameters) -> Result<(), Error> {
        self.set(&folder::SEARCH_PARAMETERS, parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::item,
        types::{DistinguishedFolderName, SearchFolderTraversal},
        ExchangeService, ServiceObject, ValidationError,
    };

    fn service() -> ExchangeService {
        ExchangeService::builder().build().unwrap()
    }

    #[test]
    fn any_folder_type_is_a_folder() {
        let service = service();

        for object_type in [
            &folder::FOLDER,
            &folder::CALENDAR_FOLDER,
            &folder::CONTACTS_FOLDER,
            &folder::TASKS_FOLDER,
            &folder::SEARCH_FOLDER,
        ] {
            assert!(Folder::try_from(ServiceObject::new(&service, object_type)).is_ok());
        }

        assert!(Folder::try_from(ServiceObject::new(&service, &item::MESSAGE)).is_err());
        assert!(CalendarFolder::try_from(ServiceObject::new(&service, &folder::FOLDER)).is_err());
    }

    #[test]
    fn new_folders_need_a_display_name() {
        let service = service();

        let mut receipts = Folder::new(&service);
        assert!(matches!(
            receipts.validate(),
            Err(Error::PropertyValidation {
                source: ValidationError::RequiredPropertyMissing("DisplayName"),
                ..
            })
        ));

        receipts.set_display_name("Receipts").unwrap();
        assert_eq!(receipts.display_name().unwrap(), Some("Receipts"));
        assert!(receipts.validate().is_ok());
    }

    #[test]
    fn search_parameters_are_validated_with_the_folder() {
        let mut unread = SearchFolder::new(&service());
        unread.set(&folder::DISPLAY_NAME, "Unread").unwrap();
        assert!(unread.validate().is_err());

        unread
            .set_search_parameters(SearchFolderParameters {
                traversal: SearchFolderTraversal::Shallow,
                restriction: None,
                base_folder_ids: vec![DistinguishedFolderName::Inbox.into()],
            })
            .unwrap();

        assert!(unread.validate().is_ok());
        assert_eq!(unread.search_parameters().unwrap().unwrap().base_folder_ids.len(), 1);
    }

    #[tokio::test]
    async fn unsaved_folders_cannot_be_searched() {
        let inbox = Folder::new(&service());

        assert!(matches!(
            inbox.find_items(&ItemView::new(10), None).await,
            Err(Error::InvalidOperation(_))
        ));
    }
}
