/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    complex::{ComplexProperty, FolderId, ItemId},
    schema::ObjectKind,
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error,
};

/// A well-known folder which can be referenced by name.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid>.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum DistinguishedFolderName {
    #[xml_enum(rename = "calendar")]
    Calendar,
    #[xml_enum(rename = "contacts")]
    Contacts,
    #[xml_enum(rename = "deleteditems")]
    DeletedItems,
    #[xml_enum(rename = "drafts")]
    Drafts,
    #[xml_enum(rename = "inbox")]
    Inbox,
    #[xml_enum(rename = "journal")]
    Journal,
    #[xml_enum(rename = "junkemail")]
    JunkEmail,
    #[xml_enum(rename = "msgfolderroot")]
    MsgFolderRoot,
    #[xml_enum(rename = "notes")]
    Notes,
    #[xml_enum(rename = "outbox")]
    Outbox,
    #[xml_enum(rename = "root")]
    Root,
    #[xml_enum(rename = "searchfolders")]
    SearchFolders,
    #[xml_enum(rename = "sentitems")]
    SentItems,
    #[xml_enum(rename = "tasks")]
    Tasks,
}

/// An identifier for a remote folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderIdentifier {
    /// An identifier for an arbitrary folder.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderid>.
    Id(FolderId),

    /// An identifier for referencing a folder by name, e.g. "inbox" or
    /// "junkemail", optionally in another user's mailbox.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid>.
    Distinguished {
        name: DistinguishedFolderName,
        mailbox: Option<String>,
    },
}

impl From<DistinguishedFolderName> for FolderIdentifier {
    fn from(name: DistinguishedFolderName) -> Self {
        Self::Distinguished { name, mailbox: None }
    }
}

impl From<FolderId> for FolderIdentifier {
    fn from(id: FolderId) -> Self {
        Self::Id(id)
    }
}

impl FolderIdentifier {
    pub(crate) fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        match self {
            FolderIdentifier::Id(id) => id.write_to_xml(writer, XmlNamespace::Types, "FolderId"),
            FolderIdentifier::Distinguished { name, mailbox } => {
                writer.write_start_element(XmlNamespace::Types, "DistinguishedFolderId")?;
                writer.write_attribute_enum("Id", *name)?;

                if let Some(mailbox) = mailbox {
                    writer.write_start_element(XmlNamespace::Types, "Mailbox")?;
                    writer.write_element_value(XmlNamespace::Types, "EmailAddress", mailbox)?;
                    writer.write_end_element()?;
                }

                writer.write_end_element()
            }
        }
    }

    /// Reads a `FolderId` or `DistinguishedFolderId` element; returns `None`
    /// for any other element, leaving the reader where it was.
    pub(crate) fn try_read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Option<Self>, Error> {
        match reader.local_name() {
            "FolderId" => {
                let mut id = FolderId::default();
                id.load_from_xml(reader)?;

                Ok(Some(Self::Id(id)))
            }
            "DistinguishedFolderId" => {
                let name = reader
                    .read_attribute_enum("Id")?
                    .ok_or_else(|| Error::UnexpectedXml(String::from("DistinguishedFolderId without Id")))?;

                let mut mailbox = None;
                reader.read_children(|reader| {
                    if reader.local_name() == "Mailbox" {
                        reader.read_children(|reader| {
                            if reader.local_name() == "EmailAddress" {
                                mailbox = Some(reader.read_element_value()?);
                                Ok(())
                            } else {
                                reader.skip_current_element()
                            }
                        })
                    } else {
                        reader.skip_current_element()
                    }
                })?;

                Ok(Some(Self::Distinguished { name, mailbox }))
            }
            _ => Ok(None),
        }
    }
}

/// Writes a list of folder identifiers wrapped in the named element.
pub(crate) fn write_folder_ids(
    writer: &mut EwsXmlWriter,
    namespace: XmlNamespace,
    element_name: &str,
    ids: &[FolderIdentifier],
) -> Result<(), Error> {
    writer.write_start_element(namespace, element_name)?;
    for id in ids {
        id.write_to_xml(writer)?;
    }
    writer.write_end_element()
}

/// The identifier of an item or a folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceObjectId {
    Item(ItemId),
    Folder(FolderIdentifier),
}

impl ServiceObjectId {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Item(_) => ObjectKind::Item,
            Self::Folder(_) => ObjectKind::Folder,
        }
    }

    pub(crate) fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        match self {
            Self::Item(id) => id.write_to_xml(writer, XmlNamespace::Types, "ItemId"),
            Self::Folder(id) => id.write_to_xml(writer),
        }
    }
}

impl From<ItemId> for ServiceObjectId {
    fn from(id: ItemId) -> Self {
        Self::Item(id)
    }
}

impl From<FolderId> for ServiceObjectId {
    fn from(id: FolderId) -> Self {
        Self::Folder(FolderIdentifier::Id(id))
    }
}

impl From<FolderIdentifier> for ServiceObjectId {
    fn from(id: FolderIdentifier) -> Self {
        Self::Folder(id)
    }
}

impl From<DistinguishedFolderName> for ServiceObjectId {
    fn from(name: DistinguishedFolderName) -> Self {
        Self::Folder(name.into())
    }
}

/// The base set of properties to be returned in response to our request,
/// which can be extended with additional properties.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/baseshape>.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum BaseShape {
    /// Only the IDs of any items or folders returned.
    IdOnly,

    /// The default set of properties for the relevant item or folder, which
    /// depends on the type of the item or folder.
    Default,

    /// All first-class properties of an item or folder.
    #[default]
    AllProperties,
}

/// The manner in which to traverse a folder when looking for items.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/finditem#traversal-attribute>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum ItemTraversal {
    #[default]
    Shallow,
    SoftDeleted,
    Associated,
}

/// The manner in which a search folder searches its base folders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum SearchFolderTraversal {
    #[default]
    Shallow,
    Deep,
}

/// The action taken upon creating or updating a message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem#messagedisposition-attribute>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum MessageDisposition {
    SaveOnly,
    SendOnly,
    SendAndSaveCopy,
}

/// Whether meeting invitations are sent when an appointment is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum SendInvitationsMode {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

/// Whether meeting updates are sent when an appointment is updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum SendInvitationsOrCancellationsMode {
    SendToNone,
    SendOnlyToAll,
    SendOnlyToChanged,
    SendToAllAndSaveCopy,
    SendToChangedAndSaveCopy,
}

/// Whether cancellations are sent when an appointment is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum SendCancellationsMode {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

/// How conflicting updates are resolved by the server.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem#conflictresolution-attribute>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum ConflictResolutionMode {
    NeverOverwrite,
    #[default]
    AutoResolve,
    AlwaysOverwrite,
}

/// The manner in which items or folders are deleted.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deletetype>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum DeleteMode {
    HardDelete,
    SoftDelete,
    #[default]
    MoveToDeletedItems,
}

/// Which occurrences of a recurring task a deletion applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum AffectedTaskOccurrences {
    AllOccurrences,
    SpecifiedOccurrenceOnly,
}

/// Where the offset of an indexed paging view is counted from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, XmlEnum)]
pub enum OffsetBasePoint {
    #[default]
    Beginning,
    End,
}

/// The kinds of events a notification subscription can report.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/eventtype>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, XmlEnum)]
pub enum EventType {
    CopiedEvent,
    CreatedEvent,
    DeletedEvent,
    ModifiedEvent,
    MovedEvent,
    NewMailEvent,
    FreeBusyChangedEvent,
    StatusEvent,
}
