/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Item types and their properties.
//!
//! Properties are declared in the order the EWS schema requires their
//! elements to appear.

use once_cell::sync::Lazy;

use crate::{
    complex::MeetingResponseType,
    property::{PropertyDefinition, PropertyDefinitionFlags as F, PropertyKind},
    version::ExchangeVersion::{self, Exchange2007Sp1, Exchange2010},
    xml::XmlEnum,
};

use super::{ObjectKind, Schema, ServiceObjectType};

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/sensitivity>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum Sensitivity {
    Normal,
    Personal,
    Private,
    Confidential,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/importance>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum Importance {
    Low,
    Normal,
    High,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/legacyfreebusystatus>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum LegacyFreeBusyStatus {
    Free,
    Tentative,
    Busy,
    #[xml_enum(rename = "OOF")]
    OutOfOffice,
    WorkingElsewhere,
    NoData,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/calendaritemtype>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum CalendarItemType {
    Single,
    Occurrence,
    Exception,
    RecurringMaster,
}

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/status>
#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    WaitingOnOthers,
    Deferred,
}

const fn property(
    xml_element_name: &'static str,
    uri: &'static str,
    kind: PropertyKind,
    flags: F,
) -> PropertyDefinition {
    PropertyDefinition::new(xml_element_name, uri, kind, flags, Exchange2007Sp1)
}

const fn versioned(
    xml_element_name: &'static str,
    uri: &'static str,
    kind: PropertyKind,
    flags: F,
    version: ExchangeVersion,
) -> PropertyDefinition {
    PropertyDefinition::new(xml_element_name, uri, kind, flags, version)
}

const COLLECTION: F = F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_APPEND).union(F::CAN_DELETE);
const SETTABLE: F = F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_FIND);

// Item

pub static ITEM_ID: PropertyDefinition = property("ItemId", "item:ItemId", PropertyKind::ItemId, F::CAN_FIND);
pub static PARENT_FOLDER_ID: PropertyDefinition = property(
    "ParentFolderId",
    "item:ParentFolderId",
    PropertyKind::FolderId,
    F::CAN_FIND,
);
pub static ITEM_CLASS: PropertyDefinition = property("ItemClass", "item:ItemClass", PropertyKind::String, SETTABLE);
pub static SUBJECT: PropertyDefinition = property("Subject", "item:Subject", PropertyKind::String, F::EDITABLE);
pub static SENSITIVITY: PropertyDefinition = property(
    "Sensitivity",
    "item:Sensitivity",
    PropertyKind::Enum(Sensitivity::VARIANTS),
    SETTABLE,
);
pub static BODY: PropertyDefinition = property(
    "Body",
    "item:Body",
    PropertyKind::Body,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
);
pub static DATE_TIME_RECEIVED: PropertyDefinition = property(
    "DateTimeReceived",
    "item:DateTimeReceived",
    PropertyKind::DateTime,
    F::CAN_FIND,
);
pub static SIZE: PropertyDefinition = property("Size", "item:Size", PropertyKind::Integer, F::CAN_FIND);
pub static CATEGORIES: PropertyDefinition = property(
    "Categories",
    "item:Categories",
    PropertyKind::Strings,
    COLLECTION.union(F::CAN_FIND),
);
pub static IMPORTANCE: PropertyDefinition = property(
    "Importance",
    "item:Importance",
    PropertyKind::Enum(Importance::VARIANTS),
    SETTABLE,
);
pub static IS_DRAFT: PropertyDefinition = property("IsDraft", "item:IsDraft", PropertyKind::Boolean, F::CAN_FIND);
pub static DATE_TIME_SENT: PropertyDefinition = property(
    "DateTimeSent",
    "item:DateTimeSent",
    PropertyKind::DateTime,
    F::CAN_FIND,
);
pub static DATE_TIME_CREATED: PropertyDefinition = property(
    "DateTimeCreated",
    "item:DateTimeCreated",
    PropertyKind::DateTime,
    F::CAN_FIND,
);
pub static REMINDER_IS_SET: PropertyDefinition = property(
    "ReminderIsSet",
    "item:ReminderIsSet",
    PropertyKind::Boolean,
    SETTABLE,
);
pub static REMINDER_MINUTES_BEFORE_START: PropertyDefinition = property(
    "ReminderMinutesBeforeStart",
    "item:ReminderMinutesBeforeStart",
    PropertyKind::Integer,
    SETTABLE,
);
pub static DISPLAY_CC: PropertyDefinition = property("DisplayCc", "item:DisplayCc", PropertyKind::String, F::CAN_FIND);
pub static DISPLAY_TO: PropertyDefinition = property("DisplayTo", "item:DisplayTo", PropertyKind::String, F::CAN_FIND);
pub static HAS_ATTACHMENTS: PropertyDefinition = property(
    "HasAttachments",
    "item:HasAttachments",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static LAST_MODIFIED_TIME: PropertyDefinition = property(
    "LastModifiedTime",
    "item:LastModifiedTime",
    PropertyKind::DateTime,
    F::CAN_FIND,
);
pub static UNIQUE_BODY: PropertyDefinition = versioned(
    "UniqueBody",
    "item:UniqueBody",
    PropertyKind::Body,
    F::MUST_BE_EXPLICITLY_LOADED,
    Exchange2010,
);

pub static ITEM_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Item")
        .id(&ITEM_ID)
        .add(&PARENT_FOLDER_ID)
        .add(&ITEM_CLASS)
        .add(&SUBJECT)
        .add(&SENSITIVITY)
        .add(&BODY)
        .add(&DATE_TIME_RECEIVED)
        .add(&SIZE)
        .add(&CATEGORIES)
        .add(&IMPORTANCE)
        .add(&IS_DRAFT)
        .add(&DATE_TIME_SENT)
        .add(&DATE_TIME_CREATED)
        .add(&REMINDER_IS_SET)
        .add(&REMINDER_MINUTES_BEFORE_START)
        .add(&DISPLAY_CC)
        .add(&DISPLAY_TO)
        .add(&HAS_ATTACHMENTS)
        .add(&LAST_MODIFIED_TIME)
        .add(&UNIQUE_BODY)
        .build()
});

// Message

pub static SENDER: PropertyDefinition = property("Sender", "message:Sender", PropertyKind::EmailAddress, F::EDITABLE);
pub static TO_RECIPIENTS: PropertyDefinition = property(
    "ToRecipients",
    "message:ToRecipients",
    PropertyKind::EmailAddresses,
    COLLECTION,
);
pub static CC_RECIPIENTS: PropertyDefinition = property(
    "CcRecipients",
    "message:CcRecipients",
    PropertyKind::EmailAddresses,
    COLLECTION,
);
pub static BCC_RECIPIENTS: PropertyDefinition = property(
    "BccRecipients",
    "message:BccRecipients",
    PropertyKind::EmailAddresses,
    COLLECTION,
);
pub static IS_READ_RECEIPT_REQUESTED: PropertyDefinition = property(
    "IsReadReceiptRequested",
    "message:IsReadReceiptRequested",
    PropertyKind::Boolean,
    SETTABLE,
);
pub static CONVERSATION_TOPIC: PropertyDefinition = property(
    "ConversationTopic",
    "message:ConversationTopic",
    PropertyKind::String,
    F::CAN_FIND,
);
pub static FROM: PropertyDefinition = property("From", "message:From", PropertyKind::EmailAddress, F::EDITABLE);
pub static INTERNET_MESSAGE_ID: PropertyDefinition = property(
    "InternetMessageId",
    "message:InternetMessageId",
    PropertyKind::String,
    F::CAN_FIND,
);
pub static IS_READ: PropertyDefinition = property("IsRead", "message:IsRead", PropertyKind::Boolean, SETTABLE);

pub static MESSAGE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Message")
        .extend(&ITEM_SCHEMA)
        .add(&SENDER)
        .add(&TO_RECIPIENTS)
        .add(&CC_RECIPIENTS)
        .add(&BCC_RECIPIENTS)
        .add(&IS_READ_RECEIPT_REQUESTED)
        .add(&CONVERSATION_TOPIC)
        .add(&FROM)
        .add(&INTERNET_MESSAGE_ID)
        .add(&IS_READ)
        .build()
});

// Appointment

pub static UID: PropertyDefinition = property(
    "UID",
    "calendar:UID",
    PropertyKind::String,
    F::CAN_SET.union(F::CAN_FIND),
);
pub static START: PropertyDefinition = property(
    "Start",
    "calendar:Start",
    PropertyKind::DateTime,
    SETTABLE.union(F::REQUIRED_FOR_CREATE),
);
pub static END: PropertyDefinition = property(
    "End",
    "calendar:End",
    PropertyKind::DateTime,
    SETTABLE.union(F::REQUIRED_FOR_CREATE),
);
pub static IS_ALL_DAY_EVENT: PropertyDefinition = property(
    "IsAllDayEvent",
    "calendar:IsAllDayEvent",
    PropertyKind::Boolean,
    SETTABLE,
);
pub static LEGACY_FREE_BUSY_STATUS: PropertyDefinition = property(
    "LegacyFreeBusyStatus",
    "calendar:LegacyFreeBusyStatus",
    PropertyKind::Enum(LegacyFreeBusyStatus::VARIANTS),
    SETTABLE,
);
pub static LOCATION: PropertyDefinition = property("Location", "calendar:Location", PropertyKind::String, F::EDITABLE);
pub static IS_MEETING: PropertyDefinition = property(
    "IsMeeting",
    "calendar:IsMeeting",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static IS_CANCELLED: PropertyDefinition = property(
    "IsCancelled",
    "calendar:IsCancelled",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static IS_RECURRING: PropertyDefinition = property(
    "IsRecurring",
    "calendar:IsRecurring",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static CALENDAR_ITEM_TYPE: PropertyDefinition = property(
    "CalendarItemType",
    "calendar:CalendarItemType",
    PropertyKind::Enum(CalendarItemType::VARIANTS),
    F::CAN_FIND,
);
pub static MY_RESPONSE_TYPE: PropertyDefinition = property(
    "MyResponseType",
    "calendar:MyResponseType",
    PropertyKind::Enum(MeetingResponseType::VARIANTS),
    F::CAN_FIND,
);
pub static ORGANIZER: PropertyDefinition = property(
    "Organizer",
    "calendar:Organizer",
    PropertyKind::EmailAddress,
    F::CAN_FIND,
);
pub static REQUIRED_ATTENDEES: PropertyDefinition = property(
    "RequiredAttendees",
    "calendar:RequiredAttendees",
    PropertyKind::Attendees,
    COLLECTION,
);
pub static OPTIONAL_ATTENDEES: PropertyDefinition = property(
    "OptionalAttendees",
    "calendar:OptionalAttendees",
    PropertyKind::Attendees,
    COLLECTION,
);
pub static RESOURCES: PropertyDefinition = property(
    "Resources",
    "calendar:Resources",
    PropertyKind::Attendees,
    COLLECTION,
);
pub static DURATION: PropertyDefinition = property(
    "Duration",
    "calendar:Duration",
    PropertyKind::String,
    F::CAN_FIND,
);
pub static APPOINTMENT_RECURRENCE: PropertyDefinition = property(
    "Recurrence",
    "calendar:Recurrence",
    PropertyKind::Recurrence,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
);
pub static START_TIME_ZONE: PropertyDefinition = versioned(
    "StartTimeZone",
    "calendar:StartTimeZone",
    PropertyKind::TimeZone,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
    Exchange2010,
);
pub static END_TIME_ZONE: PropertyDefinition = versioned(
    "EndTimeZone",
    "calendar:EndTimeZone",
    PropertyKind::TimeZone,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
    Exchange2010,
);

pub static APPOINTMENT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Appointment")
        .extend(&ITEM_SCHEMA)
        .add(&UID)
        .add(&START)
        .add(&END)
        .add(&IS_ALL_DAY_EVENT)
        .add(&LEGACY_FREE_BUSY_STATUS)
        .add(&LOCATION)
        .add(&IS_MEETING)
        .add(&IS_CANCELLED)
        .add(&IS_RECURRING)
        .add(&CALENDAR_ITEM_TYPE)
        .add(&MY_RESPONSE_TYPE)
        .add(&ORGANIZER)
        .add(&REQUIRED_ATTENDEES)
        .add(&OPTIONAL_ATTENDEES)
        .add(&RESOURCES)
        .add(&DURATION)
        .add(&APPOINTMENT_RECURRENCE)
        .add(&START_TIME_ZONE)
        .add(&END_TIME_ZONE)
        .build()
});

// Task

pub static ACTUAL_WORK: PropertyDefinition = property(
    "ActualWork",
    "task:ActualWork",
    PropertyKind::Integer,
    F::EDITABLE,
);
pub static COMPANIES: PropertyDefinition = property(
    "Companies",
    "task:Companies",
    PropertyKind::Strings,
    COLLECTION.union(F::CAN_FIND),
);
pub static COMPLETE_DATE: PropertyDefinition = property(
    "CompleteDate",
    "task:CompleteDate",
    PropertyKind::DateTime,
    F::CAN_FIND,
);
pub static DUE_DATE: PropertyDefinition = property("DueDate", "task:DueDate", PropertyKind::DateTime, F::EDITABLE);
pub static IS_COMPLETE: PropertyDefinition = property(
    "IsComplete",
    "task:IsComplete",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static TASK_IS_RECURRING: PropertyDefinition = property(
    "IsRecurring",
    "task:IsRecurring",
    PropertyKind::Boolean,
    F::CAN_FIND,
);
pub static OWNER: PropertyDefinition = property("Owner", "task:Owner", PropertyKind::String, F::CAN_FIND);
pub static PERCENT_COMPLETE: PropertyDefinition = property(
    "PercentComplete",
    "task:PercentComplete",
    PropertyKind::Double,
    SETTABLE,
);
pub static TASK_RECURRENCE: PropertyDefinition = property(
    "Recurrence",
    "task:Recurrence",
    PropertyKind::Recurrence,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
);
pub static START_DATE: PropertyDefinition = property(
    "StartDate",
    "task:StartDate",
    PropertyKind::DateTime,
    F::EDITABLE,
);
pub static STATUS: PropertyDefinition = property(
    "Status",
    "task:Status",
    PropertyKind::Enum(TaskStatus::VARIANTS),
    SETTABLE,
);
pub static TOTAL_WORK: PropertyDefinition = property("TotalWork", "task:TotalWork", PropertyKind::Integer, F::EDITABLE);

pub static TASK_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Task")
        .extend(&ITEM_SCHEMA)
        .add(&ACTUAL_WORK)
        .add(&COMPANIES)
        .add(&COMPLETE_DATE)
        .add(&DUE_DATE)
        .add(&IS_COMPLETE)
        .add(&TASK_IS_RECURRING)
        .add(&OWNER)
        .add(&PERCENT_COMPLETE)
        .add(&TASK_RECURRENCE)
        .add(&START_DATE)
        .add(&STATUS)
        .add(&TOTAL_WORK)
        .build()
});

// Contact

pub static FILE_AS: PropertyDefinition = property("FileAs", "contacts:FileAs", PropertyKind::String, F::EDITABLE);
pub static CONTACT_DISPLAY_NAME: PropertyDefinition = property(
    "DisplayName",
    "contacts:DisplayName",
    PropertyKind::String,
    F::EDITABLE,
);
pub static GIVEN_NAME: PropertyDefinition = property(
    "GivenName",
    "contacts:GivenName",
    PropertyKind::String,
    F::EDITABLE,
);
pub static INITIALS: PropertyDefinition = property("Initials", "contacts:Initials", PropertyKind::String, F::EDITABLE);
pub static MIDDLE_NAME: PropertyDefinition = property(
    "MiddleName",
    "contacts:MiddleName",
    PropertyKind::String,
    F::EDITABLE,
);
pub static NICKNAME: PropertyDefinition = property("Nickname", "contacts:Nickname", PropertyKind::String, F::EDITABLE);
pub static COMPANY_NAME: PropertyDefinition = property(
    "CompanyName",
    "contacts:CompanyName",
    PropertyKind::String,
    F::EDITABLE,
);
pub static BIRTHDAY: PropertyDefinition = property(
    "Birthday",
    "contacts:Birthday",
    PropertyKind::DateTime,
    F::EDITABLE,
);
pub static DEPARTMENT: PropertyDefinition = property(
    "Department",
    "contacts:Department",
    PropertyKind::String,
    F::EDITABLE,
);
pub static JOB_TITLE: PropertyDefinition = property("JobTitle", "contacts:JobTitle", PropertyKind::String, F::EDITABLE);
pub static MANAGER: PropertyDefinition = property("Manager", "contacts:Manager", PropertyKind::String, F::EDITABLE);
pub static SURNAME: PropertyDefinition = property("Surname", "contacts:Surname", PropertyKind::String, F::EDITABLE);

pub static CONTACT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Contact")
        .extend(&ITEM_SCHEMA)
        .add(&FILE_AS)
        .add(&CONTACT_DISPLAY_NAME)
        .add(&GIVEN_NAME)
        .add(&INITIALS)
        .add(&MIDDLE_NAME)
        .add(&NICKNAME)
        .add(&COMPANY_NAME)
        .add(&BIRTHDAY)
        .add(&DEPARTMENT)
        .add(&JOB_TITLE)
        .add(&MANAGER)
        .add(&SURNAME)
        .build()
});

pub static ITEM: ServiceObjectType = ServiceObjectType::new("Item", ObjectKind::Item, &ITEM_SCHEMA, Exchange2007Sp1);
pub static MESSAGE: ServiceObjectType =
    ServiceObjectType::new("Message", ObjectKind::Item, &MESSAGE_SCHEMA, Exchange2007Sp1);
pub static APPOINTMENT: ServiceObjectType =
    ServiceObjectType::new("CalendarItem", ObjectKind::Item, &APPOINTMENT_SCHEMA, Exchange2007Sp1);
pub static TASK: ServiceObjectType = ServiceObjectType::new("Task", ObjectKind::Item, &TASK_SCHEMA, Exchange2007Sp1);
pub static CONTACT: ServiceObjectType =
    ServiceObjectType::new("Contact", ObjectKind::Item, &CONTACT_SCHEMA, Exchange2007Sp1);
