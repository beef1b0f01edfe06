/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// Lets `#[derive(XmlEnum)]` refer to this crate as `::ews` from within.
extern crate self as ews;

/// Structured property values (identifiers, bodies, recurrences, search
/// filters, time zones, …) and the XML contract they share.
pub mod complex;

/// Loading service settings from a TOML file.
pub mod config;

/// The `net` module is responsible for carrying SOAP envelopes to and from
/// the Exchange server.
pub mod net;

/// Property definitions, property sets and the per-object property bag.
pub mod property;

/// The SOAP operations this crate can issue.
pub mod request;

/// Response messages and SOAP faults.
pub mod response;

/// Per-type property schemas and the object type registry.
pub mod schema;

mod error;
mod service;
mod service_object;

/// Streaming notification subscriptions and their hanging connection.
pub mod streaming;

/// Identifiers and request options shared across operations.
pub mod types;

mod version;

/// The `xml` module provides cursor-style reading and writing of EWS XML.
pub mod xml;

pub use error::{Error, ValidationError};
pub use service::{ExchangeService, ExchangeServiceBuilder};
pub use service_object::{
    Appointment, CalendarFolder, Contact, ContactsFolder, Folder, Item, Message, SearchFolder, ServiceObject, Task,
    TasksFolder,
};
pub use version::ExchangeVersion;
