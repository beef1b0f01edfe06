/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use thiserror::Error;

use crate::{
    response::{ServiceResponse, SoapFault},
    version::ExchangeVersion,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read XML")]
    XmlRead(#[from] xml::reader::Error),

    #[error("failed to write XML")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("unexpected XML content: {0}")]
    UnexpectedXml(String),

    #[error(
        "the value of `{0}` has not been loaded; load the object with a property set that \
         includes it, or assign it a value before reading it"
    )]
    PropertyNotLoaded(&'static str),

    #[error("`{0}` is read-only in the object's current state")]
    PropertyReadOnly(&'static str),

    #[error("`{0}` cannot be deleted")]
    PropertyCannotBeDeleted(&'static str),

    #[error("the value assigned to `{0}` does not have the property's type")]
    PropertyTypeMismatch(&'static str),

    #[error("`{name}` requires {minimum} or later, but the service targets {requested}")]
    VersionMismatch {
        name: &'static str,
        minimum: ExchangeVersion,
        requested: ExchangeVersion,
    },

    #[error("validation of `{property}` failed")]
    PropertyValidation {
        property: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("the request is invalid")]
    Validation(#[from] ValidationError),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("the request failed with a SOAP fault: {0}")]
    SoapFault(Box<SoapFault>),

    #[error("the request failed: {0}")]
    Service(Box<ServiceResponse>),

    #[error("failed to send request")]
    Http(#[from] reqwest::Error),

    #[error("the server responded with HTTP status {0}")]
    HttpStatus(u16),

    #[error("invalid configuration")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error was raised on the client before any request was
    /// sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::PropertyNotLoaded(_)
                | Self::PropertyReadOnly(_)
                | Self::PropertyCannotBeDeleted(_)
                | Self::PropertyTypeMismatch(_)
                | Self::VersionMismatch { .. }
                | Self::PropertyValidation { .. }
                | Self::Validation(_)
        )
    }
}

/// A failed self-check of a value before it is sent to the server.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the days of the week must be specified")]
    DaysOfTheWeekNotSpecified,

    #[error("the interval must be greater than or equal to 1")]
    IntervalMustBeGreaterOrEqualToOne,

    #[error("the day of the month must be between 1 and 31")]
    DayOfMonthOutOfRange,

    #[error("the recurrence must have a start date")]
    RecurrenceHasNoStartDate,

    #[error("the number of occurrences must be greater than zero")]
    NumberOfOccurrencesMustBeGreaterThanZero,

    #[error("the end date precedes the start date")]
    RecurrenceEndsBeforeStart,

    #[error("`{0}` must be specified")]
    FieldNotSpecified(&'static str),

    #[error("the time zone definition is invalid or unsupported: {0}")]
    InvalidTimeZoneDefinition(&'static str),

    #[error("the search filter must name the property it applies to")]
    SearchFilterPropertyMissing,

    #[error("a `Not` filter requires a filter to negate")]
    NotFilterWithoutFilter,

    #[error("`{0}` must be set before the object is created")]
    RequiredPropertyMissing(&'static str),

    #[error("`{0}` must contain at least one element")]
    EmptyCollection(&'static str),

    #[error("the connection lifetime must be between 1 and 30 minutes")]
    ConnectionLifetimeOutOfRange,

    #[error("the page size must be greater than zero")]
    PageSizeMustBeGreaterThanZero,
}
