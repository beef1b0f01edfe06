/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutodiscoverError {
    #[error("`{0}` is not a valid email address")]
    InvalidAddress(String),

    #[error("failed to send autodiscover request")]
    Http(#[from] reqwest::Error),

    #[error("the autodiscover server requires authentication")]
    Unauthorized,

    #[error("the autodiscover server responded with HTTP status {0}")]
    HttpStatus(u16),

    #[error("failed to write autodiscover request")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("failed to parse autodiscover response")]
    Pox(#[from] serde_xml_rs::Error),

    #[error("unexpected autodiscover response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Ews(#[from] ews::Error),

    #[error("autodiscover failed with {code}: {message}")]
    Server { code: String, message: String },

    #[error("SRV lookup for {name} failed: {reason}")]
    Srv { name: String, reason: String },

    #[error("gave up after too many autodiscover redirections")]
    TooManyRedirects,

    #[error("no autodiscover endpoint answered for {0}")]
    NotFound(String),
}
