/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Locating the EWS endpoint of a mailbox.
//!
//! [`AutodiscoverClient::discover_ews_url`] walks the POX autodiscover
//! endpoints of the address' domain, following redirections and falling
//! back to a DNS SRV lookup when a [`srv::SrvResolver`] is configured.
//! [`AutodiscoverClient::get_user_settings`] speaks the SOAP protocol and
//! can ask about several users at once.

mod client;
mod error;
pub mod pox;
pub mod srv;
pub mod user_settings;

pub use client::{candidate_urls, domain_of, soap_url, AutodiscoverClient, MAX_REDIRECTIONS};
pub use error::AutodiscoverError;
