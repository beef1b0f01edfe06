/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Lists the subjects of the most recent messages in the inbox.
//!
//! Reads its settings from `config.toml` in the working directory; see
//! `ews::config::ServiceConfig` for the format.

use std::fs;

use ews::{
    config::ServiceConfig,
    request::ItemView,
    schema::item,
    types::DistinguishedFolderName,
    Error,
};
use tracing_subscriber::EnvFilter;

const PAGE_SIZE: usize = 10;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = fs::read_to_string("config.toml")?;
    let service = ServiceConfig::from_toml(&config)?.into_service()?;

    let mut view = ItemView::new(PAGE_SIZE);
    loop {
        let results = service
            .find_items(DistinguishedFolderName::Inbox, &view, None)
            .await?;

        for found in &results.items {
            let subject = match found.get_str(&item::SUBJECT) {
                Ok(subject) => subject.unwrap_or("(no subject)"),
                Err(Error::PropertyNotLoaded(_)) => "(not loaded)",
                Err(err) => return Err(err.into()),
            };
            println!("[{}] {subject}", found.object_type().xml_element_name());
        }

        match results.next_page_offset {
            // Stop after a few pages; an inbox can be very large.
            Some(offset) if offset < PAGE_SIZE * 3 => view.set_offset(offset),
            _ => break,
        }
    }

    if let Some(version) = service.server_version() {
        println!("server version: {version:?}");
    }

    Ok(())
}
