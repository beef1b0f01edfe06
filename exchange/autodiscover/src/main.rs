/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews::net::BasicCredentials;
use exchange_autodiscover::{AutodiscoverClient, AutodiscoverError};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let address = prompt("Enter an address: ")?;
    let mut client = AutodiscoverClient::new()?;
    let mut rng = StdRng::from_entropy();

    let result = match client.discover_ews_url(&address, &mut rng).await {
        Err(AutodiscoverError::Unauthorized) => {
            println!("Authentication needed.");
            print!("Enter a password: ");
            std::io::stdout().flush()?;
            let password = rpassword::read_password()?;

            client.set_credentials(BasicCredentials::new(address.as_str(), password));
            client.discover_ews_url(&address, &mut rng).await
        }
        result => result,
    };

    match result {
        Ok(url) => println!("EWS endpoint URL: {url}"),
        Err(err) => {
            println!("Failed to retrieve EWS endpoint: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                println!("  caused by: {cause}");
                source = cause.source();
            }
        }
    }

    Ok(())
}

fn prompt(message: &str) -> std::io::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    // The trailing newline would otherwise end up in the Basic auth header.
    Ok(line.trim().to_string())
}
