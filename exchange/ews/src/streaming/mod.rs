/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

mod connection;
mod events;
mod framing;

pub use connection::{ConnectionObserver, ConnectionState, StreamingSubscriptionConnection};
pub use events::{EventTarget, NotificationEvent, NotificationGroup};

use crate::{service::ExchangeService, Error};

/// A subscription created on the server, whose events are delivered once it
/// is added to a [`StreamingSubscriptionConnection`].
#[derive(Clone, Debug)]
pub struct StreamingSubscription {
    id: String,
    service: ExchangeService,
}

impl StreamingSubscription {
    pub(crate) fn new(service: ExchangeService, id: String) -> Self {
        Self { id, service }
    }

    /// The opaque identifier the server assigned.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn service(&self) -> &ExchangeService {
        &self.service
    }

    /// Ends the subscription on the server.
    pub async fn unsubscribe(self) -> Result<(), Error> {
        self.service.unsubscribe(&self.id).await
    }
}
