/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::oneshot};
use tracing::{debug, info, trace, warn};

use crate::{
    net::SoapRequest,
    request::{read_streaming_events_response, ConnectionStatus, GetStreamingEvents, StreamingEventsResponse},
    response::{ServiceError, ServiceResponse},
    service::ExchangeService,
    Error, ValidationError,
};

use super::{framing::EnvelopeSplitter, NotificationGroup, StreamingSubscription};

/// Receives what happens on a [`StreamingSubscriptionConnection`].
///
/// Callbacks run on the connection's background task and must not block.
pub trait ConnectionObserver: Send + Sync {
    /// A batch of at least one event arrived for `subscription`.
    fn on_notification(&self, _subscription: &StreamingSubscription, _notification: &NotificationGroup) {}

    /// The server reported an error for `subscription`. The subscription is
    /// dropped from the connection unless notifications were merely missed.
    fn on_subscription_error(&self, _subscription: &StreamingSubscription, _response: &ServiceResponse) {}

    /// The hanging request ended, either because it was closed or timed out
    /// (`None`) or because it failed.
    fn on_disconnect(&self, _error: Option<&Error>) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,

    /// The request has been issued but the server hasn't answered yet.
    Opening,
    Open,

    /// The last request ended with an error. The connection can be opened
    /// again.
    Faulted,
}

impl ConnectionState {
    fn is_idle(self) -> bool {
        matches!(self, Self::Closed | Self::Faulted)
    }
}

/// Delivers the events of a set of streaming subscriptions over a single
/// hanging `GetStreamingEvents` request.
///
/// The subscriptions can only be changed while the connection is closed. A
/// closed or disconnected connection keeps its subscriptions and can be
/// opened again. Dropping the connection ends its request.
pub struct StreamingSubscriptionConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    service: ExchangeService,
    lifetime_minutes: u32,
    shared: Mutex<Shared>,
}

struct Shared {
    state: ConnectionState,
    subscriptions: BTreeMap<String, StreamingSubscription>,
    observers: Vec<Arc<dyn ConnectionObserver>>,
    cancel: Option<oneshot::Sender<()>>,

    /// Bumped on every open and close. A request from an older generation
    /// delivers nothing and leaves the state alone.
    generation: u64,
}

impl StreamingSubscriptionConnection {
    /// Creates a closed connection whose requests last `lifetime_minutes`,
    /// between 1 and 30.
    pub fn new(service: &ExchangeService, lifetime_minutes: u32) -> Result<Self, Error> {
        if !(1..=30).contains(&lifetime_minutes) {
            return Err(ValidationError::ConnectionLifetimeOutOfRange.into());
        }

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                service: service.clone(),
                lifetime_minutes,
                shared: Mutex::new(Shared {
                    state: ConnectionState::Closed,
                    subscriptions: BTreeMap::new(),
                    observers: Vec::new(),
                    cancel: None,
                    generation: 0,
                }),
            }),
        })
    }

    pub fn lifetime_minutes(&self) -> u32 {
        self.inner.lifetime_minutes
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().state
    }

    /// Whether a request is in flight, including one the server has yet to
    /// answer.
    pub fn is_open(&self) -> bool {
        !self.state().is_idle()
    }

    pub fn add_observer(&self, observer: Arc<dyn ConnectionObserver>) {
        self.inner.shared.lock().observers.push(observer);
    }

    pub fn subscriptions(&self) -> Vec<StreamingSubscription> {
        self.inner.shared.lock().subscriptions.values().cloned().collect()
    }

    pub fn add_subscription(&self, subscription: StreamingSubscription) -> Result<(), Error> {
        let mut shared = self.inner.shared.lock();
        if !shared.state.is_idle() {
            return Err(Error::InvalidOperation(
                "subscriptions cannot be added while the connection is open",
            ));
        }

        shared.subscriptions.insert(subscription.id().to_owned(), subscription);

        Ok(())
    }

    pub fn remove_subscription(&self, subscription_id: &str) -> Result<Option<StreamingSubscription>, Error> {
        let mut shared = self.inner.shared.lock();
        if !shared.state.is_idle() {
            return Err(Error::InvalidOperation(
                "subscriptions cannot be removed while the connection is open",
            ));
        }

        Ok(shared.subscriptions.remove(subscription_id))
    }

    /// Issues the hanging request for every subscription on the connection.
    ///
    /// Must be called from within a Tokio runtime, which runs the request.
    /// Failures of the request itself are reported through
    /// [`ConnectionObserver::on_disconnect`].
    pub fn open(&self) -> Result<(), Error> {
        let runtime = Handle::try_current().map_err(|_| {
            Error::InvalidOperation("a streaming connection can only be opened within a Tokio runtime")
        })?;

        let mut shared = self.inner.shared.lock();
        if !shared.state.is_idle() {
            return Err(Error::InvalidOperation("the connection is already open"));
        }
        if shared.subscriptions.is_empty() {
            return Err(Error::InvalidOperation("the connection has no subscriptions to open"));
        }

        let subscription_ids: Vec<String> = shared.subscriptions.keys().cloned().collect();
        let mut request = self.inner.service.prepare(&GetStreamingEvents {
            subscription_ids: &subscription_ids,
            connection_timeout: self.inner.lifetime_minutes,
        })?;
        // The server ends the request when its lifetime runs out.
        request.timeout = Some(Duration::from_secs(u64::from(self.inner.lifetime_minutes + 1) * 60));

        let (cancel, cancelled) = oneshot::channel();
        shared.generation += 1;
        shared.state = ConnectionState::Opening;
        shared.cancel = Some(cancel);
        let generation = shared.generation;
        drop(shared);

        info!(
            subscriptions = subscription_ids.len(),
            lifetime_minutes = self.inner.lifetime_minutes,
            "opening streaming connection"
        );
        runtime.spawn(Arc::clone(&self.inner).run(request, generation, cancelled));

        Ok(())
    }

    /// Ends the hanging request. Observers are told through
    /// [`ConnectionObserver::on_disconnect`] once it has ended.
    pub fn close(&self) -> Result<(), Error> {
        let cancel = {
            let mut shared = self.inner.shared.lock();
            if shared.state.is_idle() {
                return Err(Error::InvalidOperation("the connection is not open"));
            }

            shared.generation += 1;
            shared.state = ConnectionState::Closed;
            shared.cancel.take()
        };

        info!("closing streaming connection");
        if let Some(cancel) = cancel {
            // The request may already have ended on its own.
            let _ = cancel.send(());
        }

        Ok(())
    }
}

impl fmt::Debug for StreamingSubscriptionConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("StreamingSubscriptionConnection")
            .field("state", &shared.state)
            .field("subscriptions", &shared.subscriptions.keys().collect::<Vec<_>>())
            .field("lifetime_minutes", &self.inner.lifetime_minutes)
            .finish_non_exhaustive()
    }
}

impl Drop for StreamingSubscriptionConnection {
    fn drop(&mut self) {
        let cancel = {
            let mut shared = self.inner.shared.lock();
            shared.generation += 1;
            shared.state = ConnectionState::Closed;
            shared.cancel.take()
        };

        if let Some(cancel) = cancel {
            debug!("dropping an open streaming connection");
            let _ = cancel.send(());
        }
    }
}

impl ConnectionInner {
    async fn run(self: Arc<Self>, request: SoapRequest, generation: u64, cancelled: oneshot::Receiver<()>) {
        let result = tokio::select! {
            biased;

            result = self.receive(request, generation) => result,
            _ = cancelled => {
                debug!("streaming request cancelled");
                Ok(())
            }
        };

        self.finish(generation, result.err());
    }

    async fn receive(&self, request: SoapRequest, generation: u64) -> Result<(), Error> {
        let mut body = self.service.send_streaming(request).await?;
        self.mark_open(generation);

        let mut splitter = EnvelopeSplitter::default();
        while let Some(chunk) = body.next().await {
            for envelope in splitter.push(&chunk?) {
                trace!(envelope = %String::from_utf8_lossy(&envelope), "streaming envelope");

                let mut responses = Vec::new();
                self.service.read_response(&envelope, |reader| {
                    responses.extend(read_streaming_events_response(reader)?);
                    Ok(())
                })?;

                if self.dispatch(responses, generation)? == ConnectionStatus::Closed {
                    return Ok(());
                }
            }
        }

        if splitter.has_partial_envelope() {
            return Err(Error::UnexpectedXml(String::from(
                "the connection ended in the middle of a response",
            )));
        }

        Ok(())
    }

    fn mark_open(&self, generation: u64) {
        let mut shared = self.shared.lock();
        if shared.generation == generation && shared.state == ConnectionState::Opening {
            shared.state = ConnectionState::Open;
            drop(shared);

            info!("streaming connection open");
        }
    }

    fn dispatch(&self, responses: Vec<StreamingEventsResponse>, generation: u64) -> Result<ConnectionStatus, Error> {
        let mut status = ConnectionStatus::Ok;

        for response in responses {
            if response.connection_status == Some(ConnectionStatus::Closed) {
                status = ConnectionStatus::Closed;
            }

            if response.response.is_error() {
                if response.error_subscription_ids.is_empty() {
                    return Err(Error::Service(Box::new(response.response)));
                }

                self.report_subscription_errors(&response.response, &response.error_subscription_ids, generation);
            }

            for group in &response.notifications {
                self.deliver(group, generation);
            }
        }

        Ok(status)
    }

    fn deliver(&self, group: &NotificationGroup, generation: u64) {
        let (subscription, observers) = {
            let shared = self.shared.lock();
            if shared.generation != generation {
                trace!(subscription_id = %group.subscription_id, "dropping notifications from a closed request");
                return;
            }

            (
                shared.subscriptions.get(&group.subscription_id).cloned(),
                shared.observers.clone(),
            )
        };

        let Some(subscription) = subscription else {
            debug!(
                subscription_id = %group.subscription_id,
                "dropping notifications for a subscription not on the connection"
            );
            return;
        };

        if group.events.is_empty() {
            trace!(subscription_id = %group.subscription_id, "heartbeat");
            return;
        }

        for observer in &observers {
            observer.on_notification(&subscription, group);
        }
    }

    fn report_subscription_errors(&self, response: &ServiceResponse, subscription_ids: &[String], generation: u64) {
        let keep = response.code == ServiceError::ErrorMissedNotificationEvents;

        for subscription_id in subscription_ids {
            let (subscription, observers) = {
                let mut shared = self.shared.lock();
                if shared.generation != generation {
                    return;
                }

                let subscription = if keep {
                    shared.subscriptions.get(subscription_id).cloned()
                } else {
                    shared.subscriptions.remove(subscription_id)
                };

                (subscription, shared.observers.clone())
            };

            let Some(subscription) = subscription else {
                continue;
            };

            warn!(
                subscription_id = %subscription_id,
                error = %response,
                removed = !keep,
                "streaming subscription error"
            );
            for observer in &observers {
                observer.on_subscription_error(&subscription, response);
            }
        }
    }

    fn finish(&self, generation: u64, error: Option<Error>) {
        let observers = {
            let mut shared = self.shared.lock();
            if shared.generation == generation {
                shared.state = match error {
                    Some(_) => ConnectionState::Faulted,
                    None => ConnectionState::Closed,
                };
                shared.cancel = None;
            }

            shared.observers.clone()
        };

        match &error {
            Some(error) => warn!(%error, "streaming connection lost"),
            None => info!("streaming connection closed"),
        }

        for observer in &observers {
            observer.on_disconnect(error.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::stream;
    use tokio::{sync::mpsc, time::timeout};

    use super::*;
    use crate::net::{ResponseStream, Transport};

    /// Answers the streaming request with a prepared body.
    struct StreamingTransport {
        body: Mutex<Option<ResponseStream>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for StreamingTransport {
        async fn send(&self, _request: SoapRequest) -> Result<Vec<u8>, Error> {
            Err(Error::HttpStatus(501))
        }

        async fn send_streaming(&self, request: SoapRequest) -> Result<ResponseStream, Error> {
            self.requests
                .lock()
                .push(String::from_utf8(request.body).unwrap());

            self.body.lock().take().ok_or(Error::HttpStatus(503))
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Notification(String, usize),
        SubscriptionError(String, ServiceError),
        Disconnected(Option<String>),
    }

    struct Recorder(mpsc::UnboundedSender<Event>);

    impl ConnectionObserver for Recorder {
        fn on_notification(&self, subscription: &StreamingSubscription, notification: &NotificationGroup) {
            let _ = self.0.send(Event::Notification(
                subscription.id().to_owned(),
                notification.events.len(),
            ));
        }

        fn on_subscription_error(&self, subscription: &StreamingSubscription, response: &ServiceResponse) {
            let _ = self
                .0
                .send(Event::SubscriptionError(subscription.id().to_owned(), response.code));
        }

        fn on_disconnect(&self, error: Option<&Error>) {
            let _ = self.0.send(Event::Disconnected(error.map(|error| error.to_string())));
        }
    }

    struct Harness {
        connection: StreamingSubscriptionConnection,
        events: mpsc::UnboundedReceiver<Event>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new(body: Option<ResponseStream>, subscription_ids: &[&str]) -> Self {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let service = ExchangeService::builder()
                .transport(StreamingTransport {
                    body: Mutex::new(body),
                    requests: Arc::clone(&requests),
                })
                .build()
                .unwrap();

            let connection = StreamingSubscriptionConnection::new(&service, 10).unwrap();
            for id in subscription_ids {
                connection
                    .add_subscription(StreamingSubscription::new(service.clone(), id.to_string()))
                    .unwrap();
            }

            let (sender, events) = mpsc::unbounded_channel();
            connection.add_observer(Arc::new(Recorder(sender)));

            Self {
                connection,
                events,
                requests,
            }
        }

        async fn next_event(&mut self) -> Event {
            timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for an event")
                .expect("observer dropped")
        }
    }

    fn envelope(messages: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<m:GetStreamingEventsResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
<m:ResponseMessages>{messages}</m:ResponseMessages>
</m:GetStreamingEventsResponse></s:Body></s:Envelope>"#
        )
        .into_bytes()
    }

    fn body(envelopes: Vec<Vec<u8>>) -> ResponseStream {
        stream::iter(envelopes.into_iter().map(Ok)).boxed()
    }

    #[test]
    fn lifetime_is_between_one_and_thirty_minutes() {
        let service = ExchangeService::builder().build().unwrap();

        for lifetime in [0, 31] {
            assert!(matches!(
                StreamingSubscriptionConnection::new(&service, lifetime),
                Err(Error::Validation(ValidationError::ConnectionLifetimeOutOfRange))
            ));
        }
        assert!(StreamingSubscriptionConnection::new(&service, 30).is_ok());
    }

    #[tokio::test]
    async fn opening_requires_a_subscription() {
        let harness = Harness::new(None, &[]);

        assert!(matches!(harness.connection.open(), Err(Error::InvalidOperation(_))));
        assert!(!harness.connection.is_open());
        assert!(matches!(harness.connection.close(), Err(Error::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn subscriptions_are_fixed_while_open() {
        let mut harness = Harness::new(Some(stream::pending().boxed()), &["sub-1", "sub-2"]);
        let connection = &harness.connection;
        let service = connection.inner.service.clone();

        connection.open().unwrap();
        assert!(connection.is_open());
        assert!(matches!(connection.open(), Err(Error::InvalidOperation(_))));
        assert!(connection
            .add_subscription(StreamingSubscription::new(service.clone(), String::from("sub-3")))
            .is_err());
        assert!(connection.remove_subscription("sub-1").is_err());

        connection.close().unwrap();
        assert_eq!(harness.next_event().await, Event::Disconnected(None));

        let connection = &harness.connection;
        assert!(!connection.is_open());
        assert_eq!(connection.remove_subscription("sub-1").unwrap().map(|s| s.id().to_owned()), Some(String::from("sub-1")));
        connection
            .add_subscription(StreamingSubscription::new(service, String::from("sub-3")))
            .unwrap();

        let ids: Vec<_> = connection.subscriptions().iter().map(|s| s.id().to_owned()).collect();
        assert_eq!(ids, ["sub-2", "sub-3"]);

        let requests = harness.requests.lock();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains(
            "<t:SubscriptionId>sub-1</t:SubscriptionId><t:SubscriptionId>sub-2</t:SubscriptionId></m:SubscriptionIds><m:ConnectionTimeout>10</m:ConnectionTimeout>"
        ));
    }

    #[tokio::test]
    async fn batches_are_dispatched_to_observers() {
        let notifications = envelope(
            r#"<m:GetStreamingEventsResponseMessage ResponseClass="Success">
                <m:ResponseCode>NoError</m:ResponseCode>
                <m:Notifications>
                    <m:Notification>
                        <t:SubscriptionId>sub-1</t:SubscriptionId>
                        <t:CreatedEvent><t:TimeStamp>2024-03-01T09:00:00Z</t:TimeStamp><t:ItemId Id="A1"/><t:ParentFolderId Id="F1"/></t:CreatedEvent>
                        <t:NewMailEvent><t:TimeStamp>2024-03-01T09:00:00Z</t:TimeStamp><t:ItemId Id="A1"/><t:ParentFolderId Id="F1"/></t:NewMailEvent>
                    </m:Notification>
                    <m:Notification>
                        <t:SubscriptionId>sub-removed-mid-flight</t:SubscriptionId>
                        <t:CreatedEvent><t:ItemId Id="B1"/><t:ParentFolderId Id="F1"/></t:CreatedEvent>
                    </m:Notification>
                    <m:Notification>
                        <t:SubscriptionId>sub-2</t:SubscriptionId>
                    </m:Notification>
                </m:Notifications>
            </m:GetStreamingEventsResponseMessage>"#,
        );
        let errors = envelope(
            r#"<m:GetStreamingEventsResponseMessage ResponseClass="Error">
                <m:MessageText>Missed notifications.</m:MessageText>
                <m:ResponseCode>ErrorMissedNotificationEvents</m:ResponseCode>
                <m:ErrorSubscriptionIds><m:SubscriptionId>sub-1</m:SubscriptionId></m:ErrorSubscriptionIds>
            </m:GetStreamingEventsResponseMessage>
            <m:GetStreamingEventsResponseMessage ResponseClass="Error">
                <m:MessageText>The subscription has expired.</m:MessageText>
                <m:ResponseCode>ErrorExpiredSubscription</m:ResponseCode>
                <m:ErrorSubscriptionIds><m:SubscriptionId>sub-2</m:SubscriptionId></m:ErrorSubscriptionIds>
            </m:GetStreamingEventsResponseMessage>"#,
        );
        let closed = envelope(
            r#"<m:GetStreamingEventsResponseMessage ResponseClass="Success">
                <m:ResponseCode>NoError</m:ResponseCode>
                <m:ConnectionStatus>Closed</m:ConnectionStatus>
            </m:GetStreamingEventsResponseMessage>"#,
        );

        // Split mid-envelope to exercise reassembly.
        let mut first = notifications;
        let tail = first.split_off(first.len() / 2);
        let mut harness = Harness::new(Some(body(vec![first, tail, errors, closed])), &["sub-1", "sub-2"]);

        harness.connection.open().unwrap();

        assert_eq!(harness.next_event().await, Event::Notification(String::from("sub-1"), 2));
        assert_eq!(
            harness.next_event().await,
            Event::SubscriptionError(String::from("sub-1"), ServiceError::ErrorMissedNotificationEvents)
        );
        assert_eq!(
            harness.next_event().await,
            Event::SubscriptionError(String::from("sub-2"), ServiceError::ErrorExpiredSubscription)
        );
        assert_eq!(harness.next_event().await, Event::Disconnected(None));

        assert_eq!(harness.connection.state(), ConnectionState::Closed);
        let ids: Vec<_> = harness
            .connection
            .subscriptions()
            .iter()
            .map(|s| s.id().to_owned())
            .collect();
        assert_eq!(ids, ["sub-1"]);
    }

    #[tokio::test]
    async fn transport_failures_are_reported_as_disconnects() {
        let mut harness = Harness::new(None, &["sub-1"]);

        // The request fails, but only after `open` has returned.
        harness.connection.open().unwrap();

        match harness.next_event().await {
            Event::Disconnected(Some(error)) => assert!(error.contains("503"), "{error}"),
            event => panic!("unexpected event {event:?}"),
        }
        assert_eq!(harness.connection.state(), ConnectionState::Faulted);
        assert!(!harness.connection.is_open());
        assert!(matches!(harness.connection.close(), Err(Error::InvalidOperation(_))));

        // A faulted connection keeps its subscriptions and can be reopened.
        assert!(harness.connection.remove_subscription("sub-1").unwrap().is_some());
        harness
            .connection
            .add_subscription(StreamingSubscription::new(
                harness.connection.inner.service.clone(),
                String::from("sub-1"),
            ))
            .unwrap();
        assert!(harness.connection.open().is_ok());
        assert_eq!(harness.connection.state(), ConnectionState::Opening);
    }

    #[tokio::test]
    async fn closing_drops_batches_already_received() {
        let notifications = envelope(
            r#"<m:GetStreamingEventsResponseMessage ResponseClass="Success">
                <m:ResponseCode>NoError</m:ResponseCode>
                <m:Notifications>
                    <m:Notification>
                        <t:SubscriptionId>sub-1</t:SubscriptionId>
                        <t:NewMailEvent><t:TimeStamp>2024-03-01T09:00:00Z</t:TimeStamp><t:ItemId Id="A1"/><t:ParentFolderId Id="F1"/></t:NewMailEvent>
                    </m:Notification>
                </m:Notifications>
            </m:GetStreamingEventsResponseMessage>"#,
        );
        let mut harness = Harness::new(
            Some(body(vec![notifications]).chain(stream::pending()).boxed()),
            &["sub-1"],
        );

        // The batch is read before the request notices it was closed.
        harness.connection.open().unwrap();
        harness.connection.close().unwrap();

        assert_eq!(harness.next_event().await, Event::Disconnected(None));
        assert_eq!(harness.connection.state(), ConnectionState::Closed);
        assert!(harness.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_an_open_connection_disconnects() {
        let Harness {
            connection,
            mut events,
            ..
        } = Harness::new(Some(stream::pending().boxed()), &["sub-1"]);

        connection.open().unwrap();
        drop(connection);

        let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
        assert_eq!(event, Some(Event::Disconnected(None)));
    }
}
