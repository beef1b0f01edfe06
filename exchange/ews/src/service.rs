/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    complex::{PhoneCallId, PhoneCallInformation, SearchFilter},
    net::{Credentials, HttpTransport, ResponseStream, SoapRequest, Transport, OFFICE365_ENDPOINT},
    property::{PropertyBag, PropertySet},
    request::{
        into_single_result, read_envelope, read_find_item_response, read_get_response, read_phone_call_response,
        read_response_messages, read_saved_objects_response, read_subscribe_response, write_envelope,
        CreateObjects, DeleteObjects, FindItem, FindItemsResults, GetObjects, GetPhoneCallInformation, ItemView,
        ServerVersionInfo, ServiceRequest, SubscribeToStreamingNotifications, Unsubscribe, UpdateObjects,
    },
    response::ServiceResponse,
    schema::ObjectKind,
    streaming::StreamingSubscription,
    types::{
        AffectedTaskOccurrences, ConflictResolutionMode, DeleteMode, EventType, FolderIdentifier,
        MessageDisposition, SendCancellationsMode, SendInvitationsMode, SendInvitationsOrCancellationsMode,
        ServiceObjectId,
    },
    version::ExchangeVersion,
    xml::EwsXmlReader,
    Error, Item,
};

/// How long to wait for a response by default.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// A connection to one EWS endpoint on behalf of one user.
///
/// Cloning a service is cheap; clones share the transport and the server
/// version last reported by the server.
#[derive(Clone)]
pub struct ExchangeService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    url: String,
    version: ExchangeVersion,
    transport: Box<dyn Transport>,
    credentials: Option<Box<dyn Credentials>>,
    server_version: Mutex<Option<ServerVersionInfo>>,
}

impl fmt::Debug for ExchangeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeService")
            .field("url", &self.inner.url)
            .field("version", &self.inner.version)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

/// Configures an [`ExchangeService`].
pub struct ExchangeServiceBuilder {
    url: String,
    version: ExchangeVersion,
    transport: Option<Box<dyn Transport>>,
    credentials: Option<Box<dyn Credentials>>,
    timeout: Duration,
}

impl ExchangeServiceBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn version(mut self, version: ExchangeVersion) -> Self {
        self.version = version;
        self
    }

    /// Replaces the default HTTPS transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn credentials(mut self, credentials: impl Credentials + 'static) -> Self {
        self.credentials = Some(Box::new(credentials));
        self
    }

    /// Sets the timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ExchangeService, Error> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new(self.timeout)?),
        };

        Ok(ExchangeService {
            inner: Arc::new(ServiceInner {
                url: self.url,
                version: self.version,
                transport,
                credentials: self.credentials,
                server_version: Mutex::new(None),
            }),
        })
    }
}

impl ExchangeService {
    pub fn builder() -> ExchangeServiceBuilder {
        ExchangeServiceBuilder {
            url: String::from(OFFICE365_ENDPOINT),
            version: ExchangeVersion::default(),
            transport: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The schema version requests are written for.
    pub fn version(&self) -> ExchangeVersion {
        self.inner.version
    }

    /// The server's version, as reported in the most recent response.
    pub fn server_version(&self) -> Option<ServerVersionInfo> {
        self.inner.server_version.lock().clone()
    }

    /// Writes `request` into an envelope ready to send, after checking it
    /// against the service's version.
    pub(crate) fn prepare<R>(&self, request: &R) -> Result<SoapRequest, Error>
    where
        R: ServiceRequest + ?Sized,
    {
        debug!(operation = request.name(), version = %self.inner.version, "preparing request");

        let mut body = write_envelope(request, self.inner.version)?;
        let mut authorization = None;
        if let Some(credentials) = &self.inner.credentials {
            body = credentials.sign_envelope(body)?;
            authorization = credentials.authorization();
        }

        Ok(SoapRequest {
            url: self.inner.url.clone(),
            body,
            authorization,
            timeout: None,
        })
    }

    pub(crate) async fn send(&self, request: SoapRequest) -> Result<Vec<u8>, Error> {
        self.inner.transport.send(request).await
    }

    pub(crate) async fn send_streaming(&self, request: SoapRequest) -> Result<ResponseStream, Error> {
        self.inner.transport.send_streaming(request).await
    }

    /// Reads a response envelope, remembering the server version it reports.
    pub(crate) fn read_response<F>(&self, document: &[u8], read_body: F) -> Result<(), Error>
    where
        F: FnMut(&mut EwsXmlReader<'_>) -> Result<(), Error>,
    {
        if let Some(server_version) = read_envelope(document, read_body)? {
            *self.inner.server_version.lock() = Some(server_version);
        }

        Ok(())
    }

    /// Creates the objects held by `bags`, merging the identifiers the server
    /// assigns back into them.
    pub(crate) async fn create_objects(
        &self,
        bags: &mut [PropertyBag],
        parent_folder: Option<&FolderIdentifier>,
        message_disposition: Option<MessageDisposition>,
        send_meeting_invitations: Option<SendInvitationsMode>,
    ) -> Result<Vec<ServiceResponse>, Error> {
        let kind = bags.first().map_or(ObjectKind::Item, |bag| bag.object_type().kind());
        let request = self.prepare(&CreateObjects {
            kind,
            bags,
            parent_folder,
            message_disposition,
            send_meeting_invitations,
        })?;

        let document = self.send(request).await?;

        let mut responses = Vec::new();
        self.read_response(&document, |reader| {
            responses = read_saved_objects_response(reader, kind, bags)?;
            Ok(())
        })?;

        Ok(responses)
    }

    pub(crate) async fn get_objects(
        &self,
        kind: ObjectKind,
        ids: &[ServiceObjectId],
        property_set: &PropertySet,
    ) -> Result<Vec<Result<PropertyBag, Error>>, Error> {
        let request = self.prepare(&GetObjects {
            kind,
            ids,
            property_set,
        })?;

        let document = self.send(request).await?;

        let mut results = Vec::new();
        self.read_response(&document, |reader| {
            results = read_get_response(reader, kind, property_set, self.inner.version)?;
            Ok(())
        })?;

        Ok(results)
    }

    /// Sends the changes recorded in `bags`, merging the new change keys the
    /// server returns back into them.
    pub(crate) async fn update_objects(
        &self,
        bags: &mut [PropertyBag],
        conflict_resolution: ConflictResolutionMode,
        message_disposition: Option<MessageDisposition>,
        send_invitations_or_cancellations: Option<SendInvitationsOrCancellationsMode>,
    ) -> Result<Vec<ServiceResponse>, Error> {
        let kind = bags.first().map_or(ObjectKind::Item, |bag| bag.object_type().kind());
        let request = self.prepare(&UpdateObjects {
            kind,
            bags,
            conflict_resolution,
            message_disposition,
            send_invitations_or_cancellations,
            saved_item_folder: None,
        })?;

        let document = self.send(request).await?;

        let mut responses = Vec::new();
        self.read_response(&document, |reader| {
            responses = read_saved_objects_response(reader, kind, bags)?;
            Ok(())
        })?;

        Ok(responses)
    }

    pub(crate) async fn delete_objects(
        &self,
        kind: ObjectKind,
        ids: &[ServiceObjectId],
        delete_mode: DeleteMode,
        send_cancellations: Option<SendCancellationsMode>,
        affected_task_occurrences: Option<AffectedTaskOccurrences>,
    ) -> Result<Vec<ServiceResponse>, Error> {
        let request = self.prepare(&DeleteObjects {
            kind,
            ids,
            delete_mode,
            send_cancellations,
            affected_task_occurrences,
        })?;

        let document = self.send(request).await?;

        let mut responses = Vec::new();
        self.read_response(&document, |reader| {
            responses = read_response_messages(reader, |_, _| Ok(false))?;
            Ok(())
        })?;

        Ok(responses)
    }

    /// Fetches several items at once. Each result corresponds to the id at
    /// the same position; an id the server couldn't resolve yields an error
    /// without failing the others.
    pub async fn get_items(
        &self,
        ids: &[ServiceObjectId],
        property_set: &PropertySet,
    ) -> Result<Vec<Result<Item, Error>>, Error> {
        let results = self.get_objects(ObjectKind::Item, ids, property_set).await?;

        Ok(results
            .into_iter()
            .map(|result| result.and_then(|bag| Item::from_bag(self.clone(), bag)))
            .collect())
    }

    /// Deletes several items at once, returning one response per id.
    pub async fn delete_items(
        &self,
        ids: &[ServiceObjectId],
        delete_mode: DeleteMode,
        send_cancellations: Option<SendCancellationsMode>,
        affected_task_occurrences: Option<AffectedTaskOccurrences>,
    ) -> Result<Vec<ServiceResponse>, Error> {
        self.delete_objects(
            ObjectKind::Item,
            ids,
            delete_mode,
            send_cancellations,
            affected_task_occurrences,
        )
        .await
    }

    /// Searches a folder for items, one page at a time.
    pub async fn find_items(
        &self,
        parent_folder: impl Into<FolderIdentifier>,
        view: &ItemView,
        restriction: Option<&SearchFilter>,
    ) -> Result<FindItemsResults<Item>, Error> {
        let parent_folders = [parent_folder.into()];
        let request = self.prepare(&FindItem {
            parent_folders: &parent_folders,
            view,
            restriction,
        })?;

        let document = self.send(request).await?;

        let mut results = None;
        self.read_response(&document, |reader| {
            results = Some(read_find_item_response(reader, view, self.inner.version)?);
            Ok(())
        })?;

        let results =
            results.ok_or_else(|| Error::UnexpectedXml(String::from("the response contained no FindItem response")))?;
        let items = results
            .items
            .into_iter()
            .map(|bag| Item::from_bag(self.clone(), bag))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FindItemsResults {
            items,
            total_count: results.total_count,
            more_available: results.more_available,
            next_page_offset: results.next_page_offset,
        })
    }

    /// Subscribes to events in `folders`, or in the whole mailbox if
    /// `folders` is empty. Events are delivered once the subscription is
    /// added to a [`crate::streaming::StreamingSubscriptionConnection`].
    pub async fn subscribe_to_streaming_notifications(
        &self,
        folders: &[FolderIdentifier],
        event_types: &[EventType],
    ) -> Result<StreamingSubscription, Error> {
        let request = self.prepare(&SubscribeToStreamingNotifications { folders, event_types })?;

        let document = self.send(request).await?;

        let mut subscription_id = None;
        self.read_response(&document, |reader| {
            subscription_id = Some(read_subscribe_response(reader)?);
            Ok(())
        })?;

        let id = subscription_id
            .ok_or_else(|| Error::UnexpectedXml(String::from("the response contained no Subscribe response")))?;
        debug!(subscription_id = %id, "subscribed to streaming notifications");

        Ok(StreamingSubscription::new(self.clone(), id))
    }

    pub(crate) async fn unsubscribe(&self, subscription_id: &str) -> Result<(), Error> {
        let request = self.prepare(&Unsubscribe { subscription_id })?;

        let document = self.send(request).await?;

        let mut responses = Vec::new();
        self.read_response(&document, |reader| {
            responses = read_response_messages(reader, |_, _| Ok(false))?;
            Ok(())
        })?;

        into_single_result(responses)
    }

    /// Looks up the state of a call placed through Unified Messaging.
    pub async fn get_phone_call_information(&self, id: &PhoneCallId) -> Result<PhoneCallInformation, Error> {
        let request = self.prepare(&GetPhoneCallInformation { id })?;

        let document = self.send(request).await?;

        let mut information = None;
        self.read_response(&document, |reader| {
            information = Some(read_phone_call_response(reader)?);
            Ok(())
        })?;

        information.ok_or_else(|| {
            Error::UnexpectedXml(String::from("the response contained no GetPhoneCallInformation response"))
        })
    }
}
