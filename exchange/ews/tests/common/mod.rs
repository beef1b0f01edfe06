/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use ews::{
    net::{ResponseStream, SoapRequest, Transport},
    Error, ExchangeService, ExchangeVersion,
};
use futures::{stream, StreamExt};
use parking_lot::Mutex;

/// A transport answering each request with the next canned response, and
/// streaming requests with the next canned list of chunks.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<String>>,
    streams: Mutex<VecDeque<Vec<String>>>,
    requests: Requests,
}

/// The bodies of the requests a [`MockTransport`] has received.
#[derive(Clone, Default)]
pub struct Requests(Arc<Mutex<Vec<String>>>);

impl Requests {
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn get(&self, index: usize) -> String {
        self.0.lock()[index].clone()
    }

    pub fn last(&self) -> String {
        self.0.lock().last().cloned().expect("no request was sent")
    }

    fn record(&self, request: &SoapRequest) {
        self.0
            .lock()
            .push(String::from_utf8(request.body.clone()).expect("request is not UTF-8"));
    }
}

impl MockTransport {
    pub fn respond(self, body: &str) -> Self {
        self.responses.lock().push_back(envelope(body));
        self
    }

    pub fn respond_raw(self, document: &str) -> Self {
        self.responses.lock().push_back(document.to_owned());
        self
    }

    pub fn stream(self, chunks: Vec<String>) -> Self {
        self.streams.lock().push_back(chunks);
        self
    }

    pub fn into_service(self, version: ExchangeVersion) -> (ExchangeService, Requests) {
        let requests = self.requests.clone();
        let service = ExchangeService::builder()
            .url("https://mail.example.com/EWS/Exchange.asmx")
            .version(version)
            .transport(self)
            .build()
            .expect("service should build");

        (service, requests)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: SoapRequest) -> Result<Vec<u8>, Error> {
        self.requests.record(&request);

        self.responses
            .lock()
            .pop_front()
            .map(String::into_bytes)
            .ok_or(Error::HttpStatus(404))
    }

    async fn send_streaming(&self, request: SoapRequest) -> Result<ResponseStream, Error> {
        self.requests.record(&request);

        let chunks = self.streams.lock().pop_front().ok_or(Error::HttpStatus(404))?;
        Ok(stream::iter(chunks.into_iter().map(|chunk| Ok(chunk.into_bytes()))).boxed())
    }
}

/// Wraps a response body in an envelope from an Exchange 2013 server.
pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
    <s:Header>
        <h:ServerVersionInfo MajorVersion="15" MinorVersion="0" MajorBuildNumber="1497" MinorBuildNumber="2"
            Version="V2017_07_11" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/>
    </s:Header>
    <s:Body xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
            xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
        {body}
    </s:Body>
</s:Envelope>"#
    )
}

/// A successful response message of the given operation, e.g.
/// `CreateItemResponseMessage`, around `contents`.
pub fn success(message: &str, contents: &str) -> String {
    format!(
        r#"<m:{message} ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode>{contents}</m:{message}>"#
    )
}

pub fn response(operation: &str, messages: &[String]) -> String {
    format!(
        "<m:{operation}Response><m:ResponseMessages>{}</m:ResponseMessages></m:{operation}Response>",
        messages.concat()
    )
}
