/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    complex::{ComplexProperty, PhoneCallId, PhoneCallInformation},
    response::ServiceResponse,
    version::ExchangeVersion,
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error,
};

use super::ServiceRequest;

/// A `GetPhoneCallInformation` request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getphonecallinformation>
pub(crate) struct GetPhoneCallInformation<'a> {
    pub id: &'a PhoneCallId,
}

impl ServiceRequest for GetPhoneCallInformation<'_> {
    fn name(&self) -> &'static str {
        "GetPhoneCallInformation"
    }

    fn minimum_version(&self) -> ExchangeVersion {
        ExchangeVersion::Exchange2010
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.id.write_to_xml(writer, XmlNamespace::Messages, "PhoneCallId")
    }
}

/// Reads a `GetPhoneCallInformationResponse`, which is itself the response
/// message rather than a list of them.
pub(crate) fn read_phone_call_response(reader: &mut EwsXmlReader<'_>) -> Result<PhoneCallInformation, Error> {
    let mut information = PhoneCallInformation::default();
    let response = ServiceResponse::read_from_xml(reader, |reader| {
        if reader.local_name() != "PhoneCallInformation" {
            return Ok(false);
        }

        information.load_from_xml(reader)?;
        Ok(true)
    })?;

    response.into_result()?;

    Ok(information)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        complex::{ConnectionFailureCause, PhoneCallState},
        request::{read_envelope, write_envelope},
    };

    #[test]
    fn call_id_is_an_attribute() {
        let id = PhoneCallId::new("call-7");
        let envelope = write_envelope(&GetPhoneCallInformation { id: &id }, ExchangeVersion::Exchange2010).unwrap();
        let envelope = String::from_utf8(envelope).unwrap();

        assert!(envelope.contains(r#"<m:GetPhoneCallInformation><m:PhoneCallId Id="call-7""#), "{envelope}");
    }

    #[test]
    fn call_state_is_read() {
        let document = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body>
                <m:GetPhoneCallInformationResponse ResponseClass="Success"
                        xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                        xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                    <m:ResponseCode>NoError</m:ResponseCode>
                    <m:PhoneCallInformation>
                        <t:PhoneCallState>Disconnected</t:PhoneCallState>
                        <t:ConnectionFailureCause>UserBusy</t:ConnectionFailureCause>
                        <t:SIPResponseText>Busy Here</t:SIPResponseText>
                        <t:SIPResponseCode>486</t:SIPResponseCode>
                    </m:PhoneCallInformation>
                </m:GetPhoneCallInformationResponse>
            </s:Body>
        </s:Envelope>"#;

        let mut information = None;
        read_envelope(document, |reader| {
            information = Some(read_phone_call_response(reader)?);
            Ok(())
        })
        .unwrap();

        let information = information.unwrap();
        assert_eq!(information.state, PhoneCallState::Disconnected);
        assert_eq!(information.connection_failure_cause, ConnectionFailureCause::UserBusy);
        assert_eq!(information.sip_response_text.as_deref(), Some("Busy Here"));
        assert_eq!(information.sip_response_code, Some(486));
    }
}
