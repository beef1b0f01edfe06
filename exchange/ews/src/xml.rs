/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use xml::{
    common::XmlVersion,
    reader::{self, EventReader, ParserConfig},
    writer::{self, EmitterConfig, EventWriter},
};

pub use ews_derive::XmlEnum;

use crate::Error;

pub const SOAP_NS_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const TYPES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
pub const MESSAGES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
pub const ERRORS_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/errors";
pub const AUTODISCOVER_NS_URI: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover";
pub const WS_ADDRESSING_NS_URI: &str = "http://www.w3.org/2005/08/addressing";
pub const XML_SCHEMA_INSTANCE_NS_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The namespaces an EWS document may use, along with the prefix this crate
/// writes them with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XmlNamespace {
    Soap,
    Types,
    Messages,
    Errors,
    Autodiscover,
    WsAddressing,
    XmlSchemaInstance,
}

impl XmlNamespace {
    const ALL: [XmlNamespace; 7] = [
        Self::Soap,
        Self::Types,
        Self::Messages,
        Self::Errors,
        Self::Autodiscover,
        Self::WsAddressing,
        Self::XmlSchemaInstance,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Soap => "soap",
            Self::Types => "t",
            Self::Messages => "m",
            Self::Errors => "e",
            Self::Autodiscover => "a",
            Self::WsAddressing => "wsa",
            Self::XmlSchemaInstance => "xsi",
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Self::Soap => SOAP_NS_URI,
            Self::Types => TYPES_NS_URI,
            Self::Messages => MESSAGES_NS_URI,
            Self::Errors => ERRORS_NS_URI,
            Self::Autodiscover => AUTODISCOVER_NS_URI,
            Self::WsAddressing => WS_ADDRESSING_NS_URI,
            Self::XmlSchemaInstance => XML_SCHEMA_INSTANCE_NS_URI,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|namespace| namespace.uri() == uri)
    }
}

/// A unit enum with a fixed textual representation in EWS documents.
///
/// Implementations are generated with `#[derive(XmlEnum)]`.
pub trait XmlEnum: Sized + Copy + 'static {
    /// The text of every variant, in declaration order.
    const VARIANTS: &'static [&'static str];

    fn as_xml_str(&self) -> &'static str;

    fn from_xml_str(value: &str) -> Option<Self>;
}

/// A cursor over the nodes of an XML document.
///
/// Methods which consume an element always leave the cursor on that
/// element's end tag, so that loops over sibling elements can simply call
/// [`EwsXmlReader::read`] to move on.
pub struct EwsXmlReader<'a> {
    events: EventReader<&'a [u8]>,
    current: reader::XmlEvent,
}

impl<'a> EwsXmlReader<'a> {
    pub fn new(document: &'a [u8]) -> Self {
        let events = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(false)
            .cdata_to_characters(true)
            .ignore_comments(true)
            .coalesce_characters(true)
            .create_reader(document);

        Self {
            events,
            current: reader::XmlEvent::StartDocument {
                version: XmlVersion::Version10,
                encoding: String::from("utf-8"),
                standalone: None,
            },
        }
    }

    /// Moves to the next node, skipping ignorable whitespace and processing
    /// instructions.
    pub fn read(&mut self) -> Result<(), Error> {
        loop {
            self.read_raw()?;
            if !matches!(self.current, reader::XmlEvent::Whitespace(_)) {
                return Ok(());
            }
        }
    }

    fn read_raw(&mut self) -> Result<(), Error> {
        loop {
            let event = self.events.next()?;
            match event {
                reader::XmlEvent::ProcessingInstruction { .. }
                | reader::XmlEvent::Comment(_)
                | reader::XmlEvent::StartDocument { .. } => continue,
                event => {
                    self.current = event;
                    return Ok(());
                }
            }
        }
    }

    pub fn is_start_element(&self) -> bool {
        matches!(self.current, reader::XmlEvent::StartElement { .. })
    }

    pub fn is_end_element(&self) -> bool {
        matches!(self.current, reader::XmlEvent::EndElement { .. })
    }

    pub fn is_end_of_document(&self) -> bool {
        matches!(self.current, reader::XmlEvent::EndDocument)
    }

    /// The local name of the current element, or an empty string if the
    /// cursor is not on an element.
    pub fn local_name(&self) -> &str {
        match &self.current {
            reader::XmlEvent::StartElement { name, .. } | reader::XmlEvent::EndElement { name } => {
                &name.local_name
            }
            _ => "",
        }
    }

    pub fn namespace(&self) -> Option<XmlNamespace> {
        match &self.current {
            reader::XmlEvent::StartElement { name, .. } | reader::XmlEvent::EndElement { name } => {
                name.namespace.as_deref().and_then(XmlNamespace::from_uri)
            }
            _ => None,
        }
    }

    pub fn is_start_element_named(&self, namespace: XmlNamespace, local_name: &str) -> bool {
        self.is_start_element()
            && self.local_name() == local_name
            && self.namespace() == Some(namespace)
    }

    pub fn is_end_element_named(&self, namespace: XmlNamespace, local_name: &str) -> bool {
        self.is_end_element() && self.local_name() == local_name && self.namespace() == Some(namespace)
    }

    pub fn ensure_start_element(&self, namespace: XmlNamespace, local_name: &str) -> Result<(), Error> {
        if self.is_start_element_named(namespace, local_name) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("start of {}:{local_name}", namespace.prefix())))
        }
    }

    /// Moves to the next node and requires it to be the named start tag.
    pub fn read_start_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<(), Error> {
        self.read()?;
        self.ensure_start_element(namespace, local_name)
    }

    /// Moves forward until the cursor is on the named start tag.
    pub fn read_to_descendant(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<(), Error> {
        loop {
            if self.is_start_element_named(namespace, local_name) {
                return Ok(());
            }
            if self.is_end_of_document() {
                return Err(Error::UnexpectedXml(format!(
                    "document ended before {}:{local_name}",
                    namespace.prefix()
                )));
            }
            self.read()?;
        }
    }

    /// Returns the value of an attribute of the current start tag.
    pub fn read_attribute_value(&self, name: &str) -> Option<&str> {
        match &self.current {
            reader::XmlEvent::StartElement { attributes, .. } => attributes
                .iter()
                .find(|attribute| attribute.name.local_name == name)
                .map(|attribute| attribute.value.as_str()),
            _ => None,
        }
    }

    pub fn read_attribute_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, Error> {
        self.read_attribute_value(name)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| Error::UnexpectedXml(format!("invalid value `{value}` for attribute {name}")))
            })
            .transpose()
    }

    pub fn read_attribute_enum<T: XmlEnum>(&self, name: &str) -> Result<Option<T>, Error> {
        self.read_attribute_value(name)
            .map(|value| {
                T::from_xml_str(value)
                    .ok_or_else(|| Error::UnexpectedXml(format!("invalid value `{value}` for attribute {name}")))
            })
            .transpose()
    }

    pub fn read_attribute_bool(&self, name: &str) -> Result<Option<bool>, Error> {
        self.read_attribute_value(name).map(parse_bool).transpose()
    }

    /// Reads the text content of the current element.
    pub fn read_element_value(&mut self) -> Result<String, Error> {
        if !self.is_start_element() {
            return Err(self.unexpected("start of an element with text content"));
        }

        let mut value = String::new();
        loop {
            self.read_raw()?;
            match &self.current {
                reader::XmlEvent::Characters(text)
                | reader::XmlEvent::Whitespace(text)
                | reader::XmlEvent::CData(text) => value.push_str(text),
                reader::XmlEvent::EndElement { .. } => return Ok(value),
                _ => return Err(self.unexpected("text content")),
            }
        }
    }

    pub fn read_element_value_as<T: FromStr>(&mut self) -> Result<T, Error> {
        let name = self.local_name().to_string();
        let value = self.read_element_value()?;
        value
            .trim()
            .parse()
            .map_err(|_| Error::UnexpectedXml(format!("invalid value `{value}` in element {name}")))
    }

    pub fn read_element_value_as_enum<T: XmlEnum>(&mut self) -> Result<T, Error> {
        let name = self.local_name().to_string();
        let value = self.read_element_value()?;
        T::from_xml_str(value.trim())
            .ok_or_else(|| Error::UnexpectedXml(format!("invalid value `{value}` in element {name}")))
    }

    pub fn read_element_value_as_bool(&mut self) -> Result<bool, Error> {
        let value = self.read_element_value()?;
        parse_bool(&value)
    }

    pub fn read_element_value_as_date_time(&mut self) -> Result<DateTime<Utc>, Error> {
        let value = self.read_element_value()?;
        parse_date_time(&value)
    }

    pub fn read_element_value_as_date(&mut self) -> Result<NaiveDate, Error> {
        let value = self.read_element_value()?;
        parse_date(&value)
    }

    pub fn read_element_value_as_duration(&mut self) -> Result<TimeDelta, Error> {
        let value = self.read_element_value()?;
        parse_duration(&value)
    }

    pub fn read_element_value_as_base64(&mut self) -> Result<Vec<u8>, Error> {
        let value = self.read_element_value()?;
        BASE64
            .decode(value.trim())
            .map_err(|err| Error::UnexpectedXml(format!("invalid base64 content: {err}")))
    }

    /// Reads past the current element and everything it contains.
    pub fn skip_current_element(&mut self) -> Result<(), Error> {
        if !self.is_start_element() {
            return Ok(());
        }

        let mut depth = 1usize;
        while depth > 0 {
            self.read_raw()?;
            match self.current {
                reader::XmlEvent::StartElement { .. } => depth += 1,
                reader::XmlEvent::EndElement { .. } => depth -= 1,
                reader::XmlEvent::EndDocument => {
                    return Err(Error::UnexpectedXml(String::from(
                        "document ended inside an element",
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Calls `read_child` once for each child element of the current
    /// element. The callback is positioned on the child's start tag and must
    /// consume the child entirely.
    pub fn read_children<F>(&mut self, mut read_child: F) -> Result<(), Error>
    where
        F: FnMut(&mut Self) -> Result<(), Error>,
    {
        if !self.is_start_element() {
            return Err(self.unexpected("start of an element"));
        }

        loop {
            self.read()?;
            match self.current {
                reader::XmlEvent::StartElement { .. } => read_child(self)?,
                reader::XmlEvent::EndElement { .. } => return Ok(()),
                reader::XmlEvent::EndDocument => {
                    return Err(Error::UnexpectedXml(String::from(
                        "document ended inside an element",
                    )))
                }
                _ => {}
            }
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match &self.current {
            reader::XmlEvent::StartElement { name, .. } => format!("start of {}", name.local_name),
            reader::XmlEvent::EndElement { name } => format!("end of {}", name.local_name),
            reader::XmlEvent::EndDocument => String::from("end of document"),
            reader::XmlEvent::Characters(_) => String::from("text"),
            other => format!("{other:?}"),
        };

        Error::UnexpectedXml(format!("expected {expected}, found {found}"))
    }
}

/// Writes an EWS document element by element.
///
/// A start tag is held back until the next child, text or end tag is
/// written, so that attributes may be added after the element has been
/// started. The outermost element declares every EWS namespace prefix.
pub struct EwsXmlWriter {
    inner: EventWriter<Vec<u8>>,
    pending: Option<PendingElement>,
    depth: usize,
}

struct PendingElement {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Default for EwsXmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EwsXmlWriter {
    pub fn new() -> Self {
        let inner = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false)
            .pad_self_closing(false)
            .create_writer(Vec::new());

        Self {
            inner,
            pending: None,
            depth: 0,
        }
    }

    /// Writes the XML declaration. Must precede any element.
    pub fn write_start_document(&mut self) -> Result<(), Error> {
        self.inner.write(writer::XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("utf-8"),
            standalone: None,
        })?;

        Ok(())
    }

    pub fn write_start_element(&mut self, namespace: XmlNamespace, local_name: &str) -> Result<(), Error> {
        self.flush_pending()?;
        self.pending = Some(PendingElement {
            name: format!("{}:{local_name}", namespace.prefix()),
            attributes: Vec::new(),
        });

        Ok(())
    }

    /// Adds an attribute to the element most recently started.
    pub fn write_attribute_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), Error> {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.attributes.push((name.to_string(), value.into()));
                Ok(())
            }
            None => Err(Error::UnexpectedXml(format!(
                "attribute {name} written outside of a start tag"
            ))),
        }
    }

    pub fn write_attribute_enum<T: XmlEnum>(&mut self, name: &str, value: T) -> Result<(), Error> {
        self.write_attribute_value(name, value.as_xml_str())
    }

    pub fn write_value(&mut self, value: &str) -> Result<(), Error> {
        self.flush_pending()?;
        self.inner.write(writer::XmlEvent::characters(value))?;

        Ok(())
    }

    pub fn write_end_element(&mut self) -> Result<(), Error> {
        self.flush_pending()?;
        self.inner.write(writer::XmlEvent::end_element())?;
        self.depth = self.depth.saturating_sub(1);

        Ok(())
    }

    /// Writes `<prefix:name>value</prefix:name>`.
    pub fn write_element_value(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: &str,
    ) -> Result<(), Error> {
        self.write_start_element(namespace, local_name)?;
        self.write_value(value)?;
        self.write_end_element()
    }

    pub fn write_element_enum<T: XmlEnum>(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: T,
    ) -> Result<(), Error> {
        self.write_element_value(namespace, local_name, value.as_xml_str())
    }

    pub fn write_element_bool(&mut self, namespace: XmlNamespace, local_name: &str, value: bool) -> Result<(), Error> {
        self.write_element_value(namespace, local_name, if value { "true" } else { "false" })
    }

    pub fn write_element_date_time(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: &DateTime<Utc>,
    ) -> Result<(), Error> {
        self.write_element_value(namespace, local_name, &format_date_time(value))
    }

    pub fn write_element_date(&mut self, namespace: XmlNamespace, local_name: &str, value: &NaiveDate) -> Result<(), Error> {
        self.write_element_value(namespace, local_name, &value.format("%Y-%m-%d").to_string())
    }

    pub fn write_element_duration(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: &TimeDelta,
    ) -> Result<(), Error> {
        self.write_element_value(namespace, local_name, &format_duration(value))
    }

    pub fn write_base64_value(&mut self, value: &[u8]) -> Result<(), Error> {
        self.write_value(&BASE64.encode(value))
    }

    /// Consumes the writer, returning the document written so far.
    pub fn into_inner(mut self) -> Result<Vec<u8>, Error> {
        self.flush_pending()?;

        Ok(self.inner.into_inner())
    }

    fn flush_pending(&mut self) -> Result<(), Error> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let mut builder = writer::XmlEvent::start_element(pending.name.as_str());
        if self.depth == 0 {
            for namespace in XmlNamespace::ALL {
                builder = builder.ns(namespace.prefix(), namespace.uri());
            }
        }
        for (name, value) in &pending.attributes {
            builder = builder.attr(name.as_str(), value.as_str());
        }

        self.inner.write(builder)?;
        self.depth += 1;

        Ok(())
    }
}

pub(crate) fn parse_bool(value: &str) -> Result<bool, Error> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::UnexpectedXml(format!("invalid boolean `{other}`"))),
    }
}

/// Parses an `xs:dateTime`. Values without a zone designator are taken to be
/// UTC, which is how Exchange reports them.
pub(crate) fn parse_date_time(value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Ok(date_time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::UnexpectedXml(format!("invalid date/time `{value}`")))
}

pub(crate) fn format_date_time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parses an `xs:date`, ignoring any zone designator.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    let value = value.trim();
    value
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .ok_or_else(|| Error::UnexpectedXml(format!("invalid date `{value}`")))
}

/// Parses the subset of `xs:duration` Exchange uses for time zone offsets,
/// e.g. `-PT8H` or `PT1H30M`.
pub(crate) fn parse_duration(value: &str) -> Result<TimeDelta, Error> {
    let invalid = || Error::UnexpectedXml(format!("invalid duration `{value}`"));

    let trimmed = value.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;

    let mut seconds = 0i64;
    let mut in_time = false;
    let mut number = String::new();
    for character in rest.chars() {
        match character {
            'T' => in_time = true,
            '0'..='9' => number.push(character),
            unit => {
                let amount: i64 = number.parse().map_err(|_| invalid())?;
                number.clear();
                seconds += match (unit, in_time) {
                    ('D', false) => amount * 86_400,
                    ('H', true) => amount * 3_600,
                    ('M', true) => amount * 60,
                    ('S', true) => amount,
                    _ => return Err(invalid()),
                };
            }
        }
    }
    if !number.is_empty() {
        return Err(invalid());
    }

    let duration = TimeDelta::seconds(seconds);
    Ok(if negative { -duration } else { duration })
}

pub(crate) fn format_duration(value: &TimeDelta) -> String {
    let total = value.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();

    let (hours, minutes, seconds) = (total / 3_600, (total % 3_600) / 60, total % 60);
    let mut formatted = format!("{sign}PT");
    if hours > 0 {
        formatted.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        formatted.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 || (hours == 0 && minutes == 0) {
        formatted.push_str(&format!("{seconds}S"));
    }

    formatted
}
