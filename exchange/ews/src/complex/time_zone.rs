/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace},
    Error, ValidationError,
};

use super::{ComplexProperty, DayOfTheWeek};

/// A span of time during which a time zone has a fixed offset from UTC.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/period>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeZonePeriod {
    pub id: String,
    pub name: String,

    /// The offset to add to local time to get UTC, i.e. `PT8H` for UTC-8.
    pub bias: TimeDelta,
}

impl TimeZonePeriod {
    fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, Error> {
        let period = Self {
            id: reader.read_attribute_value("Id").unwrap_or_default().to_string(),
            name: reader.read_attribute_value("Name").unwrap_or_default().to_string(),
            bias: reader
                .read_attribute_value("Bias")
                .map(crate::xml::parse_duration)
                .transpose()?
                .unwrap_or_default(),
        };
        reader.skip_current_element()?;

        Ok(period)
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, "Period")?;
        writer.write_attribute_value("Bias", crate::xml::format_duration(&self.bias))?;
        writer.write_attribute_value("Name", self.name.as_str())?;
        writer.write_attribute_value("Id", self.id.as_str())?;
        writer.write_end_element()
    }
}

/// What a transition moves the time zone into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionTarget {
    Period(String),
    Group(String),
}

impl TransitionTarget {
    fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, Error> {
        let is_group = reader.read_attribute_value("Kind") == Some("Group");
        let id = reader.read_element_value()?;

        Ok(if is_group { Self::Group(id) } else { Self::Period(id) })
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        let (kind, id) = match self {
            Self::Period(id) => ("Period", id),
            Self::Group(id) => ("Group", id),
        };

        writer.write_start_element(XmlNamespace::Types, "To")?;
        writer.write_attribute_value("Kind", kind)?;
        writer.write_value(id)?;
        writer.write_end_element()
    }
}

/// A change from one period or transition group to another.
///
/// The variant is chosen from the transition element's name; see
/// [`TimeZoneTransition::create_from_xml`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeZoneTransition {
    Transition {
        to: Option<TransitionTarget>,
    },
    AbsoluteDate {
        to: Option<TransitionTarget>,
        date_time: Option<NaiveDateTime>,
    },
    RecurringDay {
        to: Option<TransitionTarget>,
        time_offset: TimeDelta,
        month: u32,
        day_of_week: Option<DayOfTheWeek>,

        /// Which occurrence of the day in the month; `-1` is the last.
        occurrence: i32,
    },
    RecurringDate {
        to: Option<TransitionTarget>,
        time_offset: TimeDelta,
        month: u32,
        day: u32,
    },
}

impl TimeZoneTransition {
    pub fn to_period(id: impl Into<String>) -> Self {
        Self::Transition {
            to: Some(TransitionTarget::Period(id.into())),
        }
    }

    pub fn to_group(id: impl Into<String>) -> Self {
        Self::Transition {
            to: Some(TransitionTarget::Group(id.into())),
        }
    }

    pub fn create_from_xml(element_name: &str) -> Option<Self> {
        let transition = match element_name {
            "Transition" => Self::Transition { to: None },
            "AbsoluteDateTransition" => Self::AbsoluteDate {
                to: None,
                date_time: None,
            },
            "RecurringDayTransition" => Self::RecurringDay {
                to: None,
                time_offset: TimeDelta::zero(),
                month: 0,
                day_of_week: None,
                occurrence: 0,
            },
            "RecurringDateTransition" => Self::RecurringDate {
                to: None,
                time_offset: TimeDelta::zero(),
                month: 0,
                day: 0,
            },
            _ => return None,
        };

        Some(transition)
    }

    pub fn xml_element_name(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "Transition",
            Self::AbsoluteDate { .. } => "AbsoluteDateTransition",
            Self::RecurringDay { .. } => "RecurringDayTransition",
            Self::RecurringDate { .. } => "RecurringDateTransition",
        }
    }

    pub fn target(&self) -> Option<&TransitionTarget> {
        match self {
            Self::Transition { to }
            | Self::AbsoluteDate { to, .. }
            | Self::RecurringDay { to, .. }
            | Self::RecurringDate { to, .. } => to.as_ref(),
        }
    }

    fn target_mut(&mut self) -> &mut Option<TransitionTarget> {
        match self {
            Self::Transition { to }
            | Self::AbsoluteDate { to, .. }
            | Self::RecurringDay { to, .. }
            | Self::RecurringDate { to, .. } => to,
        }
    }

    fn is_recurring(&self) -> bool {
        matches!(self, Self::RecurringDay { .. } | Self::RecurringDate { .. })
    }

    fn read_list(reader: &mut EwsXmlReader<'_>) -> Result<Vec<Self>, Error> {
        let mut transitions = Vec::new();
        reader.read_children(|reader| {
            match TimeZoneTransition::create_from_xml(reader.local_name()) {
                Some(mut transition) => {
                    transition.load_from_xml(reader)?;
                    transitions.push(transition);
                }
                None => reader.skip_current_element()?,
            }

            Ok(())
        })?;

        Ok(transitions)
    }
}

impl ComplexProperty for TimeZoneTransition {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        if reader.local_name() == "To" {
            *self.target_mut() = Some(TransitionTarget::read_from_xml(reader)?);
            return Ok(true);
        }

        match self {
            Self::Transition { .. } => return Ok(false),
            Self::AbsoluteDate { date_time, .. } => {
                if reader.local_name() != "DateTime" {
                    return Ok(false);
                }
                let value = reader.read_element_value()?;
                let parsed = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S")
                    .map_err(|_| Error::UnexpectedXml(format!("invalid transition date/time `{value}`")))?;
                *date_time = Some(parsed);
            }
            Self::RecurringDay {
                time_offset,
                month,
                day_of_week,
                occurrence,
                ..
            } => match reader.local_name() {
                "TimeOffset" => *time_offset = reader.read_element_value_as_duration()?,
                "Month" => *month = reader.read_element_value_as()?,
                "DayOfWeek" => *day_of_week = Some(reader.read_element_value_as_enum()?),
                "Occurrence" => *occurrence = reader.read_element_value_as()?,
                _ => return Ok(false),
            },
            Self::RecurringDate {
                time_offset,
                month,
                day,
                ..
            } => match reader.local_name() {
                "TimeOffset" => *time_offset = reader.read_element_value_as_duration()?,
                "Month" => *month = reader.read_element_value_as()?,
                "Day" => *day = reader.read_element_value_as()?,
                _ => return Ok(false),
            },
        }

        Ok(true)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(target) = self.target() {
            target.write_to_xml(writer)?;
        }

        match self {
            Self::Transition { .. } => Ok(()),
            Self::AbsoluteDate { date_time, .. } => match date_time {
                Some(date_time) => writer.write_element_value(
                    XmlNamespace::Types,
                    "DateTime",
                    &date_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
                ),
                None => Ok(()),
            },
            Self::RecurringDay {
                time_offset,
                month,
                day_of_week,
                occurrence,
                ..
            } => {
                writer.write_element_duration(XmlNamespace::Types, "TimeOffset", time_offset)?;
                writer.write_element_value(XmlNamespace::Types, "Month", &month.to_string())?;
                if let Some(day_of_week) = day_of_week {
                    writer.write_element_enum(XmlNamespace::Types, "DayOfWeek", *day_of_week)?;
                }
                writer.write_element_value(XmlNamespace::Types, "Occurrence", &occurrence.to_string())
            }
            Self::RecurringDate {
                time_offset,
                month,
                day,
                ..
            } => {
                writer.write_element_duration(XmlNamespace::Types, "TimeOffset", time_offset)?;
                writer.write_element_value(XmlNamespace::Types, "Month", &month.to_string())?;
                writer.write_element_value(XmlNamespace::Types, "Day", &day.to_string())
            }
        }
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        if self.target().is_none() {
            return Err(ValidationError::FieldNotSpecified("To"));
        }

        match self {
            Self::AbsoluteDate { date_time: None, .. } => Err(ValidationError::FieldNotSpecified("DateTime")),
            Self::RecurringDay { month, .. } | Self::RecurringDate { month, .. } if !(1..=12).contains(month) => {
                Err(ValidationError::InvalidTimeZoneDefinition(
                    "a recurring transition must name a month between 1 and 12",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// A set of transitions that together describe a yearly cycle, such as the
/// switch into and out of daylight saving time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeZoneTransitionGroup {
    pub id: String,
    pub transitions: Vec<TimeZoneTransition>,
}

impl TimeZoneTransitionGroup {
    fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self, Error> {
        let id = reader.read_attribute_value("Id").unwrap_or_default().to_string();
        let transitions = TimeZoneTransition::read_list(reader)?;

        Ok(Self { id, transitions })
    }

    fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, "TransitionsGroup")?;
        writer.write_attribute_value("Id", self.id.as_str())?;
        for transition in &self.transitions {
            transition.write_to_xml(writer, XmlNamespace::Types, transition.xml_element_name())?;
        }
        writer.write_end_element()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self.transitions.as_slice() {
            [] => Err(ValidationError::InvalidTimeZoneDefinition(
                "a transition group must contain at least one transition",
            )),
            [single] => single.validate(),
            [first, second] => {
                if !(first.is_recurring() && second.is_recurring()) {
                    return Err(ValidationError::InvalidTimeZoneDefinition(
                        "a transition group with two transitions must only contain recurring transitions",
                    ));
                }
                first.validate()?;
                second.validate()
            }
            _ => Err(ValidationError::InvalidTimeZoneDefinition(
                "a transition group may contain at most two transitions",
            )),
        }
    }
}

/// A full description of a time zone's offsets and transitions.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/starttimezone>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeZoneDefinition {
    pub id: String,
    pub name: Option<String>,
    pub periods: Vec<TimeZonePeriod>,
    pub transition_groups: Vec<TimeZoneTransitionGroup>,
    pub transitions: Vec<TimeZoneTransition>,
}

impl TimeZoneDefinition {
    /// A time zone with a single, fixed offset from UTC.
    pub fn fixed(id: impl Into<String>, name: impl Into<String>, bias: TimeDelta) -> Self {
        let id = id.into();
        let period_id = format!("{id}/Standard");

        Self {
            name: Some(name.into()),
            periods: vec![TimeZonePeriod {
                id: period_id.clone(),
                name: String::from("Standard"),
                bias,
            }],
            transition_groups: Vec::new(),
            transitions: vec![TimeZoneTransition::to_period(period_id)],
            id,
        }
    }

    pub fn utc() -> Self {
        Self::fixed("UTC", "(UTC) Coordinated Universal Time", TimeDelta::zero())
    }

    fn has_period(&self, id: &str) -> bool {
        self.periods.iter().any(|period| period.id == id)
    }

    fn has_group(&self, id: &str) -> bool {
        self.transition_groups.iter().any(|group| group.id == id)
    }

    fn validate_target(&self, transition: &TimeZoneTransition) -> Result<(), ValidationError> {
        match transition.target() {
            Some(TransitionTarget::Period(id)) if !self.has_period(id) => Err(
                ValidationError::InvalidTimeZoneDefinition("a transition refers to an unknown period"),
            ),
            Some(TransitionTarget::Group(id)) if !self.has_group(id) => Err(
                ValidationError::InvalidTimeZoneDefinition("a transition refers to an unknown transition group"),
            ),
            _ => Ok(()),
        }
    }
}

impl ComplexProperty for TimeZoneDefinition {
    fn read_attributes_from_xml(&mut self, reader: &EwsXmlReader<'_>) -> Result<(), Error> {
        self.id = reader.read_attribute_value("Id").unwrap_or_default().to_string();
        self.name = reader.read_attribute_value("Name").map(str::to_string);

        Ok(())
    }

    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "Periods" => {
                let mut periods = Vec::new();
                reader.read_children(|reader| {
                    if reader.local_name() == "Period" {
                        periods.push(TimeZonePeriod::read_from_xml(reader)?);
                        Ok(())
                    } else {
                        reader.skip_current_element()
                    }
                })?;
                self.periods = periods;
            }
            "TransitionsGroups" => {
                let mut groups = Vec::new();
                reader.read_children(|reader| {
                    if reader.local_name() == "TransitionsGroup" {
                        groups.push(TimeZoneTransitionGroup::read_from_xml(reader)?);
                        Ok(())
                    } else {
                        reader.skip_current_element()
                    }
                })?;
                self.transition_groups = groups;
            }
            "Transitions" => self.transitions = TimeZoneTransition::read_list(reader)?,
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_attributes_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_attribute_value("Id", self.id.as_str())?;
        if let Some(name) = &self.name {
            writer.write_attribute_value("Name", name.as_str())?;
        }

        Ok(())
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        writer.write_start_element(XmlNamespace::Types, "Periods")?;
        for period in &self.periods {
            period.write_to_xml(writer)?;
        }
        writer.write_end_element()?;

        if !self.transition_groups.is_empty() {
            writer.write_start_element(XmlNamespace::Types, "TransitionsGroups")?;
            for group in &self.transition_groups {
                group.write_to_xml(writer)?;
            }
            writer.write_end_element()?;
        }

        writer.write_start_element(XmlNamespace::Types, "Transitions")?;
        for transition in &self.transitions {
            transition.write_to_xml(writer, XmlNamespace::Types, transition.xml_element_name())?;
        }
        writer.write_end_element()
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::FieldNotSpecified("Id"));
        }
        if self.periods.is_empty() {
            return Err(ValidationError::InvalidTimeZoneDefinition(
                "a time zone must have at least one period",
            ));
        }

        let Some(first) = self.transitions.first() else {
            return Err(ValidationError::InvalidTimeZoneDefinition(
                "a time zone must have at least one transition",
            ));
        };
        if !matches!(first, TimeZoneTransition::Transition { .. }) {
            return Err(ValidationError::InvalidTimeZoneDefinition(
                "the first transition must not be dated",
            ));
        }

        for transition in &self.transitions {
            transition.validate()?;
            self.validate_target(transition)?;
        }

        for group in &self.transition_groups {
            group.validate()?;
            for transition in &group.transitions {
                self.validate_target(transition)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACIFIC: &[u8] = br#"<t:StartTimeZone Id="Pacific Standard Time" Name="(UTC-08:00) Pacific Time (US &amp; Canada)" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
        <t:Periods>
            <t:Period Bias="PT8H" Name="Standard" Id="trule:Microsoft/Registry/Pacific Standard Time/2006-Standard"/>
            <t:Period Bias="PT7H" Name="Daylight" Id="trule:Microsoft/Registry/Pacific Standard Time/2006-Daylight"/>
        </t:Periods>
        <t:TransitionsGroups>
            <t:TransitionsGroup Id="0">
                <t:RecurringDayTransition>
                    <t:To Kind="Period">trule:Microsoft/Registry/Pacific Standard Time/2006-Daylight</t:To>
                    <t:TimeOffset>PT2H</t:TimeOffset>
                    <t:Month>3</t:Month>
                    <t:DayOfWeek>Sunday</t:DayOfWeek>
                    <t:Occurrence>2</t:Occurrence>
                </t:RecurringDayTransition>
                <t:RecurringDayTransition>
                    <t:To Kind="Period">trule:Microsoft/Registry/Pacific Standard Time/2006-Standard</t:To>
                    <t:TimeOffset>PT2H</t:TimeOffset>
                    <t:Month>11</t:Month>
                    <t:DayOfWeek>Sunday</t:DayOfWeek>
                    <t:Occurrence>1</t:Occurrence>
                </t:RecurringDayTransition>
            </t:TransitionsGroup>
        </t:TransitionsGroups>
        <t:Transitions>
            <t:Transition><t:To Kind="Group">0</t:To></t:Transition>
        </t:Transitions>
    </t:StartTimeZone>"#;

    fn pacific() -> TimeZoneDefinition {
        let mut reader = EwsXmlReader::new(PACIFIC);
        reader.read_start_element(XmlNamespace::Types, "StartTimeZone").unwrap();

        let mut definition = TimeZoneDefinition::default();
        definition.load_from_xml(&mut reader).unwrap();
        definition
    }

    #[test]
    fn transitions_are_dispatched_by_element_name() {
        let definition = pacific();

        assert_eq!(definition.id, "Pacific Standard Time");
        assert_eq!(definition.periods.len(), 2);
        assert_eq!(definition.periods[0].bias, TimeDelta::hours(8));
        assert_eq!(definition.transition_groups[0].transitions.len(), 2);
        assert!(matches!(
            definition.transition_groups[0].transitions[1],
            TimeZoneTransition::RecurringDay {
                month: 11,
                day_of_week: Some(DayOfTheWeek::Sunday),
                occurrence: 1,
                ..
            }
        ));
        assert_eq!(definition.transitions, vec![TimeZoneTransition::to_group("0")]);
        assert_eq!(definition.validate(), Ok(()));
    }

    #[test]
    fn written_definitions_read_back_identically() {
        let definition = pacific();

        let mut writer = EwsXmlWriter::new();
        definition
            .write_to_xml(&mut writer, XmlNamespace::Types, "StartTimeZone")
            .unwrap();
        let document = writer.into_inner().unwrap();

        let mut reader = EwsXmlReader::new(&document);
        reader.read_start_element(XmlNamespace::Types, "StartTimeZone").unwrap();
        let mut read = TimeZoneDefinition::default();
        read.load_from_xml(&mut reader).unwrap();

        assert_eq!(read, definition);
    }

    #[test]
    fn dangling_transition_targets_are_rejected() {
        let mut definition = TimeZoneDefinition::utc();
        assert_eq!(definition.validate(), Ok(()));

        definition.transitions = vec![TimeZoneTransition::to_group("missing")];
        assert!(matches!(
            definition.validate(),
            Err(ValidationError::InvalidTimeZoneDefinition(_))
        ));
    }

    #[test]
    fn unknown_transition_names_are_not_dispatched() {
        assert!(TimeZoneTransition::create_from_xml("RelativeTransition").is_none());
    }
}
