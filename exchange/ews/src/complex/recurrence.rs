/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use chrono::NaiveDate;

use crate::{
    xml::{EwsXmlReader, EwsXmlWriter, XmlEnum, XmlNamespace},
    Error, ValidationError,
};

use super::ComplexProperty;

/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/daysofweek>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, XmlEnum)]
pub enum DayOfTheWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Day,
    Weekday,
    WeekendDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum DayOfTheWeekIndex {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, XmlEnum)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

/// How often a recurring item repeats.
///
/// The variant is chosen from the pattern element's name; see
/// [`RecurrencePattern::create_from_xml`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily {
        interval: u32,
    },
    Weekly {
        interval: u32,
        days_of_week: Vec<DayOfTheWeek>,
        first_day_of_week: Option<DayOfTheWeek>,
    },
    AbsoluteMonthly {
        interval: u32,
        day_of_month: u32,
    },
    RelativeMonthly {
        interval: u32,
        day_of_week: Option<DayOfTheWeek>,
        day_of_week_index: Option<DayOfTheWeekIndex>,
    },
    AbsoluteYearly {
        day_of_month: u32,
        month: Option<Month>,
    },
    RelativeYearly {
        day_of_week: Option<DayOfTheWeek>,
        day_of_week_index: Option<DayOfTheWeekIndex>,
        month: Option<Month>,
    },
    DailyRegeneration {
        interval: u32,
    },
    WeeklyRegeneration {
        interval: u32,
    },
    MonthlyRegeneration {
        interval: u32,
    },
    YearlyRegeneration {
        interval: u32,
    },
}

impl RecurrencePattern {
    pub fn daily(interval: u32) -> Self {
        Self::Daily { interval }
    }

    pub fn weekly(interval: u32, days_of_week: impl IntoIterator<Item = DayOfTheWeek>) -> Self {
        Self::Weekly {
            interval,
            days_of_week: days_of_week.into_iter().collect(),
            first_day_of_week: None,
        }
    }

    pub fn absolute_monthly(interval: u32, day_of_month: u32) -> Self {
        Self::AbsoluteMonthly { interval, day_of_month }
    }

    pub fn relative_monthly(interval: u32, day_of_week: DayOfTheWeek, day_of_week_index: DayOfTheWeekIndex) -> Self {
        Self::RelativeMonthly {
            interval,
            day_of_week: Some(day_of_week),
            day_of_week_index: Some(day_of_week_index),
        }
    }

    pub fn absolute_yearly(day_of_month: u32, month: Month) -> Self {
        Self::AbsoluteYearly {
            day_of_month,
            month: Some(month),
        }
    }

    pub fn relative_yearly(day_of_week: DayOfTheWeek, day_of_week_index: DayOfTheWeekIndex, month: Month) -> Self {
        Self::RelativeYearly {
            day_of_week: Some(day_of_week),
            day_of_week_index: Some(day_of_week_index),
            month: Some(month),
        }
    }

    /// Creates an empty pattern of the kind named by an element, or `None`
    /// if the name isn't a recurrence pattern.
    pub fn create_from_xml(element_name: &str) -> Option<Self> {
        let pattern = match element_name {
            "DailyRecurrence" => Self::Daily { interval: 1 },
            "WeeklyRecurrence" => Self::Weekly {
                interval: 1,
                days_of_week: Vec::new(),
                first_day_of_week: None,
            },
            "AbsoluteMonthlyRecurrence" => Self::AbsoluteMonthly {
                interval: 1,
                day_of_month: 0,
            },
            "RelativeMonthlyRecurrence" => Self::RelativeMonthly {
                interval: 1,
                day_of_week: None,
                day_of_week_index: None,
            },
            "AbsoluteYearlyRecurrence" => Self::AbsoluteYearly {
                day_of_month: 0,
                month: None,
            },
            "RelativeYearlyRecurrence" => Self::RelativeYearly {
                day_of_week: None,
                day_of_week_index: None,
                month: None,
            },
            "DailyRegeneration" => Self::DailyRegeneration { interval: 1 },
            "WeeklyRegeneration" => Self::WeeklyRegeneration { interval: 1 },
            "MonthlyRegeneration" => Self::MonthlyRegeneration { interval: 1 },
            "YearlyRegeneration" => Self::YearlyRegeneration { interval: 1 },
            _ => return None,
        };

        Some(pattern)
    }

    pub fn xml_element_name(&self) -> &'static str {
        match self {
            Self::Daily { .. } => "DailyRecurrence",
            Self::Weekly { .. } => "WeeklyRecurrence",
            Self::AbsoluteMonthly { .. } => "AbsoluteMonthlyRecurrence",
            Self::RelativeMonthly { .. } => "RelativeMonthlyRecurrence",
            Self::AbsoluteYearly { .. } => "AbsoluteYearlyRecurrence",
            Self::RelativeYearly { .. } => "RelativeYearlyRecurrence",
            Self::DailyRegeneration { .. } => "DailyRegeneration",
            Self::WeeklyRegeneration { .. } => "WeeklyRegeneration",
            Self::MonthlyRegeneration { .. } => "MonthlyRegeneration",
            Self::YearlyRegeneration { .. } => "YearlyRegeneration",
        }
    }

    /// The interval of patterns which repeat every N days, weeks, months or
    /// years.
    pub fn interval(&self) -> Option<u32> {
        match self {
            Self::Daily { interval }
            | Self::Weekly { interval, .. }
            | Self::AbsoluteMonthly { interval, .. }
            | Self::RelativeMonthly { interval, .. }
            | Self::DailyRegeneration { interval }
            | Self::WeeklyRegeneration { interval }
            | Self::MonthlyRegeneration { interval }
            | Self::YearlyRegeneration { interval } => Some(*interval),
            Self::AbsoluteYearly { .. } | Self::RelativeYearly { .. } => None,
        }
    }

    fn interval_mut(&mut self) -> Option<&mut u32> {
        match self {
            Self::Daily { interval }
            | Self::Weekly { interval, .. }
            | Self::AbsoluteMonthly { interval, .. }
            | Self::RelativeMonthly { interval, .. }
            | Self::DailyRegeneration { interval }
            | Self::WeeklyRegeneration { interval }
            | Self::MonthlyRegeneration { interval }
            | Self::YearlyRegeneration { interval } => Some(interval),
            Self::AbsoluteYearly { .. } | Self::RelativeYearly { .. } => None,
        }
    }

    /// Whether two patterns describe the same recurrence. Patterns of
    /// different kinds are never the same.
    pub fn is_same(&self, other: &Self) -> bool {
        self == other
    }

    fn try_read_interval(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        if reader.local_name() != "Interval" {
            return Ok(false);
        }

        match self.interval_mut() {
            Some(interval) => {
                *interval = reader.read_element_value_as()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn validate_interval(&self) -> Result<(), ValidationError> {
        match self.interval() {
            Some(0) => Err(ValidationError::IntervalMustBeGreaterOrEqualToOne),
            _ => Ok(()),
        }
    }
}

impl Default for RecurrencePattern {
    fn default() -> Self {
        Self::Daily { interval: 1 }
    }
}

impl ComplexProperty for RecurrencePattern {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        if self.try_read_interval(reader)? {
            return Ok(true);
        }

        match reader.local_name() {
            "DaysOfWeek" => match self {
                Self::Weekly { days_of_week, .. } => *days_of_week = read_days_of_week(reader)?,
                Self::RelativeMonthly { day_of_week, .. } | Self::RelativeYearly { day_of_week, .. } => {
                    *day_of_week = Some(reader.read_element_value_as_enum()?)
                }
                _ => return Ok(false),
            },
            "FirstDayOfWeek" => match self {
                Self::Weekly { first_day_of_week, .. } => {
                    *first_day_of_week = Some(reader.read_element_value_as_enum()?)
                }
                _ => return Ok(false),
            },
            "DayOfWeekIndex" => match self {
                Self::RelativeMonthly { day_of_week_index, .. } | Self::RelativeYearly { day_of_week_index, .. } => {
                    *day_of_week_index = Some(reader.read_element_value_as_enum()?)
                }
                _ => return Ok(false),
            },
            "DayOfMonth" => match self {
                Self::AbsoluteMonthly { day_of_month, .. } | Self::AbsoluteYearly { day_of_month, .. } => {
                    *day_of_month = reader.read_element_value_as()?
                }
                _ => return Ok(false),
            },
            "Month" => match self {
                Self::AbsoluteYearly { month, .. } | Self::RelativeYearly { month, .. } => {
                    *month = Some(reader.read_element_value_as_enum()?)
                }
                _ => return Ok(false),
            },
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(interval) = self.interval() {
            writer.write_element_value(XmlNamespace::Types, "Interval", &interval.to_string())?;
        }

        match self {
            Self::Weekly {
                days_of_week,
                first_day_of_week,
                ..
            } => {
                let days = days_of_week
                    .iter()
                    .map(XmlEnum::as_xml_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                writer.write_element_value(XmlNamespace::Types, "DaysOfWeek", &days)?;
                if let Some(first_day_of_week) = first_day_of_week {
                    writer.write_element_enum(XmlNamespace::Types, "FirstDayOfWeek", *first_day_of_week)?;
                }
            }
            Self::AbsoluteMonthly { day_of_month, .. } => {
                writer.write_element_value(XmlNamespace::Types, "DayOfMonth", &day_of_month.to_string())?;
            }
            Self::RelativeMonthly {
                day_of_week,
                day_of_week_index,
                ..
            } => {
                write_optional_enum(writer, "DaysOfWeek", *day_of_week)?;
                write_optional_enum(writer, "DayOfWeekIndex", *day_of_week_index)?;
            }
            Self::AbsoluteYearly { day_of_month, month } => {
                writer.write_element_value(XmlNamespace::Types, "DayOfMonth", &day_of_month.to_string())?;
                write_optional_enum(writer, "Month", *month)?;
            }
            Self::RelativeYearly {
                day_of_week,
                day_of_week_index,
                month,
            } => {
                write_optional_enum(writer, "DaysOfWeek", *day_of_week)?;
                write_optional_enum(writer, "DayOfWeekIndex", *day_of_week_index)?;
                write_optional_enum(writer, "Month", *month)?;
            }
            Self::Daily { .. }
            | Self::DailyRegeneration { .. }
            | Self::WeeklyRegeneration { .. }
            | Self::MonthlyRegeneration { .. }
            | Self::YearlyRegeneration { .. } => {}
        }

        Ok(())
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        self.validate_interval()?;

        match self {
            Self::Weekly { days_of_week, .. } if days_of_week.is_empty() => {
                Err(ValidationError::DaysOfTheWeekNotSpecified)
            }
            Self::AbsoluteMonthly { day_of_month, .. } if !(1..=31).contains(day_of_month) => {
                Err(ValidationError::DayOfMonthOutOfRange)
            }
            Self::AbsoluteYearly { day_of_month, month } => {
                if !(1..=31).contains(day_of_month) {
                    return Err(ValidationError::DayOfMonthOutOfRange);
                }
                require(month, "Month")
            }
            Self::RelativeMonthly {
                day_of_week,
                day_of_week_index,
                ..
            } => {
                require(day_of_week, "DaysOfWeek")?;
                require(day_of_week_index, "DayOfWeekIndex")
            }
            Self::RelativeYearly {
                day_of_week,
                day_of_week_index,
                month,
            } => {
                require(day_of_week, "DaysOfWeek")?;
                require(day_of_week_index, "DayOfWeekIndex")?;
                require(month, "Month")
            }
            _ => Ok(()),
        }
    }
}

/// When a recurrence starts, and whether and when it ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecurrenceRange {
    NoEnd {
        start_date: Option<NaiveDate>,
    },
    EndDate {
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    Numbered {
        start_date: Option<NaiveDate>,
        number_of_occurrences: u32,
    },
}

impl Default for RecurrenceRange {
    fn default() -> Self {
        Self::NoEnd { start_date: None }
    }
}

impl RecurrenceRange {
    pub fn create_from_xml(element_name: &str) -> Option<Self> {
        let range = match element_name {
            "NoEndRecurrence" => Self::NoEnd { start_date: None },
            "EndDateRecurrence" => Self::EndDate {
                start_date: None,
                end_date: None,
            },
            "NumberedRecurrence" => Self::Numbered {
                start_date: None,
                number_of_occurrences: 0,
            },
            _ => return None,
        };

        Some(range)
    }

    pub fn xml_element_name(&self) -> &'static str {
        match self {
            Self::NoEnd { .. } => "NoEndRecurrence",
            Self::EndDate { .. } => "EndDateRecurrence",
            Self::Numbered { .. } => "NumberedRecurrence",
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Self::NoEnd { start_date } | Self::EndDate { start_date, .. } | Self::Numbered { start_date, .. } => {
                *start_date
            }
        }
    }

    fn start_date_mut(&mut self) -> &mut Option<NaiveDate> {
        match self {
            Self::NoEnd { start_date } | Self::EndDate { start_date, .. } | Self::Numbered { start_date, .. } => {
                start_date
            }
        }
    }
}

impl ComplexProperty for RecurrenceRange {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        match reader.local_name() {
            "StartDate" => *self.start_date_mut() = Some(reader.read_element_value_as_date()?),
            "EndDate" => match self {
                Self::EndDate { end_date, .. } => *end_date = Some(reader.read_element_value_as_date()?),
                _ => return Ok(false),
            },
            "NumberOfOccurrences" => match self {
                Self::Numbered {
                    number_of_occurrences, ..
                } => *number_of_occurrences = reader.read_element_value_as()?,
                _ => return Ok(false),
            },
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        if let Some(start_date) = self.start_date() {
            writer.write_element_date(XmlNamespace::Types, "StartDate", &start_date)?;
        }

        match self {
            Self::EndDate {
                end_date: Some(end_date),
                ..
            } => writer.write_element_date(XmlNamespace::Types, "EndDate", end_date),
            Self::Numbered {
                number_of_occurrences, ..
            } => writer.write_element_value(
                XmlNamespace::Types,
                "NumberOfOccurrences",
                &number_of_occurrences.to_string(),
            ),
            _ => Ok(()),
        }
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        let start_date = self.start_date().ok_or(ValidationError::RecurrenceHasNoStartDate)?;

        match self {
            Self::EndDate { end_date, .. } => match end_date {
                Some(end_date) if *end_date < start_date => Err(ValidationError::RecurrenceEndsBeforeStart),
                Some(_) => Ok(()),
                None => Err(ValidationError::FieldNotSpecified("EndDate")),
            },
            Self::Numbered {
                number_of_occurrences: 0,
                ..
            } => Err(ValidationError::NumberOfOccurrencesMustBeGreaterThanZero),
            _ => Ok(()),
        }
    }
}

/// The recurrence of a calendar item or task.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/recurrence-recurrencetype>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub range: RecurrenceRange,
}

impl Recurrence {
    pub fn new(pattern: RecurrencePattern, range: RecurrenceRange) -> Self {
        Self { pattern, range }
    }

    /// Whether the recurrence was truly edited relative to `other`.
    pub fn is_same(&self, other: &Self) -> bool {
        self.pattern.is_same(&other.pattern) && self.range == other.range
    }
}

impl ComplexProperty for Recurrence {
    fn try_read_element_from_xml(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool, Error> {
        if let Some(mut pattern) = RecurrencePattern::create_from_xml(reader.local_name()) {
            pattern.load_from_xml(reader)?;
            self.pattern = pattern;
            return Ok(true);
        }

        if let Some(mut range) = RecurrenceRange::create_from_xml(reader.local_name()) {
            range.load_from_xml(reader)?;
            self.range = range;
            return Ok(true);
        }

        Ok(false)
    }

    fn write_elements_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<(), Error> {
        self.pattern
            .write_to_xml(writer, XmlNamespace::Types, self.pattern.xml_element_name())?;
        self.range
            .write_to_xml(writer, XmlNamespace::Types, self.range.xml_element_name())
    }

    fn internal_validate(&self) -> Result<(), ValidationError> {
        self.pattern.validate()?;
        self.range.validate()
    }
}

fn read_days_of_week(reader: &mut EwsXmlReader<'_>) -> Result<Vec<DayOfTheWeek>, Error> {
    let value = reader.read_element_value()?;
    value
        .split_whitespace()
        .map(|day| {
            DayOfTheWeek::from_xml_str(day)
                .ok_or_else(|| Error::UnexpectedXml(format!("invalid day of the week `{day}`")))
        })
        .collect()
}

fn write_optional_enum<T: XmlEnum>(writer: &mut EwsXmlWriter, element_name: &str, value: Option<T>) -> Result<(), Error> {
    match value {
        Some(value) => writer.write_element_enum(XmlNamespace::Types, element_name, value),
        None => Ok(()),
    }
}

fn require<T>(value: &Option<T>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ValidationError::FieldNotSpecified(field)),
    }
}
