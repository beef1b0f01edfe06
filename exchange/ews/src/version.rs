/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;

use serde::Deserialize;

use crate::xml::XmlEnum;

/// A version of the EWS schema a request may target.
///
/// Versions are ordered, so that `a < b` means `b` supports everything `a`
/// does.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, XmlEnum)]
pub enum ExchangeVersion {
    #[xml_enum(rename = "Exchange2007_SP1")]
    Exchange2007Sp1,

    Exchange2010,

    #[xml_enum(rename = "Exchange2010_SP1")]
    Exchange2010Sp1,

    #[xml_enum(rename = "Exchange2010_SP2")]
    Exchange2010Sp2,

    #[default]
    Exchange2013,

    #[xml_enum(rename = "Exchange2013_SP1")]
    Exchange2013Sp1,
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_xml_str())
    }
}

impl<'de> Deserialize<'de> for ExchangeVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_xml_str(&s).ok_or_else(|| serde::de::Error::custom("unsupported Exchange version"))
    }
}
