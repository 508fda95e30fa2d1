//! Date formats used in permit files.
//!
//! The header date is written on a 12-hour clock without an AM/PM marker
//! (`yyyyMMdd hh:mm:ss`). Reading it back treats every hour as AM, so hour
//! `12` reads as `00`.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{PermitError, Result};

/// Header date format, `yyyyMMdd hh:mm:ss`.
pub const HEADER_DATE_FORMAT: &str = "%Y%m%d %I:%M:%S";

/// Expiry date format, `yyyyMMdd`.
pub const EXPIRY_DATE_FORMAT: &str = "%Y%m%d";

/// The chrono format strings for the two dates in a permit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormats {
    /// Issue date in the header.
    pub header: String,
    /// Expiry date of each data permit.
    pub expiry: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            header: HEADER_DATE_FORMAT.to_string(),
            expiry: EXPIRY_DATE_FORMAT.to_string(),
        }
    }
}

impl DateFormats {
    pub fn format_header(&self, date: &NaiveDateTime) -> Result<String> {
        render(&self.header, date.format(&self.header))
    }

    pub fn parse_header(&self, value: &str) -> Result<NaiveDateTime> {
        let twelve_hour = self.header.contains("%I") && !has_meridiem(&self.header);
        let format = if twelve_hour {
            self.header.replace("%I", "%H")
        } else {
            self.header.clone()
        };

        let parsed = NaiveDateTime::parse_from_str(value.trim(), &format)
            .map_err(|_| malformed(value, &self.header))?;
        if twelve_hour && parsed.hour() == 12 {
            let time = NaiveTime::from_hms_opt(0, parsed.minute(), parsed.second())
                .ok_or_else(|| malformed(value, &self.header))?;
            return Ok(parsed.date().and_time(time));
        }
        Ok(parsed)
    }

    pub fn format_expiry(&self, date: &NaiveDate) -> Result<String> {
        render(&self.expiry, date.format(&self.expiry))
    }

    pub fn parse_expiry(&self, value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), &self.expiry)
            .map_err(|_| malformed(value, &self.expiry))
    }
}

fn has_meridiem(format: &str) -> bool {
    format.contains("%p") || format.contains("%P")
}

fn malformed(value: &str, format: &str) -> PermitError {
    PermitError::MalformedDate {
        value: value.to_string(),
        format: format.to_string(),
    }
}

fn render(format: &str, formatted: impl std::fmt::Display) -> Result<String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(PermitError::InvalidDateFormat(format.to_string()));
    }
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| PermitError::InvalidDateFormat(format.to_string()))?;
    Ok(out)
}
