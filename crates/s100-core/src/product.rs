//! IHO S-100 product specification numbers.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::file_name;

lazy_static! {
    static ref EMBEDDED_NAME: Regex = Regex::new(r"S-([0-9]{3})").unwrap();
}

/// A product specification such as S-101, numbered 100 through 999.
///
/// Ordered and compared by number. Serialized as the canonical name (`"S-101"`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductSpecification(u16);

impl ProductSpecification {
    pub const MIN: u16 = 100;
    pub const MAX: u16 = 999;

    /// S-101, Electronic Navigational Chart.
    pub const S101: Self = Self(101);

    /// Create from a number, rejecting values outside 100..=999.
    pub fn new(number: u16) -> Result<Self> {
        Self::from_number(i64::from(number))
    }

    fn from_number(number: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&number) {
            Ok(Self(number as u16))
        } else {
            Err(CoreError::OutOfRange(number))
        }
    }

    /// Extract a product specification from free-form text.
    ///
    /// Tried in order: a bare integer, `S` + number (4 characters),
    /// `S-` + number (5 characters), a data-set file name, and finally the
    /// last `S-###` anywhere in the text.
    pub fn parse(text: &str) -> Result<Self> {
        let unrecognized = || CoreError::UnrecognizedProductSpecification(text.to_string());

        let number: i64 = if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse().map_err(|_| unrecognized())?
        } else if text.len() == 4 && text.starts_with('S') {
            text[1..].parse().map_err(|_| unrecognized())?
        } else if text.len() == 5 && text.starts_with("S-") {
            text[2..].parse().map_err(|_| unrecognized())?
        } else if let Some(n) = file_name::standard_number(text) {
            i64::from(n)
        } else {
            let caps = EMBEDDED_NAME
                .captures_iter(text)
                .last()
                .ok_or_else(unrecognized)?;
            caps[1].parse().map_err(|_| unrecognized())?
        };

        Self::from_number(number)
    }

    /// Like [`parse`](Self::parse), but `None` on any failure.
    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    pub const fn number(&self) -> u16 {
        self.0
    }

    /// Canonical name, e.g. `S-101`.
    pub fn name(&self) -> String {
        format!("S-{}", self.0)
    }

    /// Short name, e.g. `S101`.
    pub fn short_name(&self) -> String {
        format!("S{}", self.0)
    }

    /// Catalogue file name inside an exchange set.
    pub fn exchange_set_catalogue_file_name(&self) -> String {
        match self.0 {
            101 => "S101ed1.CAT".to_string(),
            _ => format!("{}.CAT", self.short_name()),
        }
    }

    /// Directory name inside an exchange set.
    pub fn exchange_set_directory_name(&self) -> String {
        self.short_name()
    }
}

impl fmt::Display for ProductSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

impl fmt::Debug for ProductSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductSpecification(S-{})", self.0)
    }
}

impl FromStr for ProductSpecification {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<u16> for ProductSpecification {
    type Error = CoreError;

    fn try_from(number: u16) -> Result<Self> {
        Self::new(number)
    }
}

impl Serialize for ProductSpecification {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProductSpecification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
