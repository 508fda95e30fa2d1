//! Data server configuration.

use serde::{Deserialize, Serialize};

use s100_permits::{DateFormats, PERMIT_FILE_NAME};

/// Settings for a [`DataServer`](crate::DataServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataServerConfig {
    /// Written to the `dataserver` header element when set.
    pub name: Option<String>,
    /// Header and expiry date formats.
    pub date_formats: DateFormats,
    /// File name used when saving permit files.
    pub permit_file_name: String,
}

impl Default for DataServerConfig {
    fn default() -> Self {
        Self {
            name: None,
            date_formats: DateFormats::default(),
            permit_file_name: PERMIT_FILE_NAME.to_string(),
        }
    }
}

impl DataServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn date_formats(mut self, date_formats: DateFormats) -> Self {
        self.date_formats = date_formats;
        self
    }

    pub fn permit_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.permit_file_name = file_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DataServerConfig::default();
        assert_eq!(config.name, None);
        assert_eq!(config.permit_file_name, "PERMIT.XML");
        assert_eq!(config.date_formats.header, "%Y%m%d %I:%M:%S");
        assert_eq!(config.date_formats.expiry, "%Y%m%d");
    }

    #[test]
    fn test_builder() {
        let config = DataServerConfig::new()
            .name("PRIMAR")
            .permit_file_name("permit.xml");
        assert_eq!(config.name.as_deref(), Some("PRIMAR"));
        assert_eq!(config.permit_file_name, "permit.xml");
    }

    #[test]
    fn test_serde_json() {
        let config = DataServerConfig::new().name("UKHO");
        let json = serde_json::to_string(&config).unwrap();
        let back: DataServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
