use std::time::Duration;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::chip::ChipType;
use crate::error::Result;
use crate::strips::DataLine;

/// Settings for [`crate::LedStrips`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Cap on channels handed out, `None` = all the backend has
    pub max_channels: Option<usize>,
    /// Wait for the previous frame before sending, `None` = forever
    pub tx_wait_timeout_ms: Option<u64>,
}

impl ManagerConfig {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.tx_wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One strip as stored in configuration:
///
/// ```json
/// { "name": "shelf", "data_line": 5, "chip": "SK6812RGBW", "length": 30 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripConfig {
    #[serde(default)]
    pub name: String<32>,
    pub data_line: DataLine,
    pub chip: ChipType,
    pub length: u32,
}

impl StripConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedStripError;

    #[test]
    fn test_strip_config() {
        let c = StripConfig::from_json(
            r#"{ "name": "shelf", "data_line": 5, "chip": "SK6812RGBW", "length": 30 }"#,
        )
        .unwrap();
        assert_eq!(c.name.as_str(), "shelf");
        assert_eq!(c.data_line, 5);
        assert_eq!(c.chip, ChipType::Sk6812Rgbw);
        assert_eq!(c.length, 30);
    }

    #[test]
    fn test_strip_config_list() {
        let list = StripConfig::list_from_json(
            r#"[
                { "data_line": 2, "chip": "WS2812", "length": 8 },
                { "name": "desk", "data_line": 4, "chip": "SK6812", "length": 60 }
            ]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name.as_str(), "");
        assert_eq!(list[1].chip, ChipType::Sk6812);
    }

    #[test]
    fn test_strip_config_unknown_chip() {
        let err = StripConfig::from_json(r#"{ "data_line": 2, "chip": "APA102", "length": 8 }"#)
            .unwrap_err();
        assert!(matches!(err, LedStripError::Config(_)));
    }

    #[test]
    fn test_manager_config() {
        assert_eq!(ManagerConfig::default().wait_timeout(), None);
        let c = ManagerConfig::from_json(r#"{ "tx_wait_timeout_ms": 100 }"#).unwrap();
        assert_eq!(c.max_channels, None);
        assert_eq!(c.wait_timeout(), Some(Duration::from_millis(100)));
    }
}
