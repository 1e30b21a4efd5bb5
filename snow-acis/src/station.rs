use serde::{Deserialize, Serialize};

/// ACIS station id of WHITE LAKE 4E, the station the dashboard reports on.
pub const DEFAULT_STATION_SID: &str = "208941";

/// Display name of the default station.
pub const DEFAULT_STATION_NAME: &str = "WHITE LAKE 4E";

/// An ACIS reporting station.
///
/// See: <https://www.rcc-acis.org/docs_webservices.html>
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Station {
    /// ACIS station identifier (`sid` query parameter)
    pub sid: String,
    /// Human-readable name of the station
    pub name: String,
}

impl Station {
    pub fn new(sid: impl Into<String>, name: impl Into<String>) -> Self {
        Station {
            sid: sid.into(),
            name: name.into(),
        }
    }

    /// "WHITE LAKE 4E (SID 208941)"
    pub fn source_label(&self) -> String {
        format!("{} (SID {})", self.name, self.sid)
    }
}

impl Default for Station {
    fn default() -> Self {
        Station::new(DEFAULT_STATION_SID, DEFAULT_STATION_NAME)
    }
}
