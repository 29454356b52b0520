use serde::Deserialize;

use crate::SettingsError;

// --- MongoDB Settings ---
/// Connection settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    /// Connection string, loaded from `MONGODB_URI`
    pub uri: String,
    /// Optional application name reported to the server, loaded from `MONGODB_APP_NAME`
    pub app_name: Option<String>,
}

impl MongoSettings {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            app_name: None,
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

// Shape the environment deserializes into before the URI check.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawMongoSettings {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl TryFrom<RawMongoSettings> for MongoSettings {
    type Error = SettingsError;

    fn try_from(raw: RawMongoSettings) -> Result<Self, Self::Error> {
        let uri = raw
            .uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(SettingsError::MissingUri)?;
        Ok(Self {
            uri,
            app_name: raw.app_name.filter(|name| !name.is_empty()),
        })
    }
}
