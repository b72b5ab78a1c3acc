use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::card::inputs::CardInputs;
use crate::color::model::ColorRgb;
use crate::foundation::error::{CardError, CardResult};

/// Storage key of the persisted record.
pub const STATE_KEY: &str = "cardFrameState_v1";
/// Record layout version written by this crate.
pub const STATE_VERSION: u32 = 1;

/// Saved form state. Absent fields leave the session untouched on restore.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PersistedState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(rename = "charName1", default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(rename = "seriesTitle1", default, skip_serializing_if = "Option::is_none")]
    pub series_title: Option<String>,
    #[serde(rename = "printNumber1", default, skip_serializing_if = "Option::is_none")]
    pub print_number: Option<String>,
    #[serde(rename = "customColor1", default, skip_serializing_if = "Option::is_none")]
    pub custom_color: Option<String>,
    #[serde(rename = "showImage1", default, skip_serializing_if = "Option::is_none")]
    pub show_image: Option<bool>,
    #[serde(rename = "dominantColor1", default, skip_serializing_if = "Option::is_none")]
    pub dominant_color: Option<ColorRgb>,
}

fn current_version() -> u32 {
    STATE_VERSION
}

impl PersistedState {
    pub fn capture(inputs: &CardInputs, custom_color: &str, dominant: ColorRgb) -> Self {
        Self {
            version: STATE_VERSION,
            character_name: Some(inputs.character_name.clone()),
            series_title: Some(inputs.series_title.clone()),
            print_number: Some(inputs.print_number.clone()),
            custom_color: Some(custom_color.to_string()),
            show_image: Some(inputs.show_image),
            dominant_color: Some(dominant),
        }
    }

    /// Copy the present fields onto `inputs`.
    pub fn apply_inputs(&self, inputs: &mut CardInputs) {
        if let Some(v) = &self.character_name {
            inputs.character_name.clone_from(v);
        }
        if let Some(v) = &self.series_title {
            inputs.series_title.clone_from(v);
        }
        if let Some(v) = &self.print_number {
            inputs.print_number.clone_from(v);
        }
        if let Some(v) = self.show_image {
            inputs.show_image = v;
        }
    }

    pub fn to_json(&self) -> CardResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CardError::persistence(format!("serialize state: {e}")))
    }

    pub fn from_json(s: &str) -> CardResult<Self> {
        let state: Self = serde_json::from_str(s)
            .map_err(|e| CardError::persistence(format!("parse state: {e}")))?;
        if state.version != STATE_VERSION {
            return Err(CardError::persistence(format!(
                "unsupported state version {} (expected {STATE_VERSION})",
                state.version
            )));
        }
        Ok(state)
    }
}

/// Key-value medium holding the persisted record.
pub trait StateStore {
    fn load(&self) -> CardResult<Option<PersistedState>>;
    fn save(&mut self, state: &PersistedState) -> CardResult<()>;
}

/// One JSON object on disk, mapping storage keys to records.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> CardResult<serde_json::Map<String, serde_json::Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Default::default()),
            Err(e) => {
                return Err(CardError::persistence(format!(
                    "read '{}': {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&raw).map_err(|e| {
            CardError::persistence(format!("parse '{}': {e}", self.path.display()))
        })
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> CardResult<Option<PersistedState>> {
        let map = self.read_map()?;
        let Some(value) = map.get(STATE_KEY) else {
            return Ok(None);
        };
        PersistedState::from_json(&value.to_string()).map(Some)
    }

    fn save(&mut self, state: &PersistedState) -> CardResult<()> {
        // Other keys in the file are preserved. A corrupt file is replaced.
        let mut map = self.read_map().unwrap_or_default();
        let value = serde_json::to_value(state)
            .map_err(|e| CardError::persistence(format!("serialize state: {e}")))?;
        map.insert(STATE_KEY.to_string(), value);
        let text = serde_json::to_string_pretty(&map)
            .map_err(|e| CardError::persistence(format!("serialize store: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create state dir '{}'", parent.display()))
                .map_err(|e| CardError::persistence(format!("{e:#}")))?;
        }
        std::fs::write(&self.path, text)
            .with_context(|| format!("write state file '{}'", self.path.display()))
            .map_err(|e| CardError::persistence(format!("{e:#}")))
    }
}

/// In-process store holding raw JSON strings per key.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored text, as a browser-style key-value store would hold it.
    pub fn raw(&self) -> Option<&str> {
        self.entries.get(STATE_KEY).map(String::as_str)
    }

    pub fn insert_raw(&mut self, json: impl Into<String>) {
        self.entries.insert(STATE_KEY.to_string(), json.into());
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> CardResult<Option<PersistedState>> {
        self.raw().map(PersistedState::from_json).transpose()
    }

    fn save(&mut self, state: &PersistedState) -> CardResult<()> {
        let json = state.to_json()?;
        self.insert_raw(json);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/persist.rs"]
mod tests;
