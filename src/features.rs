//! Confirmed Design Features
//!
//! Flags confirmed in the design wizard (`hasZipper`, `hasDrawcord`, ...)
//! plus the garment `subType`. Only explicit booleans are switches; missing
//! flags and non-boolean values leave the BOM alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagState {
    Present,
    Absent,
    Unconfirmed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(flatten)]
    pub flags: BTreeMap<String, Value>,
}

impl ConfirmedFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.flags.insert(flag.into(), Value::Bool(enabled));
        self
    }

    pub fn state(&self, flag: &str) -> FlagState {
        match self.flags.get(flag) {
            Some(Value::Bool(true)) => FlagState::Present,
            Some(Value::Bool(false)) => FlagState::Absent,
            _ => FlagState::Unconfirmed,
        }
    }

    /// Flags confirmed on, in name order
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.flags_in(FlagState::Present)
    }

    /// Flags confirmed off, in name order
    pub fn absent(&self) -> impl Iterator<Item = &str> {
        self.flags_in(FlagState::Absent)
    }

    fn flags_in(&self, wanted: FlagState) -> impl Iterator<Item = &str> {
        self.flags
            .keys()
            .map(String::as_str)
            .filter(move |flag| self.state(flag) == wanted)
    }
}
