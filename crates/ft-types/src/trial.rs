use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single mod parameter value.
///
/// Only [`ParameterValue::Number`] values take part in mutation search;
/// flags and text are carried through to the simulator untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl ParameterValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// JSON form of the value. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Flag(v) => serde_json::Value::Bool(*v),
            Self::Text(v) => serde_json::Value::String(v.clone()),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Parameters of one mod, addressed by a dot-separated path such as
/// `"arena.blackHole"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModOverride {
    pub path: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl ModOverride {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Path split into its non-empty segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.').filter(|segment| !segment.is_empty())
    }
}

/// A named template of mod overrides to evaluate.
///
/// Trials are treated as immutable values: every mutation or promotion works
/// on a fresh clone, and since all parameter maps are owned the clone is deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "mods")]
    pub overrides: Vec<ModOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_misalignment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TrialDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            overrides: Vec::new(),
            repetitions: None,
            ai_misalignment: None,
            time_scale: None,
            metadata: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_override(mut self, mod_override: ModOverride) -> Self {
        self.overrides.push(mod_override);
        self
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    pub fn with_ai_misalignment(mut self, ai_misalignment: f64) -> Self {
        self.ai_misalignment = Some(ai_misalignment);
        self
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = Some(time_scale);
        self
    }

    /// Label if present, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Look up a parameter by override path and name. The first override
    /// with a matching path wins.
    pub fn parameter(&self, path: &str, name: &str) -> Option<&ParameterValue> {
        self.overrides
            .iter()
            .find(|o| o.path == path)
            .and_then(|o| o.parameters.get(name))
    }

    /// Parse a trial from its JSON representation.
    pub fn from_json_str(json: &str) -> crate::TuneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
