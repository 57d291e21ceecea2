use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Catalog grouping for node types. `Triggers` marks nodes that originate
/// external input and take part in the engine's side-channel propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Triggers,
    Actions,
    Logic,
    Data,
    Utility,
}

impl NodeCategory {
    pub fn is_trigger(&self) -> bool {
        matches!(self, NodeCategory::Triggers)
    }
}

/// Declared input slot of a node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSlot {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl InputSlot {
    pub fn new(id: impl Into<String>, label: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type: data_type.into(),
            required: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declared output slot of a node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSlot {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl OutputSlot {
    pub fn new(id: impl Into<String>, label: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type: data_type.into(),
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Immutable metadata for a node type. Registered once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: NodeCategory,
    pub version: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
}

impl NodeDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: NodeCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            version: "1.0.0".to_string(),
            icon: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_input(mut self, slot: InputSlot) -> Self {
        self.inputs.push(slot);
        self
    }

    pub fn with_output(mut self, slot: OutputSlot) -> Self {
        self.outputs.push(slot);
        self
    }
}
