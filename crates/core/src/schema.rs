//! Declarative tool schemas.
//!
//! A `ToolSchema` describes a tool's parameters to the completion provider
//! so the model can request invocations. Tool authors populate schemas
//! explicitly through `ToolSchemaBuilder` — there is no runtime signature
//! inspection, so a schema that builds is a schema that is valid.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The JSON type of a single tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ParamType {
    /// The JSON-Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,

    /// JSON type
    pub ty: ParamType,

    /// Whether the provider must supply this parameter
    pub required: bool,

    /// Optional human-readable description (sent to the provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Structured description of a tool, sent to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Create a parameterless schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Start building a schema with parameters.
    pub fn builder(name: impl Into<String>) -> ToolSchemaBuilder {
        ToolSchemaBuilder {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters, in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render the JSON-Schema `parameters` object for the provider wire
    /// format.
    pub fn parameters_json(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut spec = serde_json::Map::new();
            spec.insert("type".into(), serde_json::json!(param.ty.as_str()));
            if let Some(desc) = &param.description {
                spec.insert("description".into(), serde_json::json!(desc));
            }
            properties.insert(param.name.clone(), serde_json::Value::Object(spec));

            if param.required {
                required.push(serde_json::json!(param.name));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Builder for `ToolSchema`.
///
/// Requiredness is an explicit flag per parameter — nothing is inferred
/// from defaults, and variadic parameters simply cannot be expressed.
#[derive(Debug, Clone)]
pub struct ToolSchemaBuilder {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
}

impl ToolSchemaBuilder {
    /// Set the tool description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: ParamType, required: bool) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            ty,
            required,
            description: None,
        });
        self
    }

    /// Declare a parameter with a description.
    pub fn described_param(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            ty,
            required,
            description: Some(description.into()),
        });
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> Result<ToolSchema, ConfigError> {
        for (i, param) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == param.name) {
                return Err(ConfigError::DuplicateParameter {
                    tool: self.name,
                    param: param.name.clone(),
                });
            }
        }

        Ok(ToolSchema {
            name: self.name,
            description: self.description,
            params: self.params,
        })
    }
}
