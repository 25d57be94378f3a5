use serde::{Deserialize, Serialize};

/// Parsed gateway operation: one query or mutation with its root fields
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    /// Declared default values, used when a request omits the variable
    pub variable_defaults: Vec<(String, InputValue)>,
    pub root_fields: Vec<SelectedField>,
}

impl Operation {
    pub fn variable_default(&self, name: &str) -> Option<&InputValue> {
        self.variable_defaults
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// One entry of a selection set
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(SelectedField),
    /// `...Name`
    FragmentSpread(String),
    /// `... on Type { ... }` or `... { ... }`
    InlineFragment {
        type_condition: Option<String>,
        selections: Vec<Selection>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedField {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub selections: Vec<Selection>,
}

impl SelectedField {
    pub fn new(name: &str) -> Self {
        Self {
            alias: None,
            name: name.to_string(),
            arguments: Vec::new(),
            selections: Vec::new(),
        }
    }

    /// Key this field is reported under in the response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }

    /// True for a plain scalar selection: no alias, no sub-selection
    pub fn is_leaf(&self) -> bool {
        self.alias.is_none() && self.selections.is_empty()
    }
}

/// Literal argument value as written in the query document
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    Variable(String),
}

/// HTTP body of a gateway request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GraphQLRequest {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            variables: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphQLResponse {
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphQLError {
    pub message: String,
}

impl GraphQLResponse {
    pub fn data(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![GraphQLError {
                message: message.into(),
            }],
        }
    }
}
