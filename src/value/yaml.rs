//! Conversion between the generic tree and serde_yaml/serde_json values.

use super::node::{Mapping, Node, Scalar, ScalarKind};
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::sync::Arc;
use thiserror::Error;

/// YamlError reports a failure of the underlying YAML reader or writer.
#[derive(Debug, Error)]
pub enum YamlError {
    #[error("failed to parse YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to serialize YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<&YamlValue> for Node {
    fn from(value: &YamlValue) -> Self {
        match value {
            YamlValue::Mapping(m) => {
                let mut mapping = Mapping::new();
                for (k, v) in m {
                    mapping.insert(key_to_string(k), Node::from(v));
                }
                Node::Mapping(mapping)
            }
            YamlValue::Sequence(items) => {
                Node::Sequence(items.iter().map(|v| Arc::new(Node::from(v))).collect())
            }
            YamlValue::Tagged(tagged) => Node::from(&tagged.value),
            scalar => Node::Scalar(yaml_scalar(scalar)),
        }
    }
}

impl From<&Node> for YamlValue {
    fn from(node: &Node) -> Self {
        match node {
            Node::Mapping(m) => {
                let mut mapping = serde_yaml::Mapping::new();
                for (k, v) in m.iter() {
                    mapping.insert(YamlValue::String(k.to_string()), YamlValue::from(v));
                }
                YamlValue::Mapping(mapping)
            }
            Node::Sequence(items) => {
                YamlValue::Sequence(items.iter().map(|n| YamlValue::from(n.as_ref())).collect())
            }
            Node::Scalar(s) => scalar_to_yaml(s),
        }
    }
}

impl From<&serde_json::Value> for Node {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Node::Scalar(Scalar::null()),
            serde_json::Value::Bool(b) => Node::Scalar(Scalar::new(b.to_string(), ScalarKind::Bool)),
            serde_json::Value::Number(n) => {
                let kind = if n.is_f64() {
                    ScalarKind::Float
                } else {
                    ScalarKind::Int
                };
                Node::Scalar(Scalar::new(n.to_string(), kind))
            }
            serde_json::Value::String(s) => Node::string(s.clone()),
            serde_json::Value::Array(items) => {
                Node::Sequence(items.iter().map(|v| Arc::new(Node::from(v))).collect())
            }
            serde_json::Value::Object(obj) => {
                Node::Mapping(obj.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect())
            }
        }
    }
}

fn yaml_scalar(value: &YamlValue) -> Scalar {
    match value {
        YamlValue::Null => Scalar::null(),
        YamlValue::Bool(b) => Scalar::new(b.to_string(), ScalarKind::Bool),
        YamlValue::Number(n) => {
            let kind = if n.is_f64() {
                ScalarKind::Float
            } else {
                ScalarKind::Int
            };
            Scalar::new(n.to_string(), kind)
        }
        YamlValue::String(s) => Scalar::string(s.clone()),
        // Collections never reach here.
        _ => Scalar::null(),
    }
}

fn key_to_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        YamlValue::Mapping(_) | YamlValue::Sequence(_) => {
            serde_yaml::to_string(key).map(|s| s.trim_end().to_string()).unwrap_or_default()
        }
        scalar => yaml_scalar(scalar).value().to_string(),
    }
}

fn scalar_to_yaml(scalar: &Scalar) -> YamlValue {
    let text = scalar.value();
    match scalar.kind() {
        ScalarKind::Null => YamlValue::Null,
        ScalarKind::Bool => match text.to_ascii_lowercase().as_str() {
            "true" => YamlValue::Bool(true),
            "false" => YamlValue::Bool(false),
            _ => YamlValue::String(text.to_string()),
        },
        ScalarKind::Int => {
            if let Ok(i) = text.parse::<i64>() {
                YamlValue::Number(i.into())
            } else if let Ok(u) = text.parse::<u64>() {
                YamlValue::Number(u.into())
            } else {
                YamlValue::String(text.to_string())
            }
        }
        ScalarKind::Float => match text.parse::<f64>() {
            Ok(f) => YamlValue::Number(f.into()),
            Err(_) => YamlValue::String(text.to_string()),
        },
        ScalarKind::String => YamlValue::String(text.to_string()),
    }
}

/// Parses a single YAML document into a tree.
pub fn from_yaml(yaml: &str) -> Result<Node, YamlError> {
    let value: YamlValue = serde_yaml::from_str(yaml).map_err(YamlError::Parse)?;
    Ok(Node::from(&value))
}

/// Parses every document of a (possibly multi-document) YAML stream.
pub fn documents_from_yaml(yaml: &str) -> Result<Vec<Node>, YamlError> {
    let mut documents = Vec::new();
    for de in serde_yaml::Deserializer::from_str(yaml) {
        let value = YamlValue::deserialize(de).map_err(YamlError::Parse)?;
        documents.push(Node::from(&value));
    }
    Ok(documents)
}

/// Serializes a tree as a YAML document.
pub fn to_yaml(node: &Node) -> Result<String, YamlError> {
    serde_yaml::to_string(&YamlValue::from(node)).map_err(YamlError::Serialize)
}

/// Parses a JSON document into a tree.
pub fn from_json(json: &str) -> Result<Node, YamlError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(Node::from(&value))
}
