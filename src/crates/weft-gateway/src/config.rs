//! Graph document loading
//!
//! Reads the static graph description once at startup. Documents are YAML by
//! default; a `.json` extension switches to JSON. String values support
//! `${ENV_VAR}` / `${ENV_VAR:default}` expansion before deserialization, so
//! handler hosts can differ between environments without editing the file.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use tracing::debug;

use weft_graph::Graph;

use crate::{GatewayError, Result};

/// Load a graph document from `path`
///
/// The returned graph is parsed but not yet validated; validation happens
/// when the router connects.
pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        GatewayError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let graph = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        let mut value: JsonValue = serde_json::from_str(&content).map_err(|e| {
            GatewayError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        expand_json_variables(&mut value);
        serde_json::from_value(value).map_err(|e| {
            GatewayError::Config(format!("invalid graph document {}: {e}", path.display()))
        })?
    } else {
        let mut value: YamlValue = serde_yaml::from_str(&content).map_err(|e| {
            GatewayError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        expand_yaml_variables(&mut value);
        serde_yaml::from_value(value).map_err(|e| {
            GatewayError::Config(format!("invalid graph document {}: {e}", path.display()))
        })?
    };

    debug!(path = %path.display(), "loaded graph document");
    Ok(graph)
}

/// Expand environment variables in every string of a YAML document
fn expand_yaml_variables(value: &mut YamlValue) {
    match value {
        YamlValue::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        YamlValue::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_yaml_variables(v);
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                expand_yaml_variables(item);
            }
        }
        _ => {}
    }
}

/// Expand environment variables in every string of a JSON document
fn expand_json_variables(value: &mut JsonValue) {
    match value {
        JsonValue::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        JsonValue::Object(map) => {
            for (_, v) in map.iter_mut() {
                expand_json_variables(v);
            }
        }
        JsonValue::Array(seq) => {
            for item in seq.iter_mut() {
                expand_json_variables(item);
            }
        }
        _ => {}
    }
}

/// Expand environment variables in a string
///
/// Supports syntax: ${ENV_VAR:default_value}
fn expand_env_in_string(s: &str) -> Option<String> {
    if !s.contains("${") {
        return None;
    }

    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^:}]+)(?::([^}]*))?\}").ok()?;

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0)?.as_str();
        let var_name = cap.get(1)?.as_str();
        let default_value = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let value = env::var(var_name).unwrap_or_else(|_| default_value.to_string());
        result = result.replace(full_match, &value);
    }

    Some(result)
}
