//! Parse Module for the Selector Compiler
//!
//! Loads a specification from JSON. Directive payloads are typed here; values
//! that cannot live in JSON (`_func`, `_selector`, `_selectors`) are written as
//! names and looked up in a `FunctionRegistry`.

use crate::scope::is_reserved_directive;
use crate::selector::{Selector, ValueFn};
use crate::spec::{Directive, SpecNode, ValueType};
use crate::validate::CompileError;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::Map as JsonMap;
use std::collections::HashMap;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTION REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Named functions and selectors a JSON specification may refer to.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    funcs: HashMap<String, ValueFn>,
    selectors: HashMap<String, Selector>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `length`, `keys`, `values` and `identity`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_func("length", |value, _| match value {
            Value::List(items) => Value::from(items.len()),
            Value::Map(entries) => Value::from(entries.len()),
            Value::String(s) => Value::from(s.chars().count()),
            _ => Value::Absent,
        });
        registry.register_func("keys", |value, _| match value {
            Value::Map(entries) => Value::list(entries.keys().map(|k| Value::from(k.as_str())).collect()),
            _ => Value::empty_list(),
        });
        registry.register_func("values", |value, _| match value {
            Value::Map(entries) => Value::list(entries.values().cloned().collect()),
            Value::List(_) => value.clone(),
            _ => Value::empty_list(),
        });
        registry.register_func("identity", |value, _| value.clone());
        registry
    }

    pub fn register_func<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
        self
    }

    pub fn register_selector(&mut self, name: impl Into<String>, selector: Selector) -> &mut Self {
        self.selectors.insert(name.into(), selector);
        self
    }

    pub fn func(&self, name: &str) -> Option<&ValueFn> {
        self.funcs.get(name)
    }

    pub fn selector(&self, name: &str) -> Option<&Selector> {
        self.selectors.get(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPEC PARSING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn parse_spec_str(source: &str, registry: &FunctionRegistry) -> Result<SpecNode, CompileError> {
    let json: serde_json::Value = serde_json::from_str(source)?;
    parse_spec(&json, registry)
}

pub fn parse_spec(json: &serde_json::Value, registry: &FunctionRegistry) -> Result<SpecNode, CompileError> {
    match json {
        serde_json::Value::Object(entries) => parse_node(entries, registry, "<root>"),
        _ => Err(CompileError::invalid_directive(
            "<root>",
            "specification",
            "expected a JSON object",
        )),
    }
}

fn parse_node(
    entries: &JsonMap<String, serde_json::Value>,
    registry: &FunctionRegistry,
    path: &str,
) -> Result<SpecNode, CompileError> {
    let mut node = SpecNode::new();

    for (key, value) in entries {
        if key.starts_with('_') {
            if !is_reserved_directive(key) {
                return Err(CompileError::invalid_directive(path, key, "unknown directive"));
            }
            node = node.directive(parse_directive(key, value, registry, path)?);
            continue;
        }

        let child_path = if path == "<root>" {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        match value {
            serde_json::Value::Object(child) => {
                node = node.child(key.clone(), parse_node(child, registry, &child_path)?);
            }
            _ => {
                tracing::debug!(node = %child_path, "skipping entry that is not a specification node");
            }
        }
    }

    Ok(node)
}

fn parse_directive(
    key: &str,
    value: &serde_json::Value,
    registry: &FunctionRegistry,
    path: &str,
) -> Result<Directive, CompileError> {
    let directive = match key {
        "_selector" => {
            let name = expect_str(value, key, path)?;
            let selector = registry
                .selector(name)
                .ok_or_else(|| unknown_function(path, name))?;
            Directive::Selector(selector.clone())
        }
        "_export" => Directive::Export(expect_bool(value, key, path)?),
        "_default" => Directive::Default(Value::from(value)),
        "_type" => {
            let name = expect_str(value, key, path)?;
            let value_type = ValueType::from_name(name).ok_or_else(|| {
                CompileError::invalid_directive(path, key, format!("unknown type \"{}\"", name))
            })?;
            Directive::Type(value_type)
        }
        "_name" => Directive::Name(expect_str(value, key, path)?.to_string()),
        "_names" => {
            let names = expect_str_list(value, key, path)?;
            if names.is_empty() {
                return Err(CompileError::invalid_directive(path, key, "expected at least one name"));
            }
            Directive::Names(names)
        }
        "_alternative" => Directive::Alternative(expect_str(value, key, path)?.to_string()),
        "_key" => Directive::Key(expect_str(value, key, path)?.to_string()),
        "_func" => {
            let name = expect_str(value, key, path)?;
            let func = registry.func(name).ok_or_else(|| unknown_function(path, name))?;
            Directive::Func(func.clone())
        }
        "_propsKeys" => Directive::PropsKeys(expect_str_list(value, key, path)?),
        "_selectors" => {
            let selectors = expect_str_list(value, key, path)?
                .iter()
                .map(|name| {
                    registry
                        .selector(name)
                        .cloned()
                        .ok_or_else(|| unknown_function(path, name))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Directive::Selectors(selectors)
        }
        "_stateToProps" => {
            let entries = value
                .as_object()
                .ok_or_else(|| CompileError::invalid_directive(path, key, "expected an object"))?;
            let mut declared = IndexMap::new();
            for (props_key, reference) in entries {
                declared.insert(props_key.clone(), expect_str(reference, key, path)?.to_string());
            }
            Directive::StateToProps(declared)
        }
        "_log" => Directive::Log(expect_bool(value, key, path)?),
        _ => return Err(CompileError::invalid_directive(path, key, "unknown directive")),
    };
    Ok(directive)
}

fn expect_str<'v>(value: &'v serde_json::Value, key: &str, path: &str) -> Result<&'v str, CompileError> {
    value
        .as_str()
        .ok_or_else(|| CompileError::invalid_directive(path, key, "expected a string"))
}

fn expect_bool(value: &serde_json::Value, key: &str, path: &str) -> Result<bool, CompileError> {
    value
        .as_bool()
        .ok_or_else(|| CompileError::invalid_directive(path, key, "expected a boolean"))
}

fn expect_str_list(value: &serde_json::Value, key: &str, path: &str) -> Result<Vec<String>, CompileError> {
    let items = value
        .as_array()
        .ok_or_else(|| CompileError::invalid_directive(path, key, "expected an array of strings"))?;
    items
        .iter()
        .map(|item| expect_str(item, key, path).map(str::to_string))
        .collect()
}

fn unknown_function(path: &str, name: &str) -> CompileError {
    CompileError::UnknownFunction {
        node: path.to_string(),
        name: name.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
