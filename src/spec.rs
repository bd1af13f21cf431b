//! Specification Tree
//!
//! A specification node is an ordered list of entries. Each entry is either a
//! reserved directive with a typed payload or a named child node. Entry order
//! is significant: it fixes the order in which siblings are compiled and, with
//! it, which node wins a shared selector name.

use crate::selector::{Selector, ValueFn};
use crate::validate::{validate_explicit_name, CompileError};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Value class used when a property is missing and no `_default` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    List,
    Index,
}

impl ValueType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "list" => Some(ValueType::List),
            "index" => Some(ValueType::Index),
            _ => None,
        }
    }

    pub fn empty_value(self) -> Value {
        match self {
            ValueType::List => Value::empty_list(),
            ValueType::Index => Value::empty_map(),
        }
    }
}

#[derive(Clone)]
pub enum Directive {
    /// `_selector`
    Selector(Selector),
    /// `_export`
    Export(bool),
    /// `_default`
    Default(Value),
    /// `_type`
    Type(ValueType),
    /// `_name`
    Name(String),
    /// `_names`
    Names(Vec<String>),
    /// `_alternative`
    Alternative(String),
    /// `_key`
    Key(String),
    /// `_func`
    Func(ValueFn),
    /// `_propsKeys`
    PropsKeys(Vec<String>),
    /// `_selectors`
    Selectors(Vec<Selector>),
    /// `_stateToProps`: props key to ancestor selector name
    StateToProps(IndexMap<String, String>),
    /// `_log`
    Log(bool),
}

impl Directive {
    pub fn key(&self) -> &'static str {
        match self {
            Directive::Selector(_) => "_selector",
            Directive::Export(_) => "_export",
            Directive::Default(_) => "_default",
            Directive::Type(_) => "_type",
            Directive::Name(_) => "_name",
            Directive::Names(_) => "_names",
            Directive::Alternative(_) => "_alternative",
            Directive::Key(_) => "_key",
            Directive::Func(_) => "_func",
            Directive::PropsKeys(_) => "_propsKeys",
            Directive::Selectors(_) => "_selectors",
            Directive::StateToProps(_) => "_stateToProps",
            Directive::Log(_) => "_log",
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Selector(s) => write!(f, "_selector({})", s.name()),
            Directive::Export(b) => write!(f, "_export({})", b),
            Directive::Default(v) => write!(f, "_default({:?})", v),
            Directive::Type(t) => write!(f, "_type({:?})", t),
            Directive::Name(n) => write!(f, "_name({})", n),
            Directive::Names(n) => write!(f, "_names({:?})", n),
            Directive::Alternative(n) => write!(f, "_alternative({})", n),
            Directive::Key(k) => write!(f, "_key({})", k),
            Directive::Func(_) => write!(f, "_func(..)"),
            Directive::PropsKeys(k) => write!(f, "_propsKeys({:?})", k),
            Directive::Selectors(s) => write!(f, "_selectors(len={})", s.len()),
            Directive::StateToProps(m) => write!(f, "_stateToProps({:?})", m),
            Directive::Log(b) => write!(f, "_log({})", b),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SpecEntry {
    Directive(Directive),
    Child(String, SpecNode),
}

#[derive(Debug, Clone, Default)]
pub struct SpecNode {
    entries: Vec<SpecEntry>,
}

impl SpecNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &SpecNode)> {
        self.entries.iter().filter_map(|entry| match entry {
            SpecEntry::Child(key, node) => Some((key.as_str(), node)),
            SpecEntry::Directive(_) => None,
        })
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter().filter_map(|entry| match entry {
            SpecEntry::Directive(d) => Some(d),
            SpecEntry::Child(..) => None,
        })
    }

    /// Adds a child node. Re-adding an existing key replaces it in place.
    pub fn child(mut self, key: impl Into<String>, node: SpecNode) -> Self {
        let key = key.into();
        let existing = self
            .entries
            .iter_mut()
            .find(|entry| matches!(entry, SpecEntry::Child(k, _) if *k == key));
        match existing {
            Some(entry) => *entry = SpecEntry::Child(key, node),
            None => self.entries.push(SpecEntry::Child(key, node)),
        }
        self
    }

    /// Adds a directive. Re-adding the same directive replaces it in place.
    pub fn directive(mut self, directive: Directive) -> Self {
        let key = directive.key();
        let existing = self
            .entries
            .iter_mut()
            .find(|entry| matches!(entry, SpecEntry::Directive(d) if d.key() == key));
        match existing {
            Some(entry) => *entry = SpecEntry::Directive(directive),
            None => self.entries.push(SpecEntry::Directive(directive)),
        }
        self
    }

    pub fn selector(self, selector: Selector) -> Self {
        self.directive(Directive::Selector(selector))
    }

    pub fn export(self, export: bool) -> Self {
        self.directive(Directive::Export(export))
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.directive(Directive::Default(value.into()))
    }

    pub fn value_type(self, value_type: ValueType) -> Self {
        self.directive(Directive::Type(value_type))
    }

    pub fn list(self) -> Self {
        self.value_type(ValueType::List)
    }

    pub fn index(self) -> Self {
        self.value_type(ValueType::Index)
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.directive(Directive::Name(name.into()))
    }

    pub fn names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive(Directive::Names(names.into_iter().map(Into::into).collect()))
    }

    pub fn alternative(self, name: impl Into<String>) -> Self {
        self.directive(Directive::Alternative(name.into()))
    }

    pub fn key(self, props_key: impl Into<String>) -> Self {
        self.directive(Directive::Key(props_key.into()))
    }

    pub fn func<F>(self, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.directive(Directive::Func(Arc::new(func)))
    }

    pub fn props_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive(Directive::PropsKeys(keys.into_iter().map(Into::into).collect()))
    }

    pub fn selectors(self, selectors: Vec<Selector>) -> Self {
        self.directive(Directive::Selectors(selectors))
    }

    /// Declares one injected props key, computed by the named ancestor selector.
    pub fn state_to_props(mut self, props_key: impl Into<String>, selector: impl Into<String>) -> Self {
        let (props_key, selector) = (props_key.into(), selector.into());
        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            SpecEntry::Directive(Directive::StateToProps(map)) => Some(map),
            _ => None,
        });
        match existing {
            Some(map) => {
                map.insert(props_key, selector);
            }
            None => {
                let mut map = IndexMap::new();
                map.insert(props_key, selector);
                self.entries.push(SpecEntry::Directive(Directive::StateToProps(map)));
            }
        }
        self
    }

    pub fn log(self, log: bool) -> Self {
        self.directive(Directive::Log(log))
    }

    /// Collects this node's directives into one view, rejecting conflicting
    /// naming directives before anything is built for the node.
    pub fn settings(&self, path: &str, validate_names: bool) -> Result<NodeSettings, CompileError> {
        let mut settings = NodeSettings::default();
        let mut name = None;
        let mut names = None;

        for directive in self.directives() {
            match directive {
                Directive::Selector(s) => settings.selector = Some(s.clone()),
                Directive::Export(b) => settings.export = *b,
                Directive::Default(v) => settings.default = Some(v.clone()),
                Directive::Type(t) => settings.value_type = Some(*t),
                Directive::Name(n) => name = Some(n.clone()),
                Directive::Names(n) => names = Some(n.clone()),
                Directive::Alternative(a) => settings.alternative = Some(a.clone()),
                Directive::Key(k) => settings.key = Some(k.clone()),
                Directive::Func(f) => settings.func = Some(f.clone()),
                Directive::PropsKeys(k) => settings.props_keys = Some(k.clone()),
                Directive::Selectors(s) => settings.selectors = Some(s.clone()),
                Directive::StateToProps(m) => settings.state_to_props.extend(m.clone()),
                Directive::Log(b) => settings.log = *b,
            }
        }

        settings.names = match (name, names) {
            (Some(_), Some(_)) => {
                return Err(CompileError::AmbiguousNaming {
                    node: path.to_string(),
                })
            }
            (Some(n), None) => Some(vec![n]),
            (None, Some(names)) if names.is_empty() => {
                return Err(CompileError::invalid_directive(
                    path,
                    "_names",
                    "expected at least one name",
                ))
            }
            (None, names) => names,
        };

        if validate_names {
            let explicit = settings.names.iter().flatten().chain(settings.alternative.iter());
            for name in explicit {
                validate_explicit_name(path, name)?;
            }
        }

        Ok(settings)
    }
}

/// Flattened directives of one node.
#[derive(Clone)]
pub struct NodeSettings {
    pub selector: Option<Selector>,
    pub export: bool,
    pub default: Option<Value>,
    pub value_type: Option<ValueType>,
    /// `_name` as a single entry, or `_names`
    pub names: Option<Vec<String>>,
    pub alternative: Option<String>,
    pub key: Option<String>,
    pub func: Option<ValueFn>,
    pub props_keys: Option<Vec<String>>,
    pub selectors: Option<Vec<Selector>>,
    pub state_to_props: IndexMap<String, String>,
    pub log: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        NodeSettings {
            selector: None,
            export: true,
            default: None,
            value_type: None,
            names: None,
            alternative: None,
            key: None,
            func: None,
            props_keys: None,
            selectors: None,
            state_to_props: IndexMap::new(),
            log: false,
        }
    }
}

impl NodeSettings {
    /// `_default` verbatim, else the `_type` class default, else absent.
    pub fn fallback(&self) -> Value {
        match (&self.default, self.value_type) {
            (Some(value), _) => value.clone(),
            (None, Some(value_type)) => value_type.empty_value(),
            (None, None) => Value::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ERR_AMBIGUOUS_NAMING;

    #[test]
    fn test_entries_keep_declaration_order() {
        let node = SpecNode::new()
            .child("b", SpecNode::new())
            .list()
            .child("a", SpecNode::new());

        let keys: Vec<&str> = node.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(node.directives().count(), 1);
    }

    #[test]
    fn test_child_replaced_in_place() {
        let node = SpecNode::new()
            .child("a", SpecNode::new())
            .child("b", SpecNode::new())
            .child("a", SpecNode::new().list());

        let keys: Vec<&str> = node.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        let (_, a) = node.children().next().unwrap();
        assert_eq!(a.directives().count(), 1);
    }

    #[test]
    fn test_name_and_names_rejected() {
        let node = SpecNode::new().name("one").names(["two", "three"]);
        let err = node.settings("a", true).err().unwrap();
        assert_eq!(err.code(), ERR_AMBIGUOUS_NAMING);
    }

    #[test]
    fn test_fallback_priority() {
        let both = SpecNode::new().list().default_value(5i64);
        assert_eq!(both.settings("a", true).unwrap().fallback(), Value::from(5i64));

        let typed = SpecNode::new().index();
        assert_eq!(typed.settings("a", true).unwrap().fallback(), Value::empty_map());

        let bare = SpecNode::new();
        assert!(bare.settings("a", true).unwrap().fallback().is_absent());
    }

    #[test]
    fn test_state_to_props_accumulates() {
        let node = SpecNode::new()
            .state_to_props("itemId", "selectCurrent")
            .state_to_props("userId", "selectUser")
            .state_to_props("itemId", "selectOther");

        let settings = node.settings("a", true).unwrap();
        assert_eq!(settings.state_to_props.len(), 2);
        assert_eq!(settings.state_to_props["itemId"], "selectOther");
    }

    #[test]
    fn test_empty_names_rejected() {
        let node = SpecNode::new().names(Vec::<String>::new());
        let err = node.settings("a", false).err().unwrap();
        assert_eq!(err.code(), crate::validate::ERR_INVALID_DIRECTIVE);
    }

    #[test]
    fn test_invalid_alternative_rejected() {
        let node = SpecNode::new().alternative("not an identifier");
        assert!(node.settings("a", true).is_err());
        assert!(node.settings("a", false).is_ok());
    }
}
