use crate::selector::{PropsInjection, Selector};
use crate::validate::CompileError;
use indexmap::IndexMap;
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Keys with a directive meaning. Everything else in a node is a child.
    pub static ref RESERVED_DIRECTIVES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("_selector");
        s.insert("_export");
        s.insert("_default");
        s.insert("_type");
        s.insert("_name");
        s.insert("_names");
        s.insert("_alternative");
        s.insert("_key");
        s.insert("_func");
        s.insert("_propsKeys");
        s.insert("_selectors");
        s.insert("_stateToProps");
        s.insert("_log");
        s
    };
}

pub fn is_reserved_directive(key: &str) -> bool {
    RESERVED_DIRECTIVES.contains(key)
}

struct ScopeFrame {
    /// Node key plus every selector name the node was given.
    aliases: Vec<String>,
    selector: Selector,
}

impl ScopeFrame {
    fn answers_to(&self, reference: &str) -> bool {
        self.aliases.iter().any(|alias| alias == reference)
    }
}

/// Selectors visible to `_stateToProps` references while walking.
///
/// The chain from the root down to the current node is searched first, nearest
/// ancestor first. After that come nodes whose subtree was already compiled,
/// most recent first. The node itself, its descendants and nodes declared later
/// are never visible, so injected props cannot form a cycle.
pub struct SelectorScope {
    chain: Vec<ScopeFrame>,
    compiled: Vec<ScopeFrame>,
}

impl SelectorScope {
    pub fn new(root: Selector, root_aliases: Vec<String>) -> Self {
        SelectorScope {
            chain: vec![ScopeFrame {
                aliases: root_aliases,
                selector: root,
            }],
            compiled: Vec::new(),
        }
    }

    pub fn push(&mut self, aliases: Vec<String>, selector: Selector) {
        self.chain.push(ScopeFrame { aliases, selector });
    }

    /// Leaves the current node; it becomes visible to the nodes after it.
    pub fn pop(&mut self) {
        // The root frame stays for the whole walk.
        if self.chain.len() > 1 {
            if let Some(frame) = self.chain.pop() {
                self.compiled.push(frame);
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn lookup(&self, reference: &str) -> Option<&Selector> {
        self.chain
            .iter()
            .rev()
            .chain(self.compiled.iter().rev())
            .find(|frame| frame.answers_to(reference))
            .map(|frame| &frame.selector)
    }

    /// Turns a node's `_stateToProps` declarations into injections.
    pub fn resolve_injections(
        &self,
        node: &str,
        declared: &IndexMap<String, String>,
    ) -> Result<Vec<PropsInjection>, CompileError> {
        declared
            .iter()
            .map(|(props_key, reference)| {
                let source = self.lookup(reference).ok_or_else(|| {
                    CompileError::UnknownSelectorReference {
                        node: node.to_string(),
                        reference: reference.clone(),
                    }
                })?;
                Ok(PropsInjection {
                    props_key: props_key.clone(),
                    source: source.clone(),
                })
            })
            .collect()
    }
}

/// Inherited injections followed by the node's own; a later entry for the
/// same props key replaces the earlier one.
pub fn merge_injections(inherited: &[PropsInjection], own: Vec<PropsInjection>) -> Vec<PropsInjection> {
    let mut merged: Vec<PropsInjection> = inherited.to_vec();
    for injection in own {
        match merged.iter_mut().find(|i| i.props_key == injection.props_key) {
            Some(slot) => *slot = injection,
            None => merged.push(injection),
        }
    }
    merged
}
