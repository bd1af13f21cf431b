//! Name Resolver / Assembler
//!
//! Folds the walker's records into the final name -> selector mapping.
//!
//! Collision rule: the later record wins the shared name. The selector that
//! held it moves to an alternative name, searched in this order:
//! 1. the holder's own `_alternative`
//! 2. the newcomer's `_alternative`
//! 3. the `_alternative` of any other record sharing the name, in walk order
//!
//! Candidates already claimed are skipped. No candidate left means the
//! specification is rejected.

use crate::selector::Selector;
use crate::validate::CompileError;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::ops::Index;

/// `items` -> `selectItems`
pub fn create_selector_name(prefix: &str, base: &str) -> String {
    if prefix.is_empty() {
        return base.to_string();
    }
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

/// One (name, selector) pair produced while walking the specification.
#[derive(Debug, Clone)]
pub struct SelectorRecord {
    pub name: String,
    pub alternative: Option<String>,
    pub selector: Selector,
    pub exported: bool,
}

pub struct NameResolver<'r> {
    root_name: &'r str,
    root: &'r Selector,
}

impl<'r> NameResolver<'r> {
    pub fn new(root_name: &'r str, root: &'r Selector) -> Self {
        NameResolver { root_name, root }
    }

    pub fn assemble(&self, records: &[SelectorRecord]) -> Result<CompiledSelectors, CompileError> {
        let exported: Vec<&SelectorRecord> = records.iter().filter(|r| r.exported).collect();

        // Pass 1: every record sharing a name, in walk order.
        let mut sharing: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, record) in exported.iter().enumerate() {
            sharing.entry(record.name.as_str()).or_default().push(i);
        }

        // Pass 2: claim names, resolving collisions through alternatives.
        let mut selectors: IndexMap<String, Selector> = IndexMap::new();
        let mut holders: HashMap<String, usize> = HashMap::new();
        selectors.insert(self.root_name.to_string(), self.root.clone());

        for (i, record) in exported.iter().enumerate() {
            if record.name == self.root_name {
                // The root is never displaced; the newcomer must step aside.
                let alternative = record
                    .alternative
                    .as_ref()
                    .filter(|alt| !selectors.contains_key(alt.as_str()))
                    .ok_or_else(|| duplicate(&record.name))?;
                tracing::debug!(name = %record.name, alternative = %alternative, "root name taken, using alternative");
                selectors.insert(alternative.clone(), record.selector.clone());
                holders.insert(alternative.clone(), i);
                continue;
            }

            let Some(&holder) = holders.get(&record.name) else {
                tracing::debug!(name = %record.name, "claimed selector name");
                selectors.insert(record.name.clone(), record.selector.clone());
                holders.insert(record.name.clone(), i);
                continue;
            };

            let others = sharing[record.name.as_str()]
                .iter()
                .filter(|&&j| j != holder && j != i)
                .map(|&j| exported[j]);
            let alternative = [exported[holder], *record]
                .into_iter()
                .chain(others)
                .filter_map(|r| r.alternative.as_ref())
                .find(|alt| !selectors.contains_key(alt.as_str()))
                .cloned()
                .ok_or_else(|| duplicate(&record.name))?;

            tracing::debug!(
                name = %record.name,
                moved_to = %alternative,
                "selector name collision resolved"
            );
            let displaced = selectors[record.name.as_str()].clone();
            selectors.insert(alternative.clone(), displaced);
            holders.insert(alternative, holder);
            selectors.insert(record.name.clone(), record.selector.clone());
            holders.insert(record.name.clone(), i);
        }

        Ok(CompiledSelectors {
            root_name: self.root_name.to_string(),
            selectors,
        })
    }
}

fn duplicate(name: &str) -> CompileError {
    tracing::warn!(name = %name, "selector name collision without usable alternative");
    CompileError::DuplicateSelectorName {
        name: name.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILED MAPPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable mapping from selector name to selector. Always holds the root.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    root_name: String,
    selectors: IndexMap<String, Selector>,
}

impl CompiledSelectors {
    pub fn get(&self, name: &str) -> Option<&Selector> {
        self.selectors.get(name)
    }

    pub fn root(&self) -> &Selector {
        &self.selectors[self.root_name.as_str()]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.selectors.contains_key(name)
    }

    /// Evaluates the named selector; `None` when no such selector exists.
    pub fn select(&self, name: &str, state: &crate::Value, props: &crate::Value) -> Option<crate::Value> {
        self.get(name).map(|selector| selector.select(state, props))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.selectors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl Index<&str> for CompiledSelectors {
    type Output = Selector;

    fn index(&self, name: &str) -> &Selector {
        match self.selectors.get(name) {
            Some(selector) => selector,
            None => panic!("no selector named {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, alternative: Option<&str>) -> SelectorRecord {
        SelectorRecord {
            name: name.to_string(),
            alternative: alternative.map(str::to_string),
            selector: Selector::from_fn(name, |s, _| s.clone()),
            exported: true,
        }
    }

    #[test]
    fn test_create_selector_name() {
        assert_eq!(create_selector_name("select", "items"), "selectItems");
        assert_eq!(create_selector_name("select", "a"), "selectA");
        assert_eq!(create_selector_name("select", "éclair"), "selectÉclair");
        assert_eq!(create_selector_name("select", "$private"), "select$private");
        assert_eq!(create_selector_name("", "items"), "items");
    }

    #[test]
    fn test_root_always_first() {
        let root = Selector::identity();
        let records = vec![record("selectA", None), record("selectB", None)];
        let compiled = NameResolver::new("selectState", &root).assemble(&records).unwrap();

        let names: Vec<&str> = compiled.names().collect();
        assert_eq!(names, vec!["selectState", "selectA", "selectB"]);
        assert!(compiled.root().same_as(&root));
    }

    #[test]
    fn test_collision_moves_holder_to_alternative() {
        let root = Selector::identity();
        let first = record("selectB", None);
        let second = record("selectB", Some("selectOtherB"));
        let records = vec![first.clone(), second.clone()];

        let compiled = NameResolver::new("selectState", &root).assemble(&records).unwrap();
        assert!(compiled["selectB"].same_as(&second.selector));
        assert!(compiled["selectOtherB"].same_as(&first.selector));
    }

    #[test]
    fn test_holder_alternative_preferred() {
        let root = Selector::identity();
        let first = record("selectB", Some("selectFirstB"));
        let second = record("selectB", Some("selectSecondB"));
        let records = vec![first.clone(), second.clone()];

        let compiled = NameResolver::new("selectState", &root).assemble(&records).unwrap();
        assert!(compiled["selectB"].same_as(&second.selector));
        assert!(compiled["selectFirstB"].same_as(&first.selector));
        assert!(!compiled.contains("selectSecondB"));
    }

    #[test]
    fn test_three_way_collision() {
        let root = Selector::identity();
        let first = record("selectB", Some("selectFirstB"));
        let second = record("selectB", Some("selectSecondB"));
        let third = record("selectB", None);
        let records = vec![first.clone(), second.clone(), third.clone()];

        let compiled = NameResolver::new("selectState", &root).assemble(&records).unwrap();
        assert!(compiled["selectB"].same_as(&third.selector));
        assert!(compiled["selectSecondB"].same_as(&second.selector));
        assert!(compiled["selectFirstB"].same_as(&first.selector));
        assert_eq!(compiled.len(), 4);
    }

    #[test]
    fn test_collision_without_alternative_fails() {
        let root = Selector::identity();
        let records = vec![record("selectB", None), record("selectB", None)];
        let err = NameResolver::new("selectState", &root)
            .assemble(&records)
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateSelectorName { ref name } if name == "selectB"));
    }

    #[test]
    fn test_root_collision_needs_own_alternative() {
        let root = Selector::identity();
        let resolver = NameResolver::new("selectState", &root);

        let rejected = resolver.assemble(&[record("selectState", None)]);
        assert!(rejected.is_err());

        let shadow = record("selectState", Some("selectNestedState"));
        let compiled = resolver.assemble(&[shadow.clone()]).unwrap();
        assert!(compiled["selectState"].same_as(&root));
        assert!(compiled["selectNestedState"].same_as(&shadow.selector));
    }

    #[test]
    fn test_unexported_records_never_claim() {
        let root = Selector::identity();
        let mut hidden = record("selectB", None);
        hidden.exported = false;
        let shown = record("selectB", None);

        let compiled = NameResolver::new("selectState", &root)
            .assemble(&[hidden, shown.clone()])
            .unwrap();
        assert!(compiled["selectB"].same_as(&shown.selector));
        assert_eq!(compiled.len(), 2);
    }

    #[test]
    fn test_assemble_is_repeatable() {
        let root = Selector::identity();
        let records = vec![
            record("selectA", None),
            record("selectB", None),
            record("selectB", Some("selectOtherB")),
        ];
        let resolver = NameResolver::new("selectState", &root);
        let first = resolver.assemble(&records).unwrap();
        let second = resolver.assemble(&records).unwrap();

        let first_names: Vec<&str> = first.names().collect();
        let second_names: Vec<&str> = second.names().collect();
        assert_eq!(first_names, second_names);
        for (name, selector) in first.iter() {
            assert!(second[name].same_as(selector));
        }
    }
}
