//! Spec Walker
//!
//! Depth-first, declaration-order traversal of a specification. Every child
//! node gets one selector composed on top of its parent's selector; the node's
//! names become `SelectorRecord`s for the assembler.

use crate::options::CompileOptions;
use crate::renamer::{create_selector_name, SelectorRecord};
use crate::scope::{merge_injections, SelectorScope};
use crate::selector::{FuncArgs, FuncCall, PropsInjection, Resolution, Selector};
use crate::spec::{Directive, NodeSettings, SpecNode};
use crate::validate::CompileError;

const ROOT_PATH: &str = "<root>";

pub struct SpecWalker<'o> {
    options: &'o CompileOptions,
    records: Vec<SelectorRecord>,
}

/// Output of one walk: the composition root and the records in walk order.
pub struct WalkOutput {
    pub root: Selector,
    pub records: Vec<SelectorRecord>,
}

impl<'o> SpecWalker<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        SpecWalker {
            options,
            records: Vec::new(),
        }
    }

    pub fn walk_root(mut self, spec: &SpecNode) -> Result<WalkOutput, CompileError> {
        for directive in spec.directives() {
            if !matches!(directive, Directive::Selector(_) | Directive::StateToProps(_)) {
                return Err(CompileError::invalid_directive(
                    ROOT_PATH,
                    directive.key(),
                    "only _selector and _stateToProps apply to the root",
                ));
            }
        }

        let settings = spec.settings(ROOT_PATH, self.options.validate_names)?;
        let root = settings.selector.clone().unwrap_or_else(Selector::identity);

        let root_aliases = vec![
            self.options.root_selector_name(),
            self.options.root_name.clone(),
        ];
        let mut scope = SelectorScope::new(root.clone(), root_aliases);
        let injections = scope.resolve_injections(ROOT_PATH, &settings.state_to_props)?;

        self.walk(spec, &root, false, &injections, &mut scope, "")?;

        Ok(WalkOutput {
            root,
            records: self.records,
        })
    }

    fn walk(
        &mut self,
        node: &SpecNode,
        parent: &Selector,
        parent_is_collection: bool,
        inherited: &[PropsInjection],
        scope: &mut SelectorScope,
        path: &str,
    ) -> Result<(), CompileError> {
        // Nearest preceding sibling declaring `_type`.
        let mut sibling_collection: Option<Selector> = None;

        for (key, child) in node.children() {
            let child_path = if path.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", path, key)
            };

            let settings = child.settings(&child_path, self.options.validate_names)?;
            let own = scope.resolve_injections(&child_path, &settings.state_to_props)?;
            let injections = merge_injections(inherited, own);

            let names = self.selector_names(key, &settings);
            let alternative = settings
                .alternative
                .as_deref()
                .map(|alt| create_selector_name(&self.options.name_prefix, alt));
            let exported = settings.export && !self.options.is_private(key);

            let label = names.first().cloned().unwrap_or_else(|| child_path.clone());
            let collection = if parent_is_collection {
                None
            } else {
                sibling_collection.clone()
            };
            let selector = self.build_selector(
                label,
                key,
                parent,
                collection,
                &settings,
                injections.clone(),
            );

            tracing::debug!(
                node = %child_path,
                names = ?names,
                exported,
                "built selector"
            );

            for name in &names {
                self.records.push(SelectorRecord {
                    name: name.clone(),
                    alternative: alternative.clone(),
                    selector: selector.clone(),
                    exported,
                });
            }

            let mut aliases = names;
            aliases.push(key.to_string());
            scope.push(aliases, selector.clone());
            let is_collection = settings.value_type.is_some();
            let walked = self.walk(child, &selector, is_collection, &injections, scope, &child_path);
            scope.pop();
            walked?;

            if is_collection {
                sibling_collection = Some(selector);
            }
        }

        Ok(())
    }

    /// `_names`, else `_name`, else the node key; all run through the prefix rule.
    fn selector_names(&self, key: &str, settings: &NodeSettings) -> Vec<String> {
        let prefix = &self.options.name_prefix;
        match &settings.names {
            Some(names) => names
                .iter()
                .map(|name| create_selector_name(prefix, name))
                .collect(),
            None => vec![create_selector_name(prefix, key)],
        }
    }

    fn build_selector(
        &self,
        label: String,
        key: &str,
        parent: &Selector,
        collection: Option<Selector>,
        settings: &NodeSettings,
        injections: Vec<PropsInjection>,
    ) -> Selector {
        if let Some(target) = &settings.selector {
            return Selector::delegate(label, target.clone(), injections, settings.log);
        }

        let func = settings.func.as_ref().map(|func| {
            let args = match (&settings.selectors, &settings.props_keys) {
                (Some(selectors), _) => FuncArgs::Selectors(selectors.clone()),
                (None, Some(keys)) => FuncArgs::PropsKeys(keys.clone()),
                (None, None) => FuncArgs::PropsKeys(Vec::new()),
            };
            FuncCall::new(func.clone(), args)
        });

        let resolve = Resolution {
            property: self.options.property_name(key).to_string(),
            key: settings.key.clone(),
            collection: settings.key.as_ref().and(collection),
            func,
            fallback: settings.fallback(),
        };

        Selector::property(label, parent.clone(), resolve, injections, settings.log)
    }
}
