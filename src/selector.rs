//! Selectors
//!
//! A compiled selector is one concrete struct per specification node: an
//! evaluation rule, the node's own memoization cell, the props injections it
//! applies before evaluating, and an optional diagnostic hook.
//!
//! Evaluation order for `select(state, props)`:
//! 1. Injected props keys are computed from ancestor selectors and merged into
//!    `props` (outside the cache, so injected values take part in the cache key).
//! 2. The cache is consulted with `(state, props)`.
//! 3. On a miss the rule runs, the result is stored and, for `_log` nodes, traced.

use crate::cache::MemoCache;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// User computation attached with `_func`: `(parentValue, args) -> value`.
pub type ValueFn = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;

/// Raw selector computation: `(state, props) -> value`.
pub type SelectFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct Selector {
    inner: Arc<SelectorInner>,
}

struct SelectorInner {
    name: String,
    rule: SelectRule,
    injections: Vec<PropsInjection>,
    cache: MemoCache,
    log: bool,
}

enum SelectRule {
    Identity,
    Custom(SelectFn),
    Delegate(Selector),
    Property { parent: Selector, resolve: Resolution },
}

/// One props key synthesized from an ancestor selector.
#[derive(Clone)]
pub struct PropsInjection {
    pub props_key: String,
    pub source: Selector,
}

impl fmt::Debug for PropsInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.props_key, self.source.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTOR FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// How a node turns its parent's resolved value into its own value.
///
/// The rules form a fixed priority chain: the first applicable rule wins even
/// when it yields `Absent`.
pub struct Resolution {
    pub property: String,
    pub key: Option<String>,
    /// Collection indexed by the `_key` rule instead of the parent value.
    pub collection: Option<Selector>,
    pub func: Option<FuncCall>,
    pub fallback: Value,
}

pub struct FuncCall {
    func: ValueFn,
    args: FuncArgs,
    cache: MemoCache,
}

pub enum FuncArgs {
    Selectors(Vec<Selector>),
    PropsKeys(Vec<String>),
}

impl FuncCall {
    pub fn new(func: ValueFn, args: FuncArgs) -> Self {
        FuncCall {
            func,
            args,
            cache: MemoCache::new(),
        }
    }

    fn call(&self, parent_value: &Value, state: &Value, props: &Value) -> Value {
        let args: Vec<Value> = match &self.args {
            FuncArgs::Selectors(selectors) => {
                selectors.iter().map(|s| s.select(state, props)).collect()
            }
            FuncArgs::PropsKeys(keys) => keys.iter().map(|k| props.get(k)).collect(),
        };
        let args = Value::list(args);

        // Re-run only when the parent value or an argument changed identity.
        self.cache.get_or_compute(parent_value, &args, || {
            (self.func)(parent_value, args.as_list().unwrap_or_default())
        })
    }
}

impl Resolution {
    pub fn resolve(&self, parent_value: &Value, state: &Value, props: &Value) -> Value {
        if let Some(props_key) = &self.key {
            if let Some(lookup) = props.get_defined(props_key) {
                return match &self.collection {
                    Some(collection) => collection.select(state, props).index(lookup),
                    None => parent_value.index(lookup),
                };
            }
        }

        if let Some(func) = &self.func {
            return func.call(parent_value, state, props);
        }

        if let Some(value) = parent_value.get_defined(&self.property) {
            return value.clone();
        }

        self.fallback.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTOR
// ═══════════════════════════════════════════════════════════════════════════════

impl Selector {
    fn build(name: String, rule: SelectRule, injections: Vec<PropsInjection>, log: bool) -> Self {
        Selector {
            inner: Arc::new(SelectorInner {
                name,
                rule,
                injections,
                cache: MemoCache::new(),
                log,
            }),
        }
    }

    /// The composition root when a specification supplies no `_selector`.
    pub fn identity() -> Self {
        Selector::build("identity".to_string(), SelectRule::Identity, Vec::new(), false)
    }

    /// Wraps a plain function as a memoized selector.
    pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Selector::build(name.into(), SelectRule::Custom(Arc::new(func)), Vec::new(), false)
    }

    /// A node selector that resolves a property against `parent`.
    pub fn property(
        name: impl Into<String>,
        parent: Selector,
        resolve: Resolution,
        injections: Vec<PropsInjection>,
        log: bool,
    ) -> Self {
        Selector::build(
            name.into(),
            SelectRule::Property { parent, resolve },
            injections,
            log,
        )
    }

    /// A node selector that evaluates a supplied `_selector`.
    pub fn delegate(
        name: impl Into<String>,
        target: Selector,
        injections: Vec<PropsInjection>,
        log: bool,
    ) -> Self {
        Selector::build(name.into(), SelectRule::Delegate(target), injections, log)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn injections(&self) -> &[PropsInjection] {
        &self.inner.injections
    }

    /// Evaluates the selector without props.
    pub fn select_state(&self, state: &Value) -> Value {
        self.select(state, &Value::Absent)
    }

    pub fn select(&self, state: &Value, props: &Value) -> Value {
        let props = self.inject_props(state, props);
        let inner = &self.inner;

        if let Some(hit) = inner.cache.get(state, &props) {
            return hit;
        }

        let result = self.evaluate(state, &props);
        inner
            .cache
            .set(state.clone(), props.clone(), result.clone());

        if inner.log {
            tracing::info!(
                selector = %inner.name,
                state = ?state,
                props = ?props,
                result = ?result,
                "selector recomputed"
            );
        }

        result
    }

    fn inject_props(&self, state: &Value, props: &Value) -> Value {
        let injections = &self.inner.injections;
        if injections.is_empty() {
            return props.clone();
        }

        let mut merged: IndexMap<String, Value> = props.as_map().cloned().unwrap_or_default();
        for injection in injections {
            // Ancestors see the caller's props, not the ones being assembled.
            let value = injection.source.select(state, props);
            merged.insert(injection.props_key.clone(), value);
        }
        Value::map(merged)
    }

    fn evaluate(&self, state: &Value, props: &Value) -> Value {
        match &self.inner.rule {
            SelectRule::Identity => state.clone(),
            SelectRule::Custom(func) => func(state, props),
            SelectRule::Delegate(target) => target.select(state, props),
            SelectRule::Property { parent, resolve } => {
                let parent_value = parent.select(state, props);
                resolve.resolve(&parent_value, state, props)
            }
        }
    }

    /// Number of times this selector missed its cache and recomputed.
    pub fn recomputations(&self) -> u64 {
        self.inner.cache.recomputations()
    }

    pub fn reset_recomputations(&self) {
        self.inner.cache.reset_recomputations();
    }

    /// Drops the cached result; the next call recomputes.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// True when both handles refer to the same compiled selector.
    pub fn same_as(&self, other: &Selector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("name", &self.inner.name)
            .field("injections", &self.inner.injections)
            .field("log", &self.inner.log)
            .finish()
    }
}
