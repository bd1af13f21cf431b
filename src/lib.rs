//! # Selector Compiler
//!
//! Compiles a nested, declarative specification of application state into a
//! flat mapping of named, memoized selectors.
//!
//! ## Compilation Invariants
//!
//! 1. **Root Accessor**: the mapping always contains `selectState`, the
//!    specification's own `_selector` or the identity selector. No descendant
//!    can displace it.
//!
//! 2. **One Entry Per Exported Node**: every exported node resolves to exactly
//!    one name, possibly an alternative name after a collision. A collision that
//!    cannot be resolved rejects the whole specification.
//!
//! 3. **Resolution Priority**: a node resolves its value in this exact order:
//!    1. `_key` lookup when props carry the key, into the parent value or
//!       the nearest preceding sibling collection of an untyped parent
//!    2. `_func` over the parent value and its arguments
//!    3. the parent value's own defined property
//!    4. `_default`, else the `_type` class default, else absent
//!
//! 4. **Single-Slot Memoization**: each selector caches its latest
//!    `(state, props)` call; a shallow-equal call returns the identical result.
//!
//! 5. **Eager Errors**: configuration errors surface while compiling, never
//!    while selecting.

mod cache;
mod options;
mod parse;
mod renamer;
mod scope;
mod selector;
mod spec;
mod validate;
mod value;
mod walker;

#[cfg(test)]
mod collision_tests;

pub use cache::MemoCache;
pub use options::CompileOptions;
pub use parse::{parse_spec, parse_spec_str, FunctionRegistry};
pub use renamer::{create_selector_name, CompiledSelectors, NameResolver, SelectorRecord};
pub use scope::{is_reserved_directive, RESERVED_DIRECTIVES};
pub use selector::{FuncArgs, FuncCall, PropsInjection, Resolution, SelectFn, Selector, ValueFn};
pub use spec::{Directive, NodeSettings, SpecEntry, SpecNode, ValueType};
pub use validate::*;
pub use value::{identical, shallow_equal, Value};
pub use walker::{SpecWalker, WalkOutput};

/// Compiles a specification with the default naming conventions.
pub fn create_selectors(spec: &SpecNode) -> Result<CompiledSelectors, CompileError> {
    create_selectors_with(spec, &CompileOptions::default())
}

pub fn create_selectors_with(
    spec: &SpecNode,
    options: &CompileOptions,
) -> Result<CompiledSelectors, CompileError> {
    let WalkOutput { root, records } = SpecWalker::new(options).walk_root(spec)?;
    let root_name = options.root_selector_name();
    let compiled = NameResolver::new(&root_name, &root).assemble(&records)?;

    tracing::debug!(
        records = records.len(),
        selectors = compiled.len(),
        "compiled selector specification"
    );
    Ok(compiled)
}

/// Loads a JSON specification and compiles it.
pub fn create_selectors_from_json(
    source: &str,
    registry: &FunctionRegistry,
    options: &CompileOptions,
) -> Result<CompiledSelectors, CompileError> {
    let spec = parse_spec_str(source, registry)?;
    create_selectors_with(&spec, options)
}
