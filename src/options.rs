use crate::validate::CompileError;
use serde::{Deserialize, Serialize};

/// Naming conventions applied while compiling a specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Prepended to every derived selector name (`items` -> `selectItems`).
    pub name_prefix: String,
    /// Base name of the composition root (`state` -> `selectState`).
    pub root_name: String,
    /// Node keys starting with this prefix are private: compiled and usable by
    /// descendants, never exported.
    pub private_prefix: String,
    /// Reject explicit names that are not plain identifiers.
    pub validate_names: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            name_prefix: "select".to_string(),
            root_name: "state".to_string(),
            private_prefix: "$".to_string(),
            validate_names: true,
        }
    }
}

impl CompileOptions {
    pub fn from_json_str(json: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_private(&self, key: &str) -> bool {
        !self.private_prefix.is_empty() && key.starts_with(&self.private_prefix)
    }

    /// Property read by a node: the key without its private prefix.
    pub fn property_name<'k>(&self, key: &'k str) -> &'k str {
        if self.is_private(key) {
            &key[self.private_prefix.len()..]
        } else {
            key
        }
    }

    pub fn root_selector_name(&self) -> String {
        crate::renamer::create_selector_name(&self.name_prefix, &self.root_name)
    }
}
