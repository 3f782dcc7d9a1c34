//! Whitelist validation of field references.

use std::collections::BTreeSet;

use super::ast::{Node, Operand};
use super::error::{FilterResult, QuerySyntaxError};
use super::suggest::find_similar_name;

/// The wildcard entry that accepts every field.
pub const WILDCARD: &str = "*";

/// The set of field names a filter may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedKeys {
    /// Every field reference is accepted.
    Any,
    /// Only the listed fields are accepted.
    Only(BTreeSet<String>),
}

impl AllowedKeys {
    /// Builds the key set from a list of names.
    ///
    /// A list containing `"*"` is the wildcard.
    ///
    /// # Example
    ///
    /// ```
    /// use restfilter_rs::AllowedKeys;
    ///
    /// assert_eq!(AllowedKeys::from_keys(["*"]), AllowedKeys::Any);
    /// assert!(AllowedKeys::from_keys(["id", "name"]).contains("name"));
    /// ```
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        if keys.contains(WILDCARD) {
            AllowedKeys::Any
        } else {
            AllowedKeys::Only(keys)
        }
    }

    /// Returns true if the key may be referenced.
    pub fn contains(&self, key: &str) -> bool {
        match self {
            AllowedKeys::Any => true,
            AllowedKeys::Only(keys) => keys.contains(key),
        }
    }

    /// Returns true for the wildcard set.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, AllowedKeys::Any)
    }

    fn check(&self, key: &str) -> FilterResult<()> {
        match self {
            AllowedKeys::Any => Ok(()),
            AllowedKeys::Only(keys) if keys.contains(key) => Ok(()),
            AllowedKeys::Only(keys) => Err(QuerySyntaxError::unknown_key(
                key,
                find_similar_name(key, keys.iter().map(String::as_str)),
            )),
        }
    }
}

/// Confirms that every field referenced by `node` is allowed.
///
/// Visits both sides of comparisons, the subjects of `in` and `is null`
/// checks, and every function argument at any depth. Stops at the first
/// unknown field.
///
/// # Errors
///
/// Returns `QuerySyntaxError::UnknownKey` naming the first rejected field.
pub fn validate(node: &Node, allowed: &AllowedKeys) -> FilterResult<()> {
    if allowed.is_wildcard() {
        return Ok(());
    }

    match node {
        Node::Comparison { left, right, .. } => {
            validate_operand(left, allowed)?;
            validate_operand(right, allowed)
        }
        Node::In { field, .. } | Node::Null { field, .. } => allowed.check(field),
        Node::And(left, right) | Node::Or(left, right) => {
            validate(left, allowed)?;
            validate(right, allowed)
        }
        Node::Group(inner) => validate(inner, allowed),
    }
}

fn validate_operand(operand: &Operand, allowed: &AllowedKeys) -> FilterResult<()> {
    match operand {
        Operand::Field(name) => allowed.check(name),
        Operand::Literal(_) => Ok(()),
        Operand::Function { args, .. } => args
            .iter()
            .try_for_each(|arg| validate_operand(arg, allowed)),
    }
}
