//! Deployment capability flags ("interfaces").
//!
//! A capability is a named boolean toggle controlling whether a control or
//! section is available. Lookups come in two flavours: [`Capabilities::has`]
//! treats an unspecified capability as disabled, [`Capabilities::flag_or`]
//! lets the caller pick the default for an unspecified capability.

use std::collections::BTreeMap;

pub const REVIEW: &str = "review";
pub const SKIP: &str = "skip";
pub const SUBMIT: &str = "submit";
pub const UPDATE: &str = "update";
pub const DENY_EMPTY: &str = "annotations:deny-empty";
pub const COMMENTS_REJECT: &str = "comments:reject";
pub const COMMENTS_SKIP: &str = "comments:skip";
pub const EDIT_HISTORY: &str = "edit-history";
pub const INSTRUCTION: &str = "instruction";
pub const GROUND_TRUTH: &str = "ground-truth";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    flags: BTreeMap<String, bool>,
}

impl Capabilities {
    /// Builds a set where every listed name is enabled.
    pub fn enabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: names.into_iter().map(|n| (n.into(), true)).collect(),
        }
    }

    /// Sets `name` explicitly, overriding any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set(name, value);
        self
    }

    /// `true` only when `name` was explicitly enabled.
    pub fn has(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// The explicit value of `name`, or `default` when it was never specified.
    pub fn flag_or(&self, name: &str, default: bool) -> bool {
        self.flags.get(name).copied().unwrap_or(default)
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Capabilities {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self {
            flags: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
