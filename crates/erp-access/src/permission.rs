//! Permission tokens and sets
//!
//! A permission is an opaque `domain:action` token. Checks are pure set
//! membership: no wildcards, no hierarchy.

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// `domain:action` permission token
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Token from a static string, usable in constants
    #[inline]
    #[must_use]
    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    /// Token from any string, unchecked
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Cow::Owned(token.into()))
    }

    /// Parse text, requiring the `domain:action` shape
    ///
    /// # Errors
    /// - `AccessError::MalformedPermission` if either half is missing
    pub fn parse(token: &str) -> Result<Self, AccessError> {
        match token.split_once(':') {
            Some((domain, action))
                if !domain.is_empty() && !action.is_empty() && !action.contains(':') =>
            {
                Ok(Self::new(token))
            }
            _ => Err(AccessError::MalformedPermission(token.to_string())),
        }
    }

    /// The token text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the colon (the whole token if there is none)
    #[must_use]
    pub fn domain(&self) -> &str {
        let token: &str = &self.0;
        token.split_once(':').map_or(token, |(domain, _)| domain)
    }

    /// Part after the colon
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, action)| action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolved set of permissions held by a user or granted to a role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact membership
    #[inline]
    #[must_use]
    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    /// Add a permission; returns `true` if it was new
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    /// Permissions in token order
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Number of permissions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = &'a Permission>>(iter: I) -> Self {
        Self(iter.into_iter().cloned().collect())
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<I: IntoIterator<Item = Permission>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
