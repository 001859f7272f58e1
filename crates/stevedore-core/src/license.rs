//! # License Gate
//!
//! Entitlement check run before a component may be rendered.
//!
//! The gate only compares membership. It does not issue, store or verify
//! entitlements; the granted feature set comes from outside.

use crate::descriptor::Component;
use crate::types::LicenseTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

/// The set of license features granted for an installer run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedFeatures(BTreeSet<LicenseTag>);

impl GrantedFeatures {
    /// No features granted.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Grant one more feature.
    pub fn grant(&mut self, tag: impl Into<String>) {
        let tag = LicenseTag::new(tag);
        if !tag.is_empty() {
            self.0.insert(tag);
        }
    }

    #[must_use]
    pub fn contains(&self, tag: &LicenseTag) -> bool {
        self.0.contains(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Granted tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &LicenseTag> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for GrantedFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut granted = Self::none();
        for tag in iter {
            granted.grant(tag);
        }
        granted
    }
}

/// Parse a comma-separated list such as `"console, gateway"`.
///
/// Whitespace around entries and empty entries are ignored.
impl FromStr for GrantedFeatures {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',').map(str::trim).collect())
    }
}

/// The License Gate.
pub struct LicenseGate;

impl LicenseGate {
    /// Whether a component's license tag is granted.
    ///
    /// Depends on nothing but the tag and the granted set. An empty tag is
    /// never authorized.
    pub fn authorize<C: Component + ?Sized>(component: &C, granted: &GrantedFeatures) -> bool {
        let tag = component.license_tag();
        !tag.is_empty() && granted.contains(tag)
    }
}
