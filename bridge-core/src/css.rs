//! Layout-affecting CSS variables published by the view context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Left window inset variable.
pub const WINDOW_LEFT: &str = "--window-left";
/// Right window inset variable.
pub const WINDOW_RIGHT: &str = "--window-right";
/// Top window inset variable.
pub const WINDOW_TOP: &str = "--window-top";
/// Bottom window inset variable.
pub const WINDOW_BOTTOM: &str = "--window-bottom";
/// Status bar height variable.
pub const STATUS_BAR_HEIGHT: &str = "--status-bar-height";

/// A complete set of CSS variables.
///
/// Updates always replace the whole set; there is no partial patching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssVarSet(BTreeMap<String, String>);

impl CssVarSet {
    /// Compute the window geometry variables from numeric insets.
    ///
    /// Left and right insets are always `0px`.
    #[must_use]
    pub fn from_insets(statusbar_height: f64, window_top: f64, window_bottom: f64) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(WINDOW_LEFT.to_string(), px(0.0));
        vars.insert(WINDOW_RIGHT.to_string(), px(0.0));
        vars.insert(WINDOW_TOP.to_string(), px(window_top));
        vars.insert(WINDOW_BOTTOM.to_string(), px(window_bottom));
        vars.insert(STATUS_BAR_HEIGHT.to_string(), px(statusbar_height));
        Self(vars)
    }

    /// Get a variable's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CssVarSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Format a pixel length; integral values drop the fractional part.
fn px(value: f64) -> String {
    format!("{value}px")
}
