//! Built-in widgets and the tag-to-constructor table.
//!
//! Widgets form a closed enumeration dispatched with a single `match`. The
//! [`WidgetTable`] maps tag names to constructors and is built once at startup;
//! hosts can [`register`](WidgetTable::register) extra constructors before the
//! first page is created.

use std::collections::HashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::node::{Attributes, NodeId};

/// Default `maxlength` for text fields.
pub const DEFAULT_MAX_LENGTH: i64 = 140;

/// Default image scaling mode.
pub const DEFAULT_IMAGE_MODE: &str = "scaleToFill";

/// Constructor for a widget: `(identity, parent, initial attributes)`.
pub type WidgetConstructor = fn(NodeId, Option<NodeId>, &Attributes) -> BridgeResult<Widget>;

/// State shared by editable text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    /// Current value.
    pub value: String,
    /// Placeholder text.
    pub placeholder: String,
    /// Maximum input length; negative means unlimited.
    pub max_length: i64,
}

/// A built-in widget.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Plain layout container.
    View,

    /// Inline text.
    Text {
        /// Whether the text can be selected.
        selectable: bool,
    },

    /// Image.
    Image {
        /// Image source URI.
        src: String,
        /// Scaling mode.
        mode: String,
    },

    /// Single-line text input.
    Input {
        /// Field state.
        field: FieldState,
        /// Input type (`text`, `number`, `password`, ...).
        input_type: String,
    },

    /// Multi-line text input.
    Textarea {
        /// Field state.
        field: FieldState,
    },

    /// Push button.
    Button {
        /// Whether the button ignores taps.
        disabled: bool,
    },

    /// Scrollable container.
    ScrollView {
        /// Horizontal scrolling enabled.
        scroll_x: bool,
        /// Vertical scrolling enabled.
        scroll_y: bool,
    },

    /// A widget contributed through [`WidgetTable::register`].
    Custom {
        /// Registered tag.
        tag: String,
        /// Constructor-defined state.
        state: Attributes,
    },
}

impl Widget {
    /// The tag this widget is registered under.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Input { .. } => "input",
            Self::Textarea { .. } => "textarea",
            Self::Button { .. } => "button",
            Self::ScrollView { .. } => "scroll-view",
            Self::Custom { tag, .. } => tag,
        }
    }

    /// Native tag the widget renders into.
    #[must_use]
    pub fn native_tag(&self) -> &str {
        match self {
            Self::View | Self::ScrollView { .. } => "div",
            Self::Text { .. } => "span",
            Self::Image { .. } => "img",
            Self::Input { .. } => "input",
            Self::Textarea { .. } => "textarea",
            Self::Button { .. } => "button",
            Self::Custom { tag, .. } => tag,
        }
    }

    /// Whether the widget holds an editable text selection.
    #[must_use]
    pub fn is_text_field(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Textarea { .. })
    }
}

/// Typed reads of initial attributes.
///
/// Absent attributes take the default; present attributes of the wrong type are
/// construction failures.
struct AttrReader<'a> {
    tag: &'static str,
    attrs: &'a Attributes,
}

impl<'a> AttrReader<'a> {
    fn new(tag: &'static str, attrs: &'a Attributes) -> Self {
        Self { tag, attrs }
    }

    fn mismatch(&self, name: &str, expected: &str) -> BridgeError {
        BridgeError::construction(self.tag, format!("attribute `{name}` must be {expected}"))
    }

    fn string(&self, name: &str, default: &str) -> BridgeResult<String> {
        match self.attrs.get(name) {
            None | Some(serde_json::Value::Null) => Ok(default.to_string()),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(self.mismatch(name, "a string")),
        }
    }

    fn bool(&self, name: &str, default: bool) -> BridgeResult<bool> {
        match self.attrs.get(name) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(serde_json::Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.mismatch(name, "a boolean")),
        }
    }

    /// Numeric attribute coerced leniently: numbers truncate, numeric strings
    /// parse, anything else falls back to `default`.
    #[allow(clippy::cast_possible_truncation)]
    fn coerce_int(&self, name: &str, default: i64) -> i64 {
        let value = match self.attrs.get(name) {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match value {
            Some(v) if v.is_finite() => v.trunc() as i64,
            _ => default,
        }
    }

    fn field(&self) -> BridgeResult<FieldState> {
        Ok(FieldState {
            value: self.string("value", "")?,
            placeholder: self.string("placeholder", "")?,
            max_length: self.coerce_int("maxlength", DEFAULT_MAX_LENGTH),
        })
    }
}

fn build_view(_: NodeId, _: Option<NodeId>, _: &Attributes) -> BridgeResult<Widget> {
    Ok(Widget::View)
}

fn build_text(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("text", attrs);
    Ok(Widget::Text {
        selectable: r.bool("selectable", false)?,
    })
}

fn build_image(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("image", attrs);
    Ok(Widget::Image {
        src: r.string("src", "")?,
        mode: r.string("mode", DEFAULT_IMAGE_MODE)?,
    })
}

fn build_input(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("input", attrs);
    Ok(Widget::Input {
        field: r.field()?,
        input_type: r.string("type", "text")?,
    })
}

fn build_textarea(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("textarea", attrs);
    Ok(Widget::Textarea { field: r.field()? })
}

fn build_button(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("button", attrs);
    Ok(Widget::Button {
        disabled: r.bool("disabled", false)?,
    })
}

fn build_scroll_view(_: NodeId, _: Option<NodeId>, attrs: &Attributes) -> BridgeResult<Widget> {
    let r = AttrReader::new("scroll-view", attrs);
    Ok(Widget::ScrollView {
        scroll_x: r.bool("scrollX", false)?,
        scroll_y: r.bool("scrollY", false)?,
    })
}

/// Table mapping tag names to widget constructors.
#[derive(Clone)]
pub struct WidgetTable {
    constructors: HashMap<String, WidgetConstructor>,
}

impl std::fmt::Debug for WidgetTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("WidgetTable").field("tags", &tags).finish()
    }
}

impl WidgetTable {
    /// An empty table; every tag falls back to a generic element.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// The table of built-in widgets.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.register("view", build_view);
        table.register("text", build_text);
        table.register("image", build_image);
        table.register("input", build_input);
        table.register("textarea", build_textarea);
        table.register("button", build_button);
        table.register("scroll-view", build_scroll_view);
        table
    }

    /// Register a constructor for `tag`, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, constructor: WidgetConstructor) {
        self.constructors.insert(tag.into(), constructor);
    }

    /// Look up the constructor for `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<WidgetConstructor> {
        self.constructors.get(tag).copied()
    }

    /// Whether `tag` has a specialized constructor.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if no tags are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for WidgetTable {
    fn default() -> Self {
        Self::builtin()
    }
}
