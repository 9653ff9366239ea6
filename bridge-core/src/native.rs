//! The boundary between the view context and the native renderable host.
//!
//! A [`NativeSurface`] is whatever actually renders: a WebView document, a
//! native canvas, or the in-memory [`HeadlessSurface`] used by the host process
//! and by tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::css::CssVarSet;
use crate::node::Attributes;
use crate::transport::TransportId;

/// Opaque handle to a native renderable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Create a handle from a raw surface-specific value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw surface-specific value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The element currently holding input focus on a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveElement {
    /// Handle of the focused element.
    pub handle: NativeHandle,
    /// Lower-case tag name.
    pub tag: String,
    /// Text selection `(start, end)`, if the element has one.
    pub selection: Option<(u32, u32)>,
}

/// Trait for native rendering surfaces.
pub trait NativeSurface {
    /// The fixed root handle the page container binds to.
    fn root_handle(&self) -> NativeHandle;

    /// Create a fresh native element of the given tag.
    fn create_element(&mut self, tag: &str) -> NativeHandle;

    /// Apply one attribute to a native element.
    fn set_attribute(&mut self, handle: NativeHandle, name: &str, value: &serde_json::Value);

    /// Release a native element no longer referenced by any node.
    fn release(&mut self, handle: NativeHandle);

    /// Attach a stylesheet reference to the document head.
    fn append_stylesheet(&mut self, href: &str);

    /// Set the document title.
    fn set_title(&mut self, title: &str);

    /// Replace the published CSS variables.
    fn update_css_vars(&mut self, vars: &CssVarSet);

    /// Transport identity of the native container hosting this surface.
    fn container_id(&self) -> TransportId;

    /// The element currently holding focus.
    fn active_element(&self) -> Option<ActiveElement>;

    /// Move focus to an element, or clear it.
    fn set_active_element(&mut self, active: Option<ActiveElement>);
}

impl<T: NativeSurface + ?Sized> NativeSurface for Box<T> {
    fn root_handle(&self) -> NativeHandle {
        (**self).root_handle()
    }

    fn create_element(&mut self, tag: &str) -> NativeHandle {
        (**self).create_element(tag)
    }

    fn set_attribute(&mut self, handle: NativeHandle, name: &str, value: &serde_json::Value) {
        (**self).set_attribute(handle, name, value);
    }

    fn release(&mut self, handle: NativeHandle) {
        (**self).release(handle);
    }

    fn append_stylesheet(&mut self, href: &str) {
        (**self).append_stylesheet(href);
    }

    fn set_title(&mut self, title: &str) {
        (**self).set_title(title);
    }

    fn update_css_vars(&mut self, vars: &CssVarSet) {
        (**self).update_css_vars(vars);
    }

    fn container_id(&self) -> TransportId {
        (**self).container_id()
    }

    fn active_element(&self) -> Option<ActiveElement> {
        (**self).active_element()
    }

    fn set_active_element(&mut self, active: Option<ActiveElement>) {
        (**self).set_active_element(active);
    }
}

/// Opens a surface for each page a view context bootstraps.
pub trait SurfaceProvider: Send {
    /// Open the surface hosting `page`.
    fn open(&self, page: &TransportId) -> Box<dyn NativeSurface + Send>;
}

/// A native element held by a [`HeadlessSurface`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessElement {
    /// Tag name.
    pub tag: String,
    /// Applied attributes.
    pub attributes: Attributes,
}

/// In-memory surface that records every mutation.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    container_id: TransportId,
    next_handle: u64,
    elements: HashMap<NativeHandle, HeadlessElement>,
    stylesheets: Vec<String>,
    title: String,
    css_vars: CssVarSet,
    css_updates: usize,
    active: Option<ActiveElement>,
}

impl HeadlessSurface {
    const ROOT: NativeHandle = NativeHandle(0);

    /// Create a surface hosted by the container `container_id`.
    #[must_use]
    pub fn new(container_id: impl Into<TransportId>) -> Self {
        let mut root = HeadlessElement {
            tag: "div".to_string(),
            attributes: Attributes::new(),
        };
        root.attributes
            .insert("id".to_string(), serde_json::Value::from("app"));
        let mut elements = HashMap::new();
        elements.insert(Self::ROOT, root);
        Self {
            container_id: container_id.into(),
            next_handle: 1,
            elements,
            stylesheets: Vec::new(),
            title: String::new(),
            css_vars: CssVarSet::default(),
            css_updates: 0,
            active: None,
        }
    }

    /// Get a native element by handle.
    #[must_use]
    pub fn element(&self, handle: NativeHandle) -> Option<&HeadlessElement> {
        self.elements.get(&handle)
    }

    /// Number of live native elements, including the root.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Stylesheets attached so far, in order.
    #[must_use]
    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    /// Current document title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Last published CSS variables.
    #[must_use]
    pub fn css_vars(&self) -> &CssVarSet {
        &self.css_vars
    }

    /// How many times the CSS variables were published.
    #[must_use]
    pub fn css_updates(&self) -> usize {
        self.css_updates
    }
}

impl NativeSurface for HeadlessSurface {
    fn root_handle(&self) -> NativeHandle {
        Self::ROOT
    }

    fn create_element(&mut self, tag: &str) -> NativeHandle {
        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        self.elements.insert(
            handle,
            HeadlessElement {
                tag: tag.to_string(),
                attributes: Attributes::new(),
            },
        );
        handle
    }

    fn set_attribute(&mut self, handle: NativeHandle, name: &str, value: &serde_json::Value) {
        if let Some(element) = self.elements.get_mut(&handle) {
            element.attributes.insert(name.to_string(), value.clone());
        }
    }

    fn release(&mut self, handle: NativeHandle) {
        if handle == Self::ROOT {
            return;
        }
        self.elements.remove(&handle);
        if self.active.as_ref().is_some_and(|a| a.handle == handle) {
            self.active = None;
        }
    }

    fn append_stylesheet(&mut self, href: &str) {
        self.stylesheets.push(href.to_string());
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn update_css_vars(&mut self, vars: &CssVarSet) {
        self.css_vars = vars.clone();
        self.css_updates += 1;
    }

    fn container_id(&self) -> TransportId {
        self.container_id.clone()
    }

    fn active_element(&self) -> Option<ActiveElement> {
        self.active.clone()
    }

    fn set_active_element(&mut self, active: Option<ActiveElement>) {
        self.active = active;
    }
}

/// Provider that opens a [`HeadlessSurface`] per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessProvider;

impl SurfaceProvider for HeadlessProvider {
    fn open(&self, page: &TransportId) -> Box<dyn NativeSurface + Send> {
        Box::new(HeadlessSurface::new(page.clone()))
    }
}
