//! Core types for control lookup

use std::collections::BTreeMap;

use autoflow_arguments::{InArgument, PredicateArgument};
use autoflow_core_types::{BoundingBox, ControlHandle};
use serde::{Deserialize, Serialize};

/// How far below the search root candidates are collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSearchScope {
    Children,
    #[default]
    Descendants,
}

/// Anchor on a control's bounds that offsets are measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotPoint {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_interval_ms() -> u64 {
    500
}

/// One node of a control identity chain.
///
/// `next` narrows the search: every node but the last must resolve a single
/// control, which becomes the search root of the following node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlIdentity {
    #[serde(default)]
    pub application_id: String,

    /// Backend discriminator (`button`, `edit`, `window`, ...)
    pub control_type: String,

    /// Properties a candidate must carry; `name` matches the handle name
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub search_scope: ControlSearchScope,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default)]
    pub pivot_point: PivotPoint,

    #[serde(default)]
    pub x_offset: f64,

    #[serde(default)]
    pub y_offset: f64,

    /// Bounds captured at recording time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<ControlIdentity>>,
}

impl ControlIdentity {
    pub fn new(application_id: impl Into<String>, control_type: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            control_type: control_type.into(),
            properties: BTreeMap::new(),
            search_scope: ControlSearchScope::default(),
            retry_attempts: default_retry_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            pivot_point: PivotPoint::default(),
            x_offset: 0.0,
            y_offset: 0.0,
            bounding_box: None,
            next: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_scope(mut self, scope: ControlSearchScope) -> Self {
        self.search_scope = scope;
        self
    }

    pub fn with_retry(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_interval_ms = interval_ms;
        self
    }

    /// Append `next` at the end of the chain.
    pub fn then(mut self, next: ControlIdentity) -> Self {
        append(&mut self.next, next);
        self
    }

    /// Nodes from this one to the end of the chain.
    pub fn chain(&self) -> impl Iterator<Item = &ControlIdentity> {
        std::iter::successors(Some(self), |node| node.next.as_deref())
    }

    pub fn chain_len(&self) -> usize {
        self.chain().count()
    }

    /// Copy this node's application id onto every following node.
    pub fn propagate_application_id(&mut self) {
        let application_id = self.application_id.clone();
        let mut node = self.next.as_deref_mut();
        while let Some(current) = node {
            current.application_id.clone_from(&application_id);
            node = current.next.as_deref_mut();
        }
    }

    /// Point to act on within `bounds`: the pivot plus configured offsets.
    pub fn clickable_point(&self, bounds: &BoundingBox) -> (f64, f64) {
        let (x, y) = match self.pivot_point {
            PivotPoint::Center => (bounds.x + bounds.width / 2.0, bounds.y + bounds.height / 2.0),
            PivotPoint::TopLeft => (bounds.x, bounds.y),
            PivotPoint::TopRight => (bounds.x + bounds.width, bounds.y),
            PivotPoint::BottomLeft => (bounds.x, bounds.y + bounds.height),
            PivotPoint::BottomRight => (bounds.x + bounds.width, bounds.y + bounds.height),
        };
        (x + self.x_offset, y + self.y_offset)
    }

    /// Whether `handle` satisfies this node's type and property constraints.
    pub fn matches(&self, handle: &ControlHandle) -> bool {
        if !self.control_type.is_empty() && !self.control_type.eq_ignore_ascii_case(&handle.control_type)
        {
            return false;
        }
        self.properties.iter().all(|(key, expected)| {
            if key == "name" {
                handle.name.as_deref() == Some(expected.as_str())
            } else {
                handle.property(key) == Some(expected.as_str())
            }
        })
    }
}

fn append(slot: &mut Option<Box<ControlIdentity>>, next: ControlIdentity) {
    match slot {
        Some(node) => append(&mut node.next, next),
        None => *slot = Some(Box::new(next)),
    }
}

/// Persisted control: identity chain plus designer metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlDescription {
    pub control_id: String,
    pub control_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_image: Option<String>,
    pub control_details: ControlIdentity,
}

impl ControlDescription {
    pub fn new(
        control_id: impl Into<String>,
        control_name: impl Into<String>,
        control_details: ControlIdentity,
    ) -> Self {
        Self {
            control_id: control_id.into(),
            control_name: control_name.into(),
            group_name: None,
            control_image: None,
            control_details,
        }
    }

    pub fn application_id(&self) -> &str {
        &self.control_details.application_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupType {
    /// Search under the application root
    #[default]
    Default,
    /// Search under the control resolved by the owning control entity
    Relative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Take the first candidate
    #[default]
    FindSingle,
    /// Keep every candidate, then apply the filter
    FindAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Unfiltered,
    Index,
    Custom,
}

/// Lookup policy of a control entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLookupSpec {
    /// Description path, relative to the references directory
    pub control_file: String,
    #[serde(default)]
    pub lookup_type: LookupType,
    #[serde(default)]
    pub lookup_mode: LookupMode,
    #[serde(default)]
    pub filter_mode: FilterMode,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub filter: PredicateArgument<ControlHandle>,
    #[serde(default)]
    pub search_root: InArgument<ControlHandle>,
    #[serde(default)]
    pub cache_control: bool,
}

impl ControlLookupSpec {
    pub fn new(control_file: impl Into<String>) -> Self {
        Self {
            control_file: control_file.into(),
            lookup_type: LookupType::Default,
            lookup_mode: LookupMode::FindSingle,
            filter_mode: FilterMode::Unfiltered,
            index: 0,
            filter: PredicateArgument::new(),
            search_root: InArgument::new(),
            cache_control: false,
        }
    }

    pub fn relative(mut self) -> Self {
        self.lookup_type = LookupType::Relative;
        self
    }

    pub fn find_all(mut self) -> Self {
        self.lookup_mode = LookupMode::FindAll;
        self
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.lookup_mode = LookupMode::FindAll;
        self.filter_mode = FilterMode::Index;
        self.index = index;
        self
    }

    pub fn filtered_by(mut self, script_file: impl Into<String>) -> Self {
        self.lookup_mode = LookupMode::FindAll;
        self.filter_mode = FilterMode::Custom;
        self.filter = PredicateArgument::scripted(script_file);
        self
    }

    pub fn with_search_root(mut self, search_root: InArgument<ControlHandle>) -> Self {
        self.search_root = search_root;
        self
    }

    pub fn cached(mut self) -> Self {
        self.cache_control = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_round_trip_keeps_order_and_application() {
        let chain = ControlIdentity::new("notepad", "window")
            .with_property("name", "Untitled - Notepad")
            .then(ControlIdentity::new("", "pane"))
            .then(ControlIdentity::new("", "button").with_property("name", "Save"));
        let description = ControlDescription::new("save", "Save button", chain);

        let text = serde_json::to_string(&description).unwrap();
        let mut loaded: ControlDescription = serde_json::from_str(&text).unwrap();
        loaded.control_details.propagate_application_id();

        let types: Vec<&str> = loaded
            .control_details
            .chain()
            .map(|node| node.control_type.as_str())
            .collect();
        assert_eq!(types, vec!["window", "pane", "button"]);
        assert!(loaded
            .control_details
            .chain()
            .all(|node| node.application_id == "notepad"));
    }

    #[test]
    fn clickable_point_uses_pivot_and_offset() {
        let bounds = BoundingBox::new(100.0, 50.0, 40.0, 20.0);
        let mut identity = ControlIdentity::new("app", "button");
        assert_eq!(identity.clickable_point(&bounds), (120.0, 60.0));
        identity.pivot_point = PivotPoint::BottomRight;
        identity.x_offset = -5.0;
        identity.y_offset = -2.0;
        assert_eq!(identity.clickable_point(&bounds), (135.0, 68.0));
    }

    #[test]
    fn matching_checks_type_name_and_properties() {
        let identity = ControlIdentity::new("app", "Button")
            .with_property("name", "Save")
            .with_property("automation_id", "btnSave");
        let handle = ControlHandle::new("h1", "button")
            .with_name("Save")
            .with_property("automation_id", "btnSave");
        assert!(identity.matches(&handle));
        assert!(!identity.matches(&handle.clone().with_name("Cancel")));
        assert!(!identity.matches(&ControlHandle::new("h2", "edit").with_name("Save")));
    }

    #[test]
    fn lookup_spec_defaults_from_minimal_document() {
        let spec: ControlLookupSpec =
            serde_json::from_value(serde_json::json!({"control_file": "app/save.json"})).unwrap();
        assert_eq!(spec.lookup_type, LookupType::Default);
        assert_eq!(spec.lookup_mode, LookupMode::FindSingle);
        assert!(!spec.search_root.is_configured());
        assert!(!spec.cache_control);
    }
}
