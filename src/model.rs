use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Schema declarations
// ============================================================================

/// An `xs:element` declaration or reference inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    /// `module_prefix:local_name` for declarations, the `ref` value for references.
    pub qualified_name: CompactString,
    pub type_ref: Option<CompactString>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Simple,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaType {
    pub name: CompactString,
    pub kind: TypeKind,
    /// Nearest `restriction@base` / `extension@base`.
    pub base_ref: Option<CompactString>,
    pub sequence_children: Vec<SchemaElement>,
    /// Composition with child elements and no scalar value.
    pub is_tuple: bool,
}

pub fn is_item_type_name(name: &str) -> bool {
    name.ends_with("ItemType")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(n) => write!(f, "{n}"),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for MaxOccurs {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unbounded" | "n" | "*" => Ok(MaxOccurs::Unbounded),
            other => other.parse().map(MaxOccurs::Bounded),
        }
    }
}

impl Serialize for MaxOccurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Labels
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRecord {
    pub label: Option<String>,
    pub documentation: Option<String>,
    pub label_local: Option<String>,
    pub documentation_local: Option<String>,
}

impl LabelRecord {
    /// Overlays the fields that `other` sets.
    pub fn merge(&mut self, other: &LabelRecord) {
        if other.label.is_some() {
            self.label.clone_from(&other.label);
        }
        if other.documentation.is_some() {
            self.documentation.clone_from(&other.documentation);
        }
        if other.label_local.is_some() {
            self.label_local.clone_from(&other.label_local);
        }
        if other.documentation_local.is_some() {
            self.documentation_local.clone_from(&other.documentation_local);
        }
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some() || self.label_local.is_some()
    }
}

// ============================================================================
// Logical Hierarchical Model
// ============================================================================

/// One levelled row of the LHM. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LhmRow {
    pub level: usize,
    pub element: String,
    #[serde(rename = "type")]
    pub type_ref: String,
    pub path: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_tuple: bool,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    #[serde(default)]
    pub base_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub label_local: String,
    #[serde(default)]
    pub documentation_local: String,
}

// Accepts `True`/`False` as written by other tools.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
    }
}

impl LhmRow {
    pub fn set_labels(&mut self, labels: &LabelRecord) {
        self.label = labels.label.clone().unwrap_or_default();
        self.documentation = labels.documentation.clone().unwrap_or_default();
        self.label_local = labels.label_local.clone().unwrap_or_default();
        self.documentation_local = labels.documentation_local.clone().unwrap_or_default();
    }

    /// Prefix-qualified name, the last segment of `path`. Rows without a
    /// path fall back to `element`.
    pub fn qualified_name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ => &self.element,
        }
    }

    /// Path of the enclosing tuple, `None` at the root.
    pub fn parent_path(&self) -> Option<&str> {
        self.path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .filter(|parent| !parent.is_empty())
    }
}

// ============================================================================
// Instance trees
// ============================================================================

/// Value of a prefix-qualified instance element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InstanceValue {
    /// Leaf text.
    Scalar(String),
    /// A single container occurrence.
    Mapping(InstanceTree),
    /// Repeated siblings sharing one name, in document order.
    Sequence(Vec<InstanceValue>),
}

/// Ordered `qualified name -> value` mapping of one container's children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InstanceTree {
    pub entries: IndexMap<String, InstanceValue>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child; a repeated name turns the entry into a [`InstanceValue::Sequence`]
    /// kept at the position of its first occurrence.
    pub fn insert(&mut self, name: impl Into<String>, value: InstanceValue) {
        let name = name.into();
        match self.entries.get_mut(&name) {
            Some(InstanceValue::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, InstanceValue::Sequence(Vec::new()));
                *existing = InstanceValue::Sequence(vec![first, value]);
            }
            None => {
                self.entries.insert(name, value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&InstanceValue> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Flattened instance rows
// ============================================================================

/// One container occurrence with its leaves and dimension counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionedRow {
    pub element: String,
    pub path: String,
    pub level: usize,
    /// `counters[k]` is `d(k+1)`; `None` below the row's own level.
    pub counters: Vec<Option<u32>>,
    /// Container name (empty value) followed by its direct leaves.
    pub fields: IndexMap<String, String>,
}
