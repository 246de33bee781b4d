// Instance document parsing and flattening into dimensioned rows
use crate::hierarchy::Lhm;
use crate::model::{DimensionedRow, InstanceTree, InstanceValue, LhmRow};
use crate::namespaces::{self, XBRLI};
use crate::tidy::TidyTable;
use crate::xml::{self, XmlElement};
use crate::{Error, Result};
use ahash::AHashMap;
use indexmap::{IndexMap, IndexSet};
use std::path::Path;

/// Reads an XBRL-GL instance into a prefix-qualified tree.
pub struct InstanceParser {
    root_element: String,
}

impl Default for InstanceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceParser {
    pub fn new() -> Self {
        Self {
            root_element: "accountingEntries".to_string(),
        }
    }

    pub fn with_root_element(mut self, local_name: impl Into<String>) -> Self {
        self.root_element = local_name.into();
        self
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<InstanceTree> {
        let path = path.as_ref();
        crate::require_file("instance", path)?;
        let root = xml::parse_file(path)?;
        self.parse_root(&root)
    }

    pub fn parse_bytes(&self, data: &[u8], path: &Path) -> Result<InstanceTree> {
        let root = xml::parse_bytes(data, path)?;
        self.parse_root(&root)
    }

    /// The returned tree holds one entry per root element name; several
    /// `accountingEntries` become a sequence.
    pub fn parse_root(&self, root: &XmlElement) -> Result<InstanceTree> {
        let mut tree = InstanceTree::new();

        if root.local_name == self.root_element {
            tree.insert(qualified_name(root), convert(root));
            return Ok(tree);
        }
        if !root.is(XBRLI, "xbrl") {
            log::warn!("Instance root is {}, expected xbrli:xbrl", root.raw_name());
        }

        for child in root.children.iter().filter(|c| c.local_name == self.root_element) {
            tree.insert(qualified_name(child), convert(child));
        }
        if tree.is_empty() {
            return Err(Error::NotFound(format!(
                "no {} element in instance",
                self.root_element
            )));
        }
        Ok(tree)
    }
}

/// Canonical `gl-<m>:` prefix when the namespace is known, else the
/// document's own prefix.
fn qualified_name(element: &XmlElement) -> String {
    let prefix = element
        .namespace
        .as_deref()
        .and_then(namespaces::prefix_for)
        .or_else(|| element.prefix.clone());
    match prefix {
        Some(prefix) => format!("{prefix}:{}", element.local_name),
        None => element.local_name.clone(),
    }
}

fn convert(element: &XmlElement) -> InstanceValue {
    if element.children.is_empty() {
        return InstanceValue::Scalar(element.text.clone());
    }
    let mut tree = InstanceTree::new();
    for child in &element.children {
        tree.insert(qualified_name(child), convert(child));
    }
    InstanceValue::Mapping(tree)
}

/// Flattens instance trees into one row per container occurrence, with
/// per-level occurrence counters.
pub struct Flattener<'a> {
    lhm: &'a Lhm,
    by_path: AHashMap<&'a str, &'a LhmRow>,
    by_name: AHashMap<&'a str, &'a LhmRow>,
}

struct Counters {
    values: Vec<Option<u32>>,
}

impl Counters {
    /// Enters a container at `level`. Every container under the same parent
    /// counts on, whatever its name; deeper slots reset.
    fn enter(&mut self, level: usize) {
        if self.values.len() < level {
            self.values.resize(level, None);
        }
        let slot = level - 1;
        self.values[slot] = Some(self.values[slot].map_or(1, |n| n + 1));
        for deeper in &mut self.values[level..] {
            *deeper = None;
        }
    }

    fn snapshot(&self, level: usize) -> Vec<Option<u32>> {
        self.values[..level].to_vec()
    }
}

impl<'a> Flattener<'a> {
    pub fn new(lhm: &'a Lhm) -> Self {
        Self {
            lhm,
            by_path: lhm.index_by_path(),
            by_name: lhm.index_by_qualified_name(),
        }
    }

    fn lookup(&self, path: &str, element: &str) -> Option<&'a LhmRow> {
        self.by_path
            .get(path)
            .or_else(|| self.by_name.get(element))
            .copied()
    }

    fn is_container(&self, path: &str, element: &str) -> bool {
        self.lookup(path, element).is_some_and(|row| row.is_tuple)
    }

    pub fn flatten(&self, tree: &InstanceTree) -> Vec<DimensionedRow> {
        let mut counters = Counters { values: Vec::new() };
        let mut rows = Vec::new();
        for (name, value) in &tree.entries {
            self.visit(name, value, "", 1, &mut counters, &mut rows);
        }

        let dimensions = rows.iter().map(|r| r.level).max().unwrap_or(0);
        for row in &mut rows {
            row.counters.resize(dimensions, None);
        }
        log::info!("Flattened {} rows over {} dimensions", rows.len(), dimensions);
        rows
    }

    fn visit(
        &self,
        name: &str,
        value: &InstanceValue,
        parent_path: &str,
        level: usize,
        counters: &mut Counters,
        rows: &mut Vec<DimensionedRow>,
    ) {
        match value {
            InstanceValue::Sequence(items) => {
                for item in items {
                    self.visit(name, item, parent_path, level, counters, rows);
                }
            }
            InstanceValue::Mapping(tree) => {
                self.enter_container(name, tree, parent_path, level, counters, rows)
            }
            InstanceValue::Scalar(text) => {
                let path = format!("{parent_path}/{name}");
                if !text.is_empty() {
                    log::warn!("Text content on container {path} ignored");
                }
                self.enter_container(name, &InstanceTree::new(), parent_path, level, counters, rows)
            }
        }
    }

    fn enter_container(
        &self,
        name: &str,
        tree: &InstanceTree,
        parent_path: &str,
        level: usize,
        counters: &mut Counters,
        rows: &mut Vec<DimensionedRow>,
    ) {
        let path = format!("{parent_path}/{name}");
        counters.enter(level);

        let mut fields = IndexMap::new();
        fields.insert(name.to_string(), String::new());
        let mut containers = Vec::new();

        for (child, value) in &tree.entries {
            let child_path = format!("{path}/{child}");
            match value {
                InstanceValue::Scalar(text) if !self.is_container(&child_path, child) => {
                    fields.insert(child.clone(), text.clone());
                }
                InstanceValue::Sequence(items)
                    if items.iter().all(|i| matches!(i, InstanceValue::Scalar(_)))
                        && !self.is_container(&child_path, child) =>
                {
                    log::warn!("Repeated leaf {child_path} joined into one cell");
                    let joined = items
                        .iter()
                        .filter_map(|i| match i {
                            InstanceValue::Scalar(text) => Some(text.as_str()),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    fields.insert(child.clone(), joined);
                }
                _ => containers.push((child, value)),
            }
        }

        rows.push(DimensionedRow {
            element: name.to_string(),
            path: path.clone(),
            level,
            counters: counters.snapshot(level),
            fields,
        });

        for (child, value) in containers {
            self.visit(child, value, &path, level + 1, counters, rows);
        }
    }

    /// Tidy table with `d1..dN` followed by element columns in LHM order.
    /// Elements unknown to the LHM are appended in order of appearance.
    pub fn to_tidy(&self, rows: &[DimensionedRow]) -> TidyTable {
        let dimensions = rows.iter().map(|r| r.counters.len()).max().unwrap_or(0);

        let mut present: IndexSet<&str> = IndexSet::new();
        for row in rows {
            present.extend(row.fields.keys().map(String::as_str));
        }
        let order = self.lhm.element_order();

        let mut columns: Vec<String> = (1..=dimensions).map(|k| format!("d{k}")).collect();
        columns.extend(
            order
                .iter()
                .filter(|element| present.contains(*element))
                .map(|element| element.to_string()),
        );
        for extra in present.iter().filter(|element| !order.contains(element)) {
            log::warn!("Element {extra} not in hierarchy; appended as last column");
            columns.push(extra.to_string());
        }

        let table_rows = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = (0..dimensions)
                    .map(|k| {
                        row.counters
                            .get(k)
                            .copied()
                            .flatten()
                            .map(|n| n.to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                for column in &columns[dimensions..] {
                    cells.push(row.fields.get(column).cloned().unwrap_or_default());
                }
                cells
            })
            .collect();

        TidyTable {
            columns,
            rows: table_rows,
        }
    }
}
