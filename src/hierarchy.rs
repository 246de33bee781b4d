//! Walks the tuple hierarchy from the root type into a levelled row list.

use crate::config::TaxonomyConfig;
use crate::linkbase::LabelMap;
use crate::model::{LhmRow, MaxOccurs, SchemaElement, SchemaType};
use crate::namespaces;
use crate::schema::SchemaSet;
use crate::{Error, Result};
use ahash::AHashMap;
use compact_str::CompactString;

/// Non-fatal gaps found while walking. Each entry is a row path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Element or type references that resolved nowhere.
    pub unresolved: Vec<String>,
    /// Tuples not expanded because their type is already an ancestor.
    pub recursive: Vec<String>,
}

impl WalkReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.recursive.is_empty()
    }
}

/// The Logical Hierarchical Model: rows in depth-first schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lhm {
    pub rows: Vec<LhmRow>,
    pub report: WalkReport,
}

impl Lhm {
    pub fn from_rows(rows: Vec<LhmRow>) -> Self {
        Self {
            rows,
            report: WalkReport::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_level(&self) -> usize {
        self.rows.iter().map(|r| r.level).max().unwrap_or(0)
    }

    /// Path -> row. The first row wins when a path repeats.
    pub fn index_by_path(&self) -> AHashMap<&str, &LhmRow> {
        let mut index = AHashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.path.as_str()).or_insert(row);
        }
        index
    }

    /// Qualified element name -> first row declaring it.
    pub fn index_by_qualified_name(&self) -> AHashMap<&str, &LhmRow> {
        let mut index = AHashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.qualified_name()).or_insert(row);
        }
        index
    }

    /// Distinct qualified element names in row order.
    pub fn element_order(&self) -> Vec<&str> {
        let mut seen = ahash::AHashSet::new();
        self.rows
            .iter()
            .map(LhmRow::qualified_name)
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Direct children of the row at `index`, in order.
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = &LhmRow> {
        let parent = &self.rows[index];
        let level = parent.level;
        self.rows[index + 1..]
            .iter()
            .take_while(move |r| r.level > level)
            .filter(move |r| r.level == level + 1)
    }
}

pub struct HierarchyWalker<'a> {
    schemas: &'a SchemaSet,
    labels: &'a LabelMap,
    config: &'a TaxonomyConfig,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(schemas: &'a SchemaSet, labels: &'a LabelMap, config: &'a TaxonomyConfig) -> Self {
        Self {
            schemas,
            labels,
            config,
        }
    }

    pub fn walk(&self) -> Result<Lhm> {
        let root_type = self
            .schemas
            .schema_type(&self.config.root_type)
            .ok_or_else(|| Error::NotFound(format!("root type {}", self.config.root_type)))?;

        let qualified = format!("gl-{}:{}", self.config.root_module, self.config.root_element);
        let type_ref = self
            .schemas
            .element_type(&qualified)
            .map(str::to_string)
            .unwrap_or_else(|| format!("gl-{}:{}", self.config.root_module, root_type.name));
        let path = format!("/{qualified}");

        let mut lhm = Lhm::default();
        let mut root = LhmRow {
            level: 1,
            element: self.config.root_element.clone(),
            type_ref,
            path: path.clone(),
            is_tuple: true,
            min_occurs: 1,
            max_occurs: MaxOccurs::Unbounded,
            base_type: String::new(),
            label: String::new(),
            documentation: String::new(),
            label_local: String::new(),
            documentation_local: String::new(),
        };
        if let Some(labels) = self.labels.lookup(&qualified) {
            root.set_labels(labels);
        }
        lhm.rows.push(root);

        let mut ancestors = vec![root_type.name.clone()];
        self.walk_type(root_type, &path, 1, &mut ancestors, &mut lhm);

        log::info!(
            "Walked {} rows (max level {}, {} unresolved, {} recursive)",
            lhm.rows.len(),
            lhm.max_level(),
            lhm.report.unresolved.len(),
            lhm.report.recursive.len()
        );
        Ok(lhm)
    }

    fn walk_type(
        &self,
        schema_type: &SchemaType,
        parent_path: &str,
        parent_level: usize,
        ancestors: &mut Vec<CompactString>,
        lhm: &mut Lhm,
    ) {
        log::debug!(
            "Walking {} ({} children) at {}",
            schema_type.name,
            schema_type.sequence_children.len(),
            parent_path
        );
        for child in &schema_type.sequence_children {
            let mut row = self.row_for(child, parent_path, parent_level + 1, &mut lhm.report);
            log::trace!("{} {}", row.level, row.path);
            if !row.is_tuple {
                lhm.rows.push(row);
                continue;
            }

            let Some(child_type) = self.schemas.schema_type(&row.type_ref) else {
                lhm.rows.push(row);
                continue;
            };
            if ancestors.contains(&child_type.name) {
                log::warn!("Not expanding recursive type {} at {}", child_type.name, row.path);
                mark_recursive(&mut row, &child_type.name);
                lhm.report.recursive.push(row.path.clone());
                lhm.rows.push(row);
                continue;
            }

            let path = row.path.clone();
            let level = row.level;
            lhm.rows.push(row);
            ancestors.push(child_type.name.clone());
            self.walk_type(child_type, &path, level, ancestors, lhm);
            ancestors.pop();
        }
    }

    fn row_for(
        &self,
        child: &SchemaElement,
        parent_path: &str,
        level: usize,
        report: &mut WalkReport,
    ) -> LhmRow {
        let qualified = child.qualified_name.as_str();
        let path = format!("{parent_path}/{qualified}");

        let declared = child
            .type_ref
            .as_deref()
            .or_else(|| self.schemas.element_type(qualified));
        let type_ref = match declared {
            Some(type_ref) if self.schemas.resolves(type_ref) => type_ref.to_string(),
            Some(type_ref) => {
                log::warn!("Unresolved type {type_ref} for {path}");
                report.unresolved.push(path.clone());
                String::new()
            }
            None => {
                log::warn!("Unresolved element {qualified} at {path}");
                report.unresolved.push(path.clone());
                String::new()
            }
        };

        let is_tuple = !type_ref.is_empty() && self.schemas.is_tuple(&type_ref);
        let base_type = if is_tuple || type_ref.is_empty() {
            String::new()
        } else {
            self.schemas
                .base_type(&type_ref)
                .unwrap_or_default()
                .to_string()
        };

        let mut row = LhmRow {
            level,
            element: namespaces::local_name(qualified).to_string(),
            type_ref,
            path,
            is_tuple,
            min_occurs: child.min_occurs,
            max_occurs: child.max_occurs,
            base_type,
            label: String::new(),
            documentation: String::new(),
            label_local: String::new(),
            documentation_local: String::new(),
        };
        match self.labels.lookup(qualified) {
            Some(labels) => row.set_labels(labels),
            None => log::debug!("No label for {qualified}"),
        }
        row
    }
}

fn mark_recursive(row: &mut LhmRow, type_name: &str) {
    let marker = format!("[recursive type {type_name}]");
    if row.documentation.is_empty() {
        row.documentation = marker;
    } else {
        row.documentation = format!("{} {marker}", row.documentation);
    }
}
