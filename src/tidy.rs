//! Reshaping between tidy tables (dimension counters + payload columns) and
//! nested JSON documents.
//!
//! A tidy row whose counters are `(c1, .., cK, _, ..)` sits at level `K`. Rows
//! must arrive in depth-first order: each row either opens the next sibling
//! at some level or descends, and every level it opens below that starts at
//! 1. Levels a row skips over get a node without payload.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key of the column list in nested documents.
pub const COLUMNS_KEY: &str = "columns";

/// Manifest describing how a tidy table maps to a nested document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidyParams {
    /// Dimension columns are named `<prefix><digits>`.
    pub dimension_prefixes: Vec<String>,
    /// Meaning of each dimension, top level first. Also the JSON keys of the
    /// child lists.
    pub dimension_names: Vec<String>,
    /// Per level, the payload column that identifies a node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file1_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file2_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
}

impl TidyParams {
    pub fn new<P, N>(prefixes: P, names: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            dimension_prefixes: prefixes.into_iter().map(Into::into).collect(),
            dimension_names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_id_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::require_file("params", path)?;
        let content = std::fs::read(path)?;
        let params: TidyParams = serde_json::from_slice(crate::skip_bom(&content))?;
        if params.dimension_prefixes.is_empty() {
            return Err(Error::Config("dimension_prefixes must not be empty".into()));
        }
        Ok(params)
    }

    pub fn is_dimension_column(&self, column: &str) -> bool {
        self.dimension_prefixes.iter().any(|prefix| {
            column
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
    }

    fn id_field(&self, level: usize) -> Option<&str> {
        self.id_fields
            .as_ref()
            .and_then(|fields| fields.get(level))
            .map(String::as_str)
            .filter(|field| !field.is_empty())
    }
}

/// Rows of string cells under a header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TidyTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indices of dimension columns, in header order.
    pub fn dimension_columns(&self, params: &TidyParams) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| params.is_dimension_column(c))
            .map(|(i, _)| i)
            .collect()
    }
}

/// `(1,2,_)`
pub fn format_counters(counters: &[Option<u32>]) -> String {
    let parts: Vec<String> = counters
        .iter()
        .map(|c| c.map_or_else(|| "_".to_string(), |n| n.to_string()))
        .collect();
    format!("({})", parts.join(","))
}

#[derive(Debug)]
struct Node {
    counter: u32,
    /// Payload of the row that opened this node; `None` when no row did.
    header: Option<IndexMap<String, String>>,
    children: Vec<Node>,
}

impl Node {
    fn new(counter: u32) -> Self {
        Self {
            counter,
            header: None,
            children: Vec::new(),
        }
    }
}

pub struct TidyTransform<'a> {
    params: &'a TidyParams,
}

impl<'a> TidyTransform<'a> {
    pub fn new(params: &'a TidyParams) -> Self {
        Self { params }
    }

    fn check_depth(&self, dimensions: usize) -> Result<()> {
        if dimensions == 0 {
            return Err(Error::Config("table has no dimension columns".into()));
        }
        if dimensions > self.params.dimension_names.len() {
            return Err(Error::Config(format!(
                "{} dimension columns but only {} dimension names",
                dimensions,
                self.params.dimension_names.len()
            )));
        }
        Ok(())
    }

    /// Groups rows into a tree of dimension levels. Fails on the first row
    /// that breaks the counter order.
    pub fn to_nested(&self, table: &TidyTable) -> Result<Value> {
        let dims = table.dimension_columns(self.params);
        self.check_depth(dims.len())?;
        let payload: Vec<usize> = (0..table.columns.len())
            .filter(|i| !dims.contains(i))
            .collect();

        let mut roots: Vec<Node> = Vec::new();
        let mut previous: Vec<Option<u32>> = vec![None; dims.len()];

        for (index, row) in table.rows.iter().enumerate() {
            let number = index + 1;
            let counters = parse_counters(row, &dims, number)?;
            let level = check_order(&previous, &counters, number)?;

            let mut siblings = &mut roots;
            for (depth, counter) in counters[..level].iter().enumerate() {
                let counter = counter.unwrap_or(1);
                let nodes = siblings;
                if nodes.last().map(|n| n.counter) != Some(counter) {
                    nodes.push(Node::new(counter));
                }
                let last = nodes.len() - 1;
                let node = &mut nodes[last];
                if depth + 1 == level {
                    let mut header = IndexMap::new();
                    for &i in &payload {
                        let value = row.get(i).map(String::as_str).unwrap_or_default();
                        if !value.is_empty() {
                            header.insert(table.columns[i].clone(), value.to_string());
                        }
                    }
                    node.header = Some(header);
                }
                siblings = &mut node.children;
            }
            previous = counters;
        }

        let columns: Vec<&str> = dims.iter().map(|&i| table.columns[i].as_str()).collect();
        let mut document = Map::new();
        document.insert(
            COLUMNS_KEY.to_string(),
            Value::Array(table.columns.iter().cloned().map(Value::String).collect()),
        );
        document.insert(
            self.params.dimension_names[0].clone(),
            Value::Array(roots.iter().map(|n| self.node_json(n, 0, &columns)).collect()),
        );
        log::info!("Nested {} rows into {} top-level nodes", table.len(), roots.len());
        Ok(Value::Object(document))
    }

    fn node_json(&self, node: &Node, depth: usize, dimension_columns: &[&str]) -> Value {
        let mut object = Map::new();
        if let Some(header) = &node.header {
            object.insert(dimension_columns[depth].to_string(), Value::from(node.counter));
            let id = self.params.id_field(depth);
            if let Some((key, value)) = id.and_then(|id| header.get_key_value(id)) {
                object.insert(key.clone(), Value::String(value.clone()));
            }
            for (key, value) in header {
                if Some(key.as_str()) != id {
                    object.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }
        if !node.children.is_empty() {
            let children = node
                .children
                .iter()
                .map(|child| self.node_json(child, depth + 1, dimension_columns))
                .collect();
            object.insert(
                self.params.dimension_names[depth + 1].clone(),
                Value::Array(children),
            );
        }
        Value::Object(object)
    }

    /// Emits one row per node carrying its dimension counter, depth first.
    pub fn to_tidy(&self, document: &Value) -> Result<TidyTable> {
        let object = document
            .as_object()
            .ok_or_else(|| Error::Config("nested document must be a JSON object".into()))?;
        let columns: Vec<String> = object
            .get(COLUMNS_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Config(format!("nested document lacks '{COLUMNS_KEY}'")))?
            .iter()
            .map(cell_text)
            .collect();

        let mut table = TidyTable::new(columns);
        let dims = table.dimension_columns(self.params);
        self.check_depth(dims.len())?;

        let mut counters = vec![None; dims.len()];
        if let Some(nodes) = object.get(&self.params.dimension_names[0]) {
            self.collect_rows(nodes, 0, &dims, &mut counters, &mut table)?;
        }
        log::info!("Unnested {} rows", table.len());
        Ok(table)
    }

    fn collect_rows(
        &self,
        nodes: &Value,
        depth: usize,
        dims: &[usize],
        counters: &mut Vec<Option<u32>>,
        table: &mut TidyTable,
    ) -> Result<()> {
        let nodes = nodes.as_array().ok_or_else(|| {
            Error::Config(format!("'{}' must be a list", self.params.dimension_names[depth]))
        })?;

        for (index, node) in nodes.iter().enumerate() {
            let position = index as u32 + 1;
            let object = node.as_object().ok_or_else(|| {
                Error::Config(format!(
                    "'{}' entries must be objects",
                    self.params.dimension_names[depth]
                ))
            })?;
            counters[depth] = Some(position);
            for deeper in counters.iter_mut().skip(depth + 1) {
                *deeper = None;
            }

            let counter_column = &table.columns[dims[depth]];
            if let Some(value) = object.get(counter_column) {
                let observed = cell_text(value);
                if observed != position.to_string() {
                    let mut found = counters.clone();
                    found[depth] = observed.parse().ok();
                    return Err(Error::StructureViolation {
                        row: table.len() + 1,
                        expected: format_counters(counters),
                        observed: format_counters(&found),
                    });
                }
                let row = table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| match dims.iter().position(|&d| d == i) {
                        Some(k) => counters[k].map(|n| n.to_string()).unwrap_or_default(),
                        None => object.get(column).map(cell_text).unwrap_or_default(),
                    })
                    .collect();
                table.rows.push(row);
            }

            if depth + 1 < dims.len() {
                if let Some(children) = object.get(&self.params.dimension_names[depth + 1]) {
                    self.collect_rows(children, depth + 1, dims, counters, table)?;
                }
            }
        }
        Ok(())
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_counters(row: &[String], dims: &[usize], number: usize) -> Result<Vec<Option<u32>>> {
    let mut counters = Vec::with_capacity(dims.len());
    for &i in dims {
        let cell = row.get(i).map(|c| c.trim()).unwrap_or_default();
        if cell.is_empty() {
            counters.push(None);
            continue;
        }
        match cell.parse::<u32>() {
            Ok(n) if n > 0 => counters.push(Some(n)),
            _ => {
                return Err(Error::StructureViolation {
                    row: number,
                    expected: "positive integer counters".into(),
                    observed: format!("'{cell}'"),
                })
            }
        }
    }
    Ok(counters)
}

/// Returns the row's level after checking it follows `previous` in
/// depth-first order.
fn check_order(previous: &[Option<u32>], counters: &[Option<u32>], number: usize) -> Result<usize> {
    let level = counters.iter().take_while(|c| c.is_some()).count();

    // Expected: next sibling at this row's level under the previous parents.
    let expected = || {
        let mut next: Vec<Option<u32>> = vec![None; counters.len()];
        next[..level.saturating_sub(1)].copy_from_slice(&previous[..level.saturating_sub(1)]);
        if level > 0 {
            next[level - 1] = Some(previous[level - 1].map_or(1, |p| p + 1));
        }
        next
    };
    let violation = |expected: Vec<Option<u32>>| Error::StructureViolation {
        row: number,
        expected: format_counters(&expected),
        observed: format_counters(counters),
    };

    if level == 0 || counters[level..].iter().any(Option::is_some) {
        let mut first = vec![None; counters.len()];
        if !first.is_empty() {
            first[0] = Some(previous[0].unwrap_or(1));
        }
        return Err(violation(if level == 0 { first } else { expected() }));
    }

    let Some(diverge) = (0..level).find(|&k| counters[k] != previous[k]) else {
        return Err(violation(expected()));
    };
    let opens = previous[diverge].map_or(1, |p| p + 1);
    let fresh = counters[diverge + 1..level].iter().all(|c| *c == Some(1));
    if counters[diverge] != Some(opens) || !fresh {
        return Err(violation(expected()));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params() -> TidyParams {
        TidyParams::new(["d"], ["Company", "Department", "Employee"])
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> TidyTable {
        TidyTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn employees() -> TidyTable {
        table(
            &["d1", "d2", "d3", "name"],
            &[
                &["1", "1", "1", "Ann"],
                &["1", "1", "2", "Bob"],
                &["1", "2", "1", "Cy"],
            ],
        )
    }

    #[test]
    fn test_tidy_to_nested() {
        let params = params();
        let nested = TidyTransform::new(&params).to_nested(&employees()).unwrap();
        assert_eq!(
            nested,
            json!({
                "columns": ["d1", "d2", "d3", "name"],
                "Company": [{
                    "Department": [
                        {"Employee": [{"d3": 1, "name": "Ann"}, {"d3": 2, "name": "Bob"}]},
                        {"Employee": [{"d3": 1, "name": "Cy"}]}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_round_trip_with_headers() {
        let params = params();
        let input = table(
            &["d1", "d2", "d3", "name", "title"],
            &[
                &["1", "", "", "Acme", ""],
                &["1", "1", "", "Sales", "Dept"],
                &["1", "1", "1", "Ann", ""],
                &["1", "1", "2", "Bob", "Lead"],
                &["1", "2", "1", "Cy", ""],
                &["2", "", "", "Initech", ""],
            ],
        );
        let transform = TidyTransform::new(&params);
        let nested = transform.to_nested(&input).unwrap();
        assert_eq!(transform.to_tidy(&nested).unwrap(), input);
    }

    #[test]
    fn test_id_field_comes_first() {
        let params = TidyParams::new(["dim_"], ["Entry", "Line"]).with_id_fields(["", "code"]);
        let input = table(
            &["dim_1", "dim_2", "amount", "code"],
            &[&["1", "1", "10", "A"], &["1", "2", "20", "B"]],
        );
        let nested = TidyTransform::new(&params).to_nested(&input).unwrap();
        let line = &nested["Entry"][0]["Line"][1];
        let keys: Vec<_> = line.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["dim_2", "code", "amount"]);
    }

    #[test]
    fn test_gap_is_violation() {
        let params = params();
        let input = table(
            &["d1", "d2", "d3", "name"],
            &[&["1", "1", "1", "Ann"], &["1", "1", "3", "Bob"]],
        );
        let err = TidyTransform::new(&params).to_nested(&input).unwrap_err();
        match err {
            Error::StructureViolation {
                row,
                expected,
                observed,
            } => {
                assert_eq!(row, 2);
                assert_eq!(expected, "(1,1,2)");
                assert_eq!(observed, "(1,1,3)");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_and_hole_are_violations() {
        let params = params();
        let transform = TidyTransform::new(&params);

        let duplicate = table(&["d1", "d2", "d3"], &[&["1", "1", ""], &["1", "1", ""]]);
        assert!(matches!(
            transform.to_nested(&duplicate),
            Err(Error::StructureViolation { row: 2, .. })
        ));

        let hole = table(&["d1", "d2", "d3"], &[&["1", "", "1"]]);
        assert!(matches!(
            transform.to_nested(&hole),
            Err(Error::StructureViolation { row: 1, .. })
        ));

        let text = table(&["d1", "d2", "d3"], &[&["one", "", ""]]);
        assert!(matches!(
            transform.to_nested(&text),
            Err(Error::StructureViolation { row: 1, .. })
        ));
    }

    #[test]
    fn test_too_many_dimensions() {
        let params = TidyParams::new(["d"], ["Company"]);
        let err = TidyTransform::new(&params).to_nested(&employees()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_nested_counter_mismatch() {
        let params = params();
        let nested = json!({
            "columns": ["d1", "name"],
            "Company": [{"d1": 1, "name": "a"}, {"d1": 3, "name": "b"}]
        });
        let err = TidyTransform::new(&params).to_tidy(&nested).unwrap_err();
        assert!(matches!(err, Error::StructureViolation { row: 2, .. }));
    }

    #[test]
    fn test_dimension_column_names() {
        let params = TidyParams::new(["d", "dim_"], ["a"]);
        assert!(params.is_dimension_column("d1"));
        assert!(params.is_dimension_column("dim_12"));
        assert!(!params.is_dimension_column("d"));
        assert!(!params.is_dimension_column("date"));
        assert!(!params.is_dimension_column("d1x"));
    }

    #[test]
    fn test_params_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"dimension_prefixes": ["d"], "dimension_names": ["Entry", "Line"],
                "file1_path": "in.csv", "file2_path": "out.csv", "json_path": "out.json"}"#,
        )
        .unwrap();
        let params = TidyParams::from_json_file(&path).unwrap();
        assert_eq!(params.dimension_names, vec!["Entry", "Line"]);
        assert_eq!(params.json_path.as_deref(), Some(Path::new("out.json")));
        assert_eq!(params.id_fields, None);
    }

    #[test]
    fn test_format_counters() {
        assert_eq!(format_counters(&[Some(1), Some(2), None]), "(1,2,_)");
    }
}
