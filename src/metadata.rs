//! xBRL-CSV (OIM) metadata describing a flattened tidy table.
//!
//! Counter columns become `gl-plt:d_<column>` typed dimensions, leaf
//! columns become concepts, and monetary leaves carry an `iso4217` unit.
//! Container columns hold no facts and are declared without dimensions.

use crate::hierarchy::Lhm;
use crate::namespaces::{self, GL_MODULES};
use crate::tidy::TidyTable;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

pub const DOCUMENT_TYPE: &str = "https://xbrl.org/2021/xbrl-csv";
pub const TEMPLATE_NAME: &str = "xbrl-gl_template";
pub const TABLE_NAME: &str = "xbrl-gl_table";

const ENTITY_PREFIX: &str = "ns0";

/// Report-wide values written into the table template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    /// Taxonomy entry point listed under `documentInfo.taxonomy`.
    pub taxonomy: String,
    /// Revision date used in the `gl-<m>` namespace URIs.
    pub revision: NaiveDate,
    /// ISO 4217 code for monetary columns.
    pub currency: String,
    pub period: NaiveDate,
    pub entity_scheme: String,
    pub entity_id: String,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        let revision = NaiveDate::from_ymd_opt(2016, 12, 1).unwrap_or_default();
        Self {
            taxonomy: entry_point(revision),
            revision,
            currency: "USD".to_string(),
            period: revision,
            entity_scheme: "http://example.com".to_string(),
            entity_id: "example".to_string(),
        }
    }
}

fn entry_point(revision: NaiveDate) -> String {
    format!("gl/plt/gl-plt-all-{}.xsd", revision.format("%Y-%m-%d"))
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("invalid {what} '{value}': {e}")))
}

impl MetadataOptions {
    /// Sets the namespace revision. The taxonomy entry point follows it.
    pub fn with_revision(mut self, revision: NaiveDate) -> Self {
        self.revision = revision;
        self.taxonomy = entry_point(revision);
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = taxonomy.into();
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Result<Self> {
        let code = currency.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(format!("invalid currency code '{currency}'")));
        }
        self.currency = code;
        Ok(self)
    }

    pub fn with_period(mut self, period: &str) -> Result<Self> {
        self.period = parse_date(period, "period")?;
        Ok(self)
    }

    pub fn with_entity(mut self, scheme: impl Into<String>, id: impl Into<String>) -> Self {
        self.entity_scheme = scheme.into();
        self.entity_id = id.into();
        self
    }
}

fn is_counter_column(column: &str) -> bool {
    column
        .strip_prefix('d')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn namespace_map(options: &MetadataOptions) -> Map<String, Value> {
    let revision = options.revision.format("%Y-%m-%d").to_string();
    let mut map = Map::new();
    for (prefix, uri) in namespaces::WELL_KNOWN.iter().filter(|(p, _)| *p != "xs") {
        map.insert(prefix.to_string(), Value::from(*uri));
    }
    for module in GL_MODULES {
        map.insert(
            format!("gl-{module}"),
            Value::from(namespaces::gl_namespace(module, &revision)),
        );
    }
    map.insert(ENTITY_PREFIX.to_string(), Value::from(options.entity_scheme.as_str()));
    map
}

/// Builds the metadata document for `table`, whose CSV is published at
/// `csv_url` (usually the file name next to the metadata file).
pub fn build_metadata(
    table: &TidyTable,
    lhm: &Lhm,
    options: &MetadataOptions,
    csv_url: &str,
) -> Value {
    let rows = lhm.index_by_qualified_name();
    let mut dimensions = Map::new();
    dimensions.insert(
        "period".to_string(),
        Value::from(format!("{}T00:00:00", options.period.format("%Y-%m-%d"))),
    );
    dimensions.insert(
        "entity".to_string(),
        Value::from(format!("{ENTITY_PREFIX}:{}", options.entity_id)),
    );

    let mut columns = Map::new();
    for column in &table.columns {
        if is_counter_column(column) {
            dimensions.insert(format!("gl-plt:d_{column}"), Value::from(format!("${column}")));
            columns.insert(column.clone(), json!({}));
            continue;
        }
        let row = rows.get(column.as_str());
        if row.is_some_and(|r| r.is_tuple) {
            columns.insert(column.clone(), json!({}));
            continue;
        }
        let mut fact = Map::new();
        fact.insert("concept".to_string(), Value::from(column.as_str()));
        if row.is_some_and(|r| r.type_ref.ends_with("monetaryItemType")) {
            fact.insert(
                "unit".to_string(),
                Value::from(format!("iso4217:{}", options.currency)),
            );
        }
        columns.insert(column.clone(), json!({ "dimensions": fact }));
    }

    log::debug!("Metadata for {} columns of {}", columns.len(), csv_url);
    let mut templates = Map::new();
    templates.insert(
        TEMPLATE_NAME.to_string(),
        json!({ "dimensions": dimensions, "columns": columns }),
    );
    let mut tables = Map::new();
    tables.insert(
        TABLE_NAME.to_string(),
        json!({ "template": TEMPLATE_NAME, "url": csv_url }),
    );
    json!({
        "documentInfo": {
            "documentType": DOCUMENT_TYPE,
            "namespaces": namespace_map(options),
            "taxonomy": [options.taxonomy],
        },
        "tableTemplates": templates,
        "tables": tables,
    })
}
