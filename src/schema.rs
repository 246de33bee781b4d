// Schema loading for the XBRL-GL taxonomy modules
use crate::config::TaxonomyConfig;
use crate::model::*;
use crate::namespaces::{self, XS};
use crate::xml::{self, XmlElement};
use crate::Result;
use ahash::AHashMap;
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// Base types of the XBRL 2.1 item types, used when the taxonomy itself
/// does not declare them.
const XBRLI_ITEM_BASES: &[(&str, &str)] = &[
    ("stringItemType", "xsd:string"),
    ("normalizedStringItemType", "xsd:normalizedString"),
    ("tokenItemType", "xsd:token"),
    ("languageItemType", "xsd:language"),
    ("NameItemType", "xsd:Name"),
    ("NCNameItemType", "xsd:NCName"),
    ("QNameItemType", "xsd:QName"),
    ("anyURIItemType", "xsd:anyURI"),
    ("booleanItemType", "xsd:boolean"),
    ("decimalItemType", "xsd:decimal"),
    ("monetaryItemType", "xsd:decimal"),
    ("sharesItemType", "xsd:decimal"),
    ("pureItemType", "xsd:decimal"),
    ("floatItemType", "xsd:float"),
    ("doubleItemType", "xsd:double"),
    ("integerItemType", "xsd:integer"),
    ("nonPositiveIntegerItemType", "xsd:nonPositiveInteger"),
    ("negativeIntegerItemType", "xsd:negativeInteger"),
    ("longItemType", "xsd:long"),
    ("intItemType", "xsd:int"),
    ("shortItemType", "xsd:short"),
    ("byteItemType", "xsd:byte"),
    ("nonNegativeIntegerItemType", "xsd:nonNegativeInteger"),
    ("unsignedLongItemType", "xsd:unsignedLong"),
    ("unsignedIntItemType", "xsd:unsignedInt"),
    ("unsignedShortItemType", "xsd:unsignedShort"),
    ("unsignedByteItemType", "xsd:unsignedByte"),
    ("positiveIntegerItemType", "xsd:positiveInteger"),
    ("dateItemType", "xsd:date"),
    ("dateTimeItemType", "xsd:dateTime"),
    ("timeItemType", "xsd:time"),
    ("durationItemType", "xsd:duration"),
    ("gYearItemType", "xsd:gYear"),
    ("gYearMonthItemType", "xsd:gYearMonth"),
    ("gMonthDayItemType", "xsd:gMonthDay"),
    ("gDayItemType", "xsd:gDay"),
    ("gMonthItemType", "xsd:gMonth"),
    ("hexBinaryItemType", "xsd:hexBinary"),
    ("base64BinaryItemType", "xsd:base64Binary"),
];

const PRIMITIVE_PREFIXES: &[&str] = &["xs", "xsd", "xbrli"];

/// Cross-module element and type maps. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    /// `gl-<mod>:<name>` -> type reference as written.
    pub element_type_map: AHashMap<CompactString, CompactString>,
    /// Type local name -> parsed type. Content schemas override base schemas.
    pub types: AHashMap<CompactString, SchemaType>,
    /// Type local name -> base reference.
    pub type_base_map: AHashMap<CompactString, CompactString>,
    pub loaded_files: Vec<PathBuf>,
}

impl SchemaSet {
    pub fn element_type(&self, qualified_name: &str) -> Option<&str> {
        self.element_type_map
            .get(qualified_name)
            .map(|t| t.as_str())
    }

    pub fn schema_type(&self, type_ref: &str) -> Option<&SchemaType> {
        self.types.get(namespaces::local_name(type_ref))
    }

    /// `xs:`/`xsd:`/`xbrli:` references need no declaration.
    pub fn is_primitive(type_ref: &str) -> bool {
        namespaces::prefix_of(type_ref).is_some_and(|p| PRIMITIVE_PREFIXES.contains(&p))
    }

    pub fn resolves(&self, type_ref: &str) -> bool {
        Self::is_primitive(type_ref) || self.schema_type(type_ref).is_some()
    }

    /// Tuple test: structural when the type is loaded, otherwise every
    /// reference (item types, primitives, unresolved names) is leaf-valued.
    pub fn is_tuple(&self, type_ref: &str) -> bool {
        match self.schema_type(type_ref) {
            Some(schema_type) => schema_type.is_tuple,
            None => false,
        }
    }

    pub fn base_type(&self, type_ref: &str) -> Option<&str> {
        let local = namespaces::local_name(type_ref);
        if let Some(base) = self.type_base_map.get(local) {
            return Some(base.as_str());
        }
        if namespaces::prefix_of(type_ref) == Some("xbrli") {
            return XBRLI_ITEM_BASES
                .iter()
                .find(|(name, _)| *name == local)
                .map(|(_, base)| *base);
        }
        None
    }

    pub(crate) fn absorb(&mut self, root: &XmlElement, module: &str) {
        let prefix = root
            .attr("targetNamespace")
            .and_then(namespaces::prefix_for)
            .unwrap_or_else(|| format!("gl-{module}"));

        for child in &root.children {
            if child.is(XS, "element") {
                if let (Some(name), Some(type_ref)) = (child.attr("name"), child.attr("type")) {
                    self.element_type_map.insert(
                        CompactString::from(format!("{prefix}:{name}")),
                        CompactString::from(type_ref),
                    );
                }
            } else if child.is(XS, "complexType") || child.is(XS, "simpleType") {
                if let Some(schema_type) = parse_type(child, &prefix) {
                    if let Some(base) = &schema_type.base_ref {
                        self.type_base_map
                            .insert(schema_type.name.clone(), base.clone());
                    }
                    self.types.insert(schema_type.name.clone(), schema_type);
                }
            }
        }
    }
}

pub struct SchemaLoader {
    config: TaxonomyConfig,
}

impl SchemaLoader {
    pub fn new(config: TaxonomyConfig) -> Self {
        Self { config }
    }

    /// Loads every module's declaration schema, then its palette content
    /// schema. Missing files are skipped; malformed ones are fatal.
    pub fn load(&self) -> Result<SchemaSet> {
        let mut set = SchemaSet::default();
        for module in &self.config.modules {
            let base = self.config.module_schema_path(module);
            let content = self.config.content_schema_path(module);
            for path in [base, content] {
                self.load_schema_file(&path, module, &mut set)?;
            }
        }
        log::info!(
            "Loaded {} schema files: {} elements, {} types",
            set.loaded_files.len(),
            set.element_type_map.len(),
            set.types.len()
        );
        Ok(set)
    }

    pub fn load_schema_file(&self, path: &Path, module: &str, set: &mut SchemaSet) -> Result<()> {
        if !path.is_file() {
            log::debug!("Skipping missing schema {}", path.display());
            return Ok(());
        }
        let root = xml::parse_file(path)?;
        log::debug!("Parsed schema {}", path.display());
        set.absorb(&root, module);
        set.loaded_files.push(path.to_path_buf());
        Ok(())
    }
}

fn parse_type(node: &XmlElement, prefix: &str) -> Option<SchemaType> {
    let name = node.attr("name")?;
    let kind = if node.is(XS, "complexType") {
        TypeKind::Complex
    } else {
        TypeKind::Simple
    };

    let base_ref = node
        .find_descendant(XS, "extension")
        .and_then(|e| e.attr("base"))
        .or_else(|| {
            node.find_descendant(XS, "restriction")
                .and_then(|r| r.attr("base"))
        })
        .map(CompactString::from);

    let is_tuple = kind == TypeKind::Complex && !is_item_type_name(name) && has_any_type_content(node);

    let sequence_children = find_sequence(node)
        .map(|sequence| {
            let mut children = Vec::new();
            collect_sequence(sequence, prefix, &mut children);
            children
        })
        .unwrap_or_default();

    Some(SchemaType {
        name: CompactString::from(name),
        kind,
        base_ref,
        sequence_children,
        is_tuple,
    })
}

/// `complexContent` whose restriction/extension derives from `anyType`.
fn has_any_type_content(node: &XmlElement) -> bool {
    if node.child(XS, "simpleContent").is_some() {
        return false;
    }
    let Some(content) = node.child(XS, "complexContent") else {
        return false;
    };
    ["restriction", "extension"]
        .iter()
        .find_map(|tag| content.child(XS, tag))
        .and_then(|derivation| derivation.attr("base"))
        .is_some_and(|base| namespaces::local_name(base) == "anyType")
}

/// Direct `xs:sequence`, or the one under complexContent's restriction/extension.
fn find_sequence(node: &XmlElement) -> Option<&XmlElement> {
    if let Some(sequence) = node.child(XS, "sequence") {
        return Some(sequence);
    }
    let content = node.child(XS, "complexContent")?;
    ["restriction", "extension"]
        .iter()
        .find_map(|tag| content.child(XS, tag))
        .and_then(|derivation| derivation.child(XS, "sequence"))
}

// Nested sequence/choice groups are flattened in document order.
fn collect_sequence(group: &XmlElement, prefix: &str, out: &mut Vec<SchemaElement>) {
    for child in &group.children {
        if child.is(XS, "element") {
            let qualified_name = match (child.attr("ref"), child.attr("name")) {
                (Some(reference), _) => CompactString::from(reference),
                (None, Some(name)) => CompactString::from(format!("{prefix}:{name}")),
                (None, None) => continue,
            };
            out.push(SchemaElement {
                qualified_name,
                type_ref: child.attr("type").map(CompactString::from),
                min_occurs: child
                    .attr("minOccurs")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(1),
                max_occurs: child
                    .attr("maxOccurs")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
            });
        } else if child.is(XS, "sequence") || child.is(XS, "choice") {
            collect_sequence(child, prefix, out);
        }
    }
}
