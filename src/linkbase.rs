// Label linkbase processing for XBRL-GL
use crate::config::TaxonomyConfig;
use crate::model::LabelRecord;
use crate::namespaces::{LINK, XLINK};
use crate::xml::{self, XmlElement};
use crate::Result;
use ahash::AHashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^label_").unwrap());
static LABEL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(_lbl|_\d+(_\d+)?)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLang {
    English,
    Local,
}

/// Normalizes a locator anchor to `prefix_localname`.
pub fn normalize_anchor(anchor: &str) -> String {
    let stripped = LABEL_PREFIX.replace(anchor, "");
    LABEL_SUFFIX.replace(&stripped, "").into_owned()
}

/// Merged `prefix_localname -> labels` map across modules and languages.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    entries: IndexMap<String, LabelRecord>,
    /// Normalized key -> the raw anchor that claimed it first.
    owners: AHashMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `record` under the normalized anchor. A different raw anchor
    /// that normalizes to an already claimed key keeps its full id.
    pub fn insert(&mut self, anchor: &str, record: &LabelRecord) {
        let normalized = normalize_anchor(anchor);
        let key = match self.owners.get(&normalized) {
            Some(owner) if owner != anchor => {
                log::debug!("Label id {anchor} collides with {owner}; keeping full id");
                anchor.to_string()
            }
            Some(_) => normalized,
            None => {
                self.owners.insert(normalized.clone(), anchor.to_string());
                normalized
            }
        };
        self.entries.entry(key).or_default().merge(record);
    }

    pub fn get(&self, key: &str) -> Option<&LabelRecord> {
        self.entries.get(key)
    }

    /// Looks up labels for a `prefix:local` element name. On a miss, any key
    /// ending in `_<local>` is accepted, preferring the longest shared suffix.
    pub fn lookup(&self, qualified_name: &str) -> Option<&LabelRecord> {
        let key = qualified_name.replace(':', "_");
        if let Some(record) = self.entries.get(&key) {
            return Some(record);
        }
        let local = crate::namespaces::local_name(qualified_name);
        let suffix = format!("_{local}");

        let mut best: Option<(usize, &LabelRecord)> = None;
        for (candidate, record) in &self.entries {
            if !candidate.ends_with(&suffix) {
                continue;
            }
            let shared = common_suffix_len(candidate, &key);
            if best.map_or(true, |(len, _)| shared > len) {
                best = Some((shared, record));
            }
        }
        best.map(|(_, record)| record)
    }
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

pub struct LabelResolver {
    config: TaxonomyConfig,
}

impl LabelResolver {
    pub fn new(config: TaxonomyConfig) -> Self {
        Self { config }
    }

    /// English and local linkbases of every configured module. Missing files
    /// are skipped.
    pub fn load(&self) -> Result<LabelMap> {
        let mut map = LabelMap::new();
        for module in &self.config.modules {
            let english = self.config.label_path(module, None);
            self.load_linkbase_file(&english, LabelLang::English, &mut map)?;

            if self.config.local_lang != "en" {
                let local = self.config.label_path(module, Some(&self.config.local_lang));
                self.load_linkbase_file(&local, LabelLang::Local, &mut map)?;
            }
        }
        log::info!("Resolved labels for {} elements", map.len());
        Ok(map)
    }

    pub fn load_linkbase_file(&self, path: &Path, lang: LabelLang, map: &mut LabelMap) -> Result<()> {
        if !path.is_file() {
            log::debug!("Skipping missing linkbase {}", path.display());
            return Ok(());
        }
        let root = xml::parse_file(path)?;
        let resolved = parse_label_linkbase(&root, lang);
        log::debug!("{}: {} labelled anchors", path.display(), resolved.len());
        for (anchor, record) in &resolved {
            map.insert(anchor, record);
        }
        Ok(())
    }
}

#[derive(Default)]
struct LabelResource {
    label: Option<String>,
    documentation: Option<String>,
}

/// Joins locators, label resources and label arcs of one linkbase into
/// `anchor -> labels`, in arc order.
pub fn parse_label_linkbase(root: &XmlElement, lang: LabelLang) -> IndexMap<String, LabelRecord> {
    // Map locator label -> href anchor
    let mut locators: AHashMap<&str, &str> = AHashMap::new();
    for loc in root.descendants_named(LINK, "loc") {
        let (Some(label), Some(href)) = (loc.attr_ns(XLINK, "label"), loc.attr_ns(XLINK, "href"))
        else {
            continue;
        };
        if let Some((_, anchor)) = href.split_once('#') {
            locators.insert(label, anchor);
        }
    }

    // Collect label resources
    let mut resources: AHashMap<&str, LabelResource> = AHashMap::new();
    for label in root.descendants_named(LINK, "label") {
        let Some(id) = label.attr_ns(XLINK, "label") else {
            continue;
        };
        let role = label.attr_ns(XLINK, "role").unwrap_or_default();
        let resource = resources.entry(id).or_default();
        if role.ends_with("label") {
            resource.label = Some(label.text.clone());
        } else if role.ends_with("documentation") {
            resource.documentation = Some(label.text.clone());
        }
    }

    let mut resolved: IndexMap<String, LabelRecord> = IndexMap::new();
    for arc in root.descendants_named(LINK, "labelArc") {
        let anchor = arc
            .attr_ns(XLINK, "from")
            .and_then(|from| locators.get(from));
        let resource = arc
            .attr_ns(XLINK, "to")
            .and_then(|to| resources.get(to));
        let (Some(anchor), Some(resource)) = (anchor, resource) else {
            log::trace!("Dangling label arc in linkbase");
            continue;
        };

        let record = resolved.entry(anchor.to_string()).or_default();
        match lang {
            LabelLang::English => {
                if resource.label.is_some() {
                    record.label.clone_from(&resource.label);
                }
                if resource.documentation.is_some() {
                    record.documentation.clone_from(&resource.documentation);
                }
            }
            LabelLang::Local => {
                if resource.label.is_some() {
                    record.label_local.clone_from(&resource.label);
                }
                if resource.documentation.is_some() {
                    record.documentation_local.clone_from(&resource.documentation);
                }
            }
        }
    }
    resolved
}
