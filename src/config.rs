//! Taxonomy layout and output encoding settings.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MODULES: &[&str] = &["gen", "cor", "bus", "muc", "usk", "ehm", "taf", "srcd"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where the XBRL-GL taxonomy lives and which part of it to walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyConfig {
    pub base_dir: PathBuf,
    /// Module codes, loaded in this order.
    pub modules: Vec<String>,
    pub date: NaiveDate,
    /// Palette directory under `gl/plt/`.
    pub palette: String,
    /// Language code of the local label linkbase (`label-<lang>.xml`).
    pub local_lang: String,
    pub root_module: String,
    pub root_type: String,
    pub root_element: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            date: NaiveDate::from_ymd_opt(2016, 12, 1).unwrap_or_default(),
            palette: "case-c-b-m-u-e-t-s".to_string(),
            local_lang: "ja".to_string(),
            root_module: "cor".to_string(),
            root_type: "accountingEntriesComplexType".to_string(),
            root_element: "accountingEntries".to_string(),
        }
    }
}

/// On-disk form of [`TaxonomyConfig`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_dir: Option<PathBuf>,
    modules: Option<Vec<String>>,
    date: Option<String>,
    palette: Option<String>,
    local_lang: Option<String>,
    root_module: Option<String>,
    root_type: Option<String>,
    root_element: Option<String>,
}

impl TaxonomyConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::require_file("configuration", path)?;
        let content = std::fs::read(path)?;
        let file: ConfigFile = serde_json::from_slice(crate::skip_bom(&content))?;

        let mut config = Self::default();
        if let Some(base_dir) = file.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(modules) = file.modules {
            config.modules = modules;
        }
        if let Some(date) = file.date {
            config = config.with_date(&date)?;
        }
        if let Some(palette) = file.palette {
            config.palette = palette;
        }
        if let Some(lang) = file.local_lang {
            config.local_lang = lang;
        }
        if let Some(module) = file.root_module {
            config.root_module = module;
        }
        if let Some(root_type) = file.root_type {
            config.root_type = root_type;
        }
        if let Some(root_element) = file.root_element {
            config.root_element = root_element;
        }
        Ok(config)
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date(mut self, date: &str) -> Result<Self> {
        self.date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|e| Error::Config(format!("invalid taxonomy date '{date}': {e}")))?;
        Ok(self)
    }

    pub fn with_palette(mut self, palette: impl Into<String>) -> Self {
        self.palette = palette.into();
        self
    }

    pub fn with_local_lang(mut self, lang: impl Into<String>) -> Self {
        self.local_lang = lang.into();
        self
    }

    pub fn with_root(
        mut self,
        module: impl Into<String>,
        root_type: impl Into<String>,
        root_element: impl Into<String>,
    ) -> Self {
        self.root_module = module.into();
        self.root_type = root_type.into();
        self.root_element = root_element.into();
        self
    }

    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// `gl/<mod>/gl-<mod>-<date>.xsd`
    pub fn module_schema_path(&self, module: &str) -> PathBuf {
        self.base_dir
            .join("gl")
            .join(module)
            .join(format!("gl-{}-{}.xsd", module, self.date_str()))
    }

    /// `gl/plt/<palette>/gl-<mod>-content-<date>.xsd`
    pub fn content_schema_path(&self, module: &str) -> PathBuf {
        self.base_dir
            .join("gl")
            .join("plt")
            .join(&self.palette)
            .join(format!("gl-{}-content-{}.xsd", module, self.date_str()))
    }

    /// `gl/<mod>/lang/gl-<mod>-<date>-label[-<lang>].xml`; `None` means English.
    pub fn label_path(&self, module: &str, lang: Option<&str>) -> PathBuf {
        let file = match lang {
            Some(lang) => format!("gl-{}-{}-label-{}.xml", module, self.date_str(), lang),
            None => format!("gl-{}-{}-label.xml", module, self.date_str()),
        };
        self.base_dir.join("gl").join(module).join("lang").join(file)
    }
}

/// Text encoding of emitted CSV files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 preceded by a byte-order mark.
    #[default]
    Utf8Sig,
    Utf8,
}

impl Encoding {
    pub fn writes_bom(self) -> bool {
        matches!(self, Encoding::Utf8Sig)
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8-sig" | "utf8-sig" => Ok(Encoding::Utf8Sig),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            other => Err(Error::Config(format!("unsupported encoding '{other}'"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8Sig => f.write_str("utf-8-sig"),
            Encoding::Utf8 => f.write_str("utf-8"),
        }
    }
}
