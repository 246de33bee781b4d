//! Namespace URIs and the canonical prefixes used for qualified names.

use once_cell::sync::Lazy;
use regex::Regex;

pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XBRL-GL module codes known to carry a `gl-<m>` namespace.
pub const GL_MODULES: &[&str] = &["gen", "cor", "bus", "muc", "usk", "ehm", "taf", "srcd", "plt"];

/// Non-GL prefixes and their namespace URIs.
pub const WELL_KNOWN: &[(&str, &str)] = &[
    ("xs", XS),
    ("xbrli", XBRLI),
    ("link", LINK),
    ("xlink", XLINK),
    ("xsi", XSI),
    ("iso4217", "http://www.xbrl.org/2003/iso4217"),
    ("iso639", "http://www.xbrl.org/2005/iso639"),
];

// http://www.xbrl.org/int/gl/<module>/<revision>
static GL_NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://www\.xbrl\.org/int/gl/([a-z]+)/[^/]+/?$").unwrap());

/// Canonical prefix for a namespace URI, independent of the GL revision date.
pub fn prefix_for(uri: &str) -> Option<String> {
    if let Some((prefix, _)) = WELL_KNOWN.iter().find(|(_, u)| *u == uri) {
        return Some((*prefix).to_string());
    }
    GL_NAMESPACE
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|module| format!("gl-{}", module.as_str()))
}

/// Namespace URI of a GL module for a given revision, e.g. `gl-cor` at
/// `2016-12-01`.
pub fn gl_namespace(module: &str, revision: &str) -> String {
    format!("http://www.xbrl.org/int/gl/{module}/{revision}")
}

/// Local part of a `prefix:local` reference.
pub fn local_name(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Prefix part of a `prefix:local` reference.
pub fn prefix_of(qname: &str) -> Option<&str> {
    qname.split_once(':').map(|(prefix, _)| prefix)
}
