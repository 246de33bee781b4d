#![allow(dead_code)]

use glhm::TaxonomyConfig;
use std::fs;
use std::path::{Path, PathBuf};

const COR_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:gl-cor="http://www.xbrl.org/int/gl/cor/2016-12-01"
           targetNamespace="http://www.xbrl.org/int/gl/cor/2016-12-01">
  <xs:element name="accountingEntries" id="gl-cor_accountingEntries" type="gl-cor:accountingEntriesComplexType"/>
  <xs:element name="documentInfo" id="gl-cor_documentInfo" type="gl-cor:documentInfoComplexType"/>
  <xs:element name="entriesComment" id="gl-cor_entriesComment" type="xbrli:stringItemType"/>
  <xs:element name="entryDetail" id="gl-cor_entryDetail" type="gl-cor:entryDetailComplexType"/>
  <xs:element name="account" id="gl-cor_account" type="gl-cor:accountComplexType"/>
  <xs:element name="accountMainID" id="gl-cor_accountMainID" type="xbrli:tokenItemType"/>
  <xs:element name="amount" id="gl-cor_amount" type="xbrli:monetaryItemType"/>
  <xs:element name="postingStatus" id="gl-cor_postingStatus" type="gl-cor:postingStatusItemType"/>
</xs:schema>
"#;

// `postingStatusItemType` has no declaration anywhere.
const COR_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.xbrl.org/int/gl/cor/2016-12-01">
  <xs:complexType name="accountingEntriesComplexType">
    <xs:complexContent>
      <xs:restriction base="anyType">
        <xs:sequence>
          <xs:element ref="gl-cor:documentInfo"/>
          <xs:element ref="gl-cor:entryDetail" minOccurs="0" maxOccurs="unbounded"/>
        </xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="documentInfoComplexType">
    <xs:complexContent>
      <xs:restriction base="anyType">
        <xs:sequence>
          <xs:element ref="gl-cor:entriesComment" minOccurs="0"/>
          <xs:element ref="gl-bus:creator" minOccurs="0"/>
        </xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="entryDetailComplexType">
    <xs:complexContent>
      <xs:restriction base="anyType">
        <xs:sequence>
          <xs:element ref="gl-cor:account" minOccurs="0"/>
          <xs:element ref="gl-cor:amount" minOccurs="0"/>
          <xs:element ref="gl-cor:postingStatus" minOccurs="0"/>
        </xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="accountComplexType">
    <xs:complexContent>
      <xs:restriction base="anyType">
        <xs:sequence>
          <xs:element ref="gl-cor:accountMainID" minOccurs="0"/>
        </xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>
"#;

const BUS_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.xbrl.org/int/gl/bus/2016-12-01">
  <xs:element name="creator" id="gl-bus_creator" type="xbrli:stringItemType"/>
</xs:schema>
"#;

fn label_linkbase(lang: &str, entries: &[(&str, &str, Option<&str>)]) -> String {
    let mut body = String::new();
    for (anchor, label, documentation) in entries {
        body.push_str(&format!(
            r#"    <link:loc xlink:type="locator" xlink:href="../schema.xsd#{anchor}" xlink:label="{anchor}"/>
    <link:label xlink:type="resource" xlink:label="label_{anchor}" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="{lang}">{label}</link:label>
    <link:labelArc xlink:type="arc" xlink:from="{anchor}" xlink:to="label_{anchor}"/>
"#
        ));
        if let Some(documentation) = documentation {
            body.push_str(&format!(
                r#"    <link:label xlink:type="resource" xlink:label="doc_{anchor}" xlink:role="http://www.xbrl.org/2003/role/documentation" xml:lang="{lang}">{documentation}</link:label>
    <link:labelArc xlink:type="arc" xlink:from="{anchor}" xlink:to="doc_{anchor}"/>
"#
            ));
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
{body}  </link:labelLink>
</link:linkbase>
"#
    )
}

fn write(path: PathBuf, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `cor` and `bus` modules with English and Japanese labels.
pub fn write_taxonomy(dir: &Path) -> TaxonomyConfig {
    let config = TaxonomyConfig::new(dir).with_modules(["cor", "bus"]);
    write(config.module_schema_path("cor"), COR_SCHEMA);
    write(config.content_schema_path("cor"), COR_CONTENT);
    write(config.module_schema_path("bus"), BUS_SCHEMA);
    write(
        config.label_path("cor", None),
        &label_linkbase(
            "en",
            &[
                ("gl-cor_accountingEntries", "Accounting Entries", None),
                ("gl-cor_documentInfo", "Document Information", None),
                (
                    "gl-cor_entriesComment",
                    "Comment",
                    Some("Free text about the entries"),
                ),
                ("gl-cor_entryDetail", "Entry Detail", None),
                ("gl-cor_amount", "Amount", None),
            ],
        ),
    );
    write(
        config.label_path("cor", Some("ja")),
        &label_linkbase(
            "ja",
            &[
                ("gl-cor_accountingEntries", "会計エントリ", None),
                ("gl-cor_amount", "金額", Some("取引金額")),
            ],
        ),
    );
    write(
        config.label_path("bus", None),
        &label_linkbase("en", &[("gl-bus_creator", "Creator", None)]),
    );
    config
}

pub const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:gl-cor="http://www.xbrl.org/int/gl/cor/2016-12-01"
            xmlns:gl-bus="http://www.xbrl.org/int/gl/bus/2016-12-01">
  <gl-cor:accountingEntries>
    <gl-cor:documentInfo>
      <gl-cor:entriesComment>Monthly close</gl-cor:entriesComment>
    </gl-cor:documentInfo>
    <gl-cor:entryDetail>
      <gl-cor:account><gl-cor:accountMainID>1000</gl-cor:accountMainID></gl-cor:account>
      <gl-cor:amount>100</gl-cor:amount>
    </gl-cor:entryDetail>
    <gl-cor:entryDetail>
      <gl-cor:account><gl-cor:accountMainID>2000</gl-cor:accountMainID></gl-cor:account>
      <gl-cor:amount>-100</gl-cor:amount>
    </gl-cor:entryDetail>
  </gl-cor:accountingEntries>
</xbrli:xbrl>
"#;

pub fn write_instance(dir: &Path) -> PathBuf {
    let path = dir.join("instance.xml");
    fs::write(&path, INSTANCE).unwrap();
    path
}
