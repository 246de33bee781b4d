//! Small on-disk taxonomy and instance used by the unit tests.

use crate::config::TaxonomyConfig;
use std::fs;
use std::path::{Path, PathBuf};

const COR_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:xbrli="http://www.xbrl.org/2003/instance"
           xmlns:gl-cor="http://www.xbrl.org/int/gl/cor/2016-12-01"
           targetNamespace="http://www.xbrl.org/int/gl/cor/2016-12-01"
           elementFormDefault="qualified">
  <xs:element name="accountingEntries" id="gl-cor_accountingEntries" type="gl-cor:accountingEntriesComplexType"/>
  <xs:element name="documentInfo" id="gl-cor_documentInfo" type="gl-cor:documentInfoComplexType"/>
  <xs:element name="entriesComment" id="gl-cor_entriesComment" type="xbrli:stringItemType"/>
  <xs:element name="entryDetail" id="gl-cor_entryDetail" type="gl-cor:entryDetailComplexType"/>
  <xs:element name="account" id="gl-cor_account" type="gl-cor:accountComplexType"/>
  <xs:element name="accountMainID" id="gl-cor_accountMainID" type="gl-cor:accountMainIDItemType"/>
  <xs:element name="amount" id="gl-cor_amount" type="xbrli:monetaryItemType"/>
  <xs:complexType name="accountMainIDItemType">
    <xs:simpleContent>
      <xs:restriction base="xbrli:tokenItemType"/>
    </xs:simpleContent>
  </xs:complexType>
</xs:schema>
"#;

const COR_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:gl-cor="http://www.xbrl.org/int/gl/cor/2016-12-01"
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

const COR_LABELS_EN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="../gl-cor-2016-12-01.xsd#gl-cor_accountingEntries" xlink:label="gl-cor_accountingEntries"/>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_accountingEntries" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en">Accounting Entries</link:label>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_accountingEntries" xlink:to="label_gl-cor_accountingEntries"/>
    <link:loc xlink:type="locator" xlink:href="../gl-cor-2016-12-01.xsd#gl-cor_documentInfo" xlink:label="gl-cor_documentInfo"/>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_documentInfo" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en">Document Information</link:label>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_documentInfo" xlink:to="label_gl-cor_documentInfo"/>
    <link:loc xlink:type="locator" xlink:href="../gl-cor-2016-12-01.xsd#gl-cor_entriesComment" xlink:label="gl-cor_entriesComment"/>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_entriesComment" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en">Comment</link:label>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_entriesComment_doc" xlink:role="http://www.xbrl.org/2003/role/documentation" xml:lang="en">Free text about the entries</link:label>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_entriesComment" xlink:to="label_gl-cor_entriesComment"/>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_entriesComment" xlink:to="label_gl-cor_entriesComment_doc"/>
    <link:loc xlink:type="locator" xlink:href="../gl-cor-2016-12-01.xsd#gl-cor_entryDetail" xlink:label="gl-cor_entryDetail"/>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_entryDetail" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en">Entry Detail</link:label>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_entryDetail" xlink:to="label_gl-cor_entryDetail"/>
  </link:labelLink>
</link:linkbase>
"#;

const COR_LABELS_JA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="../gl-cor-2016-12-01.xsd#gl-cor_accountingEntries" xlink:label="gl-cor_accountingEntries"/>
    <link:label xlink:type="resource" xlink:label="label_gl-cor_accountingEntries" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="ja">会計エントリ</link:label>
    <link:labelArc xlink:type="arc" xlink:from="gl-cor_accountingEntries" xlink:to="label_gl-cor_accountingEntries"/>
  </link:labelLink>
</link:linkbase>
"#;

/// Two accounting lines, each with an account and an amount.
pub const SAMPLE_INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:iso4217="http://www.xbrl.org/2003/iso4217"
            xmlns:cor="http://www.xbrl.org/int/gl/cor/2016-12-01">
  <xbrli:context id="now">
    <xbrli:entity><xbrli:identifier scheme="http://www.example.com">ACME</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2016-12-01</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:unit id="JPY"><xbrli:measure>iso4217:JPY</xbrli:measure></xbrli:unit>
  <cor:accountingEntries>
    <cor:entryDetail>
      <cor:account>
        <cor:accountMainID contextRef="now">1000</cor:accountMainID>
      </cor:account>
      <cor:amount contextRef="now" unitRef="JPY" decimals="0">100</cor:amount>
    </cor:entryDetail>
    <cor:entryDetail>
      <cor:account>
        <cor:accountMainID contextRef="now">2000</cor:accountMainID>
      </cor:account>
      <cor:amount contextRef="now" unitRef="JPY" decimals="0">-100</cor:amount>
    </cor:entryDetail>
  </cor:accountingEntries>
</xbrli:xbrl>
"#;

fn write(path: PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Writes a `cor`-only taxonomy (schema, palette content, en/ja labels)
/// under `dir` and returns a configuration pointing at it.
pub fn write_minimal_taxonomy(dir: &Path) -> TaxonomyConfig {
    let config = TaxonomyConfig::new(dir).with_modules(["cor"]);
    write(config.module_schema_path("cor"), COR_SCHEMA);
    write(config.content_schema_path("cor"), COR_CONTENT);
    write(config.label_path("cor", None), COR_LABELS_EN);
    write(config.label_path("cor", Some("ja")), COR_LABELS_JA);
    config
}

pub fn write_sample_instance(dir: &Path) -> PathBuf {
    let path = dir.join("instance.xml");
    write(path.clone(), SAMPLE_INSTANCE);
    path
}
