//! Class/property view of an LHM: each tuple becomes a class whose direct
//! children are its attributes (leaves) or compositions (nested tuples).

use crate::hierarchy::Lhm;
use crate::model::{LhmRow, MaxOccurs};
use ahash::AHashSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyType {
    Class,
    Attribute,
    Composition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRow {
    /// 1-based position of the source row in the LHM.
    pub sequence: usize,
    /// 1 for a class, 2 for its properties.
    pub level: u8,
    pub property_type: PropertyType,
    pub class_term: String,
    pub property_term: String,
    pub representation: String,
    pub associated_class: String,
    pub cardinality: String,
    pub definition: String,
    pub element: String,
    pub label_local: String,
    pub definition_local: String,
}

fn term(row: &LhmRow) -> String {
    if row.label.is_empty() {
        row.element.clone()
    } else {
        row.label.clone()
    }
}

fn cardinality(row: &LhmRow) -> String {
    match row.max_occurs {
        MaxOccurs::Unbounded => format!("{}..*", row.min_occurs),
        MaxOccurs::Bounded(max) => format!("{}..{}", row.min_occurs, max),
    }
}

/// Builds the table. A tuple element that appears more than once in the LHM
/// is described by its first occurrence only.
pub fn build_class_table(lhm: &Lhm) -> Vec<ClassRow> {
    let mut seen = AHashSet::new();
    let mut table = Vec::new();

    for (index, class) in lhm.rows.iter().enumerate() {
        if !class.is_tuple || !seen.insert(class.qualified_name()) {
            continue;
        }
        let class_term = term(class);
        table.push(ClassRow {
            sequence: index + 1,
            level: 1,
            property_type: PropertyType::Class,
            class_term: class_term.clone(),
            property_term: String::new(),
            representation: String::new(),
            associated_class: String::new(),
            cardinality: String::new(),
            definition: class.documentation.clone(),
            element: class.qualified_name().to_string(),
            label_local: class.label_local.clone(),
            definition_local: class.documentation_local.clone(),
        });

        for (offset, property) in lhm.rows[index + 1..]
            .iter()
            .enumerate()
            .take_while(|(_, r)| r.level > class.level)
            .filter(|(_, r)| r.level == class.level + 1)
        {
            let (property_type, property_term, associated_class) = if property.is_tuple {
                (PropertyType::Composition, String::new(), term(property))
            } else {
                (PropertyType::Attribute, term(property), String::new())
            };
            let representation = if property.base_type.is_empty() {
                property.type_ref.clone()
            } else {
                property.base_type.clone()
            };
            table.push(ClassRow {
                sequence: index + offset + 2,
                level: 2,
                property_type,
                class_term: class_term.clone(),
                property_term,
                representation: if property.is_tuple { String::new() } else { representation },
                associated_class,
                cardinality: cardinality(property),
                definition: property.documentation.clone(),
                element: property.qualified_name().to_string(),
                label_local: property.label_local.clone(),
                definition_local: property.documentation_local.clone(),
            });
        }
    }
    log::info!("Built {} class table rows", table.len());
    table
}
