//! CSV and JSON reading and writing.
//!
//! CSV is written with `\r\n` line endings, quoting only the fields that
//! need it, and a byte-order mark when the encoding asks for one. JSON is
//! pretty printed with two-space indentation and keeps key order.

use crate::config::Encoding;
use crate::hierarchy::Lhm;
use crate::model::LhmRow;
use crate::tidy::TidyTable;
use crate::Result;
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Optional LHM column giving the row order.
pub const SEQUENCE_COLUMN: &str = "sequence";

fn csv_writer(path: &Path, encoding: Encoding) -> Result<csv::Writer<BufWriter<File>>> {
    let mut file = BufWriter::new(File::create(path)?);
    if encoding.writes_bom() {
        file.write_all(BOM)?;
    }
    Ok(WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(file))
}

fn csv_reader(path: &Path, role: &'static str) -> Result<csv::Reader<std::io::Cursor<Vec<u8>>>> {
    crate::require_file(role, path)?;
    let mut data = std::fs::read(path)?;
    if data.starts_with(BOM) {
        data.drain(..BOM.len());
    }
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::Cursor::new(data)))
}

/// Writes serializable records; the header comes from the field names.
pub fn write_records<T: Serialize>(path: &Path, records: &[T], encoding: Encoding) -> Result<()> {
    let mut writer = csv_writer(path, encoding)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn write_lhm_csv(path: &Path, lhm: &Lhm, encoding: Encoding) -> Result<()> {
    write_records(path, &lhm.rows, encoding)
}

/// Reads an LHM CSV. Rows are ordered by the `sequence` column when the file
/// has one, otherwise kept in file order.
pub fn read_lhm_csv(path: &Path) -> Result<Lhm> {
    let mut reader = csv_reader(path, "structure")?;
    let headers = reader.headers()?.clone();
    let sequence = headers.iter().position(|h| h == SEQUENCE_COLUMN);

    let mut rows: Vec<(u64, LhmRow)> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row: LhmRow = record.deserialize(Some(&headers))?;
        let order = sequence
            .and_then(|i| record.get(i))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(index as u64);
        rows.push((order, row));
    }
    if sequence.is_some() {
        rows.sort_by_key(|(order, _)| *order);
    }
    log::debug!("Read {} LHM rows from {}", rows.len(), path.display());
    Ok(Lhm::from_rows(rows.into_iter().map(|(_, row)| row).collect()))
}

pub fn write_tidy_csv(path: &Path, table: &TidyTable, encoding: Encoding) -> Result<()> {
    let mut writer = csv_writer(path, encoding)?;
    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Ragged rows are padded with empty cells to the header width.
pub fn read_tidy_csv(path: &Path) -> Result<TidyTable> {
    let mut reader = csv_reader(path, "tidy table")?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut table = TidyTable::new(columns);
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > table.columns.len() {
            log::warn!("Row {} has more cells than columns; extra cells dropped", table.len() + 1);
        }
        row.resize(table.columns.len(), String::new());
        table.rows.push(row);
    }
    log::debug!("Read {} tidy rows from {}", table.len(), path.display());
    Ok(table)
}

/// JSON is always written without a byte-order mark.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    file.flush()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Value> {
    crate::require_file("JSON", path)?;
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(crate::skip_bom(&data))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaxOccurs;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(level: usize, element: &str, path: &str) -> LhmRow {
        LhmRow {
            level,
            element: element.to_string(),
            type_ref: "xbrli:stringItemType".to_string(),
            path: path.to_string(),
            is_tuple: false,
            min_occurs: 0,
            max_occurs: MaxOccurs::Unbounded,
            base_type: "xsd:string".to_string(),
            label: "Comment, free text".to_string(),
            documentation: "Line one\nline \"two\"".to_string(),
            label_local: "コメント".to_string(),
            documentation_local: String::new(),
        }
    }

    #[test]
    fn test_lhm_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lhm.csv");
        let lhm = Lhm::from_rows(vec![row(1, "entriesComment", "/gl-cor:entriesComment")]);
        write_lhm_csv(&path, &lhm, Encoding::Utf8Sig).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let header = text.split("\r\n").next().unwrap();
        assert_eq!(
            header,
            "level,element,type,path,is_tuple,min_occurs,max_occurs,base_type,label,documentation,label_local,documentation_local"
        );
        assert!(text.contains("\"Comment, free text\""));
        assert!(text.contains("\"Line one\nline \"\"two\"\"\""));
        assert!(text.contains(",false,0,unbounded,xsd:string,"));
        assert!(text.ends_with("\r\n"));

        assert_eq!(read_lhm_csv(&path).unwrap(), lhm);
    }

    #[test]
    fn test_lhm_sequence_column_orders_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lhm.csv");
        std::fs::write(
            &path,
            "sequence,level,element,type,path,is_tuple,min_occurs,max_occurs,base_type,label,documentation,label_local,documentation_local\r\n\
             2,2,b,,/gl-cor:a/gl-cor:b,false,0,1,,,,,\r\n\
             1,1,a,,/gl-cor:a,true,1,unbounded,,,,,\r\n",
        )
        .unwrap();
        let lhm = read_lhm_csv(&path).unwrap();
        let elements: Vec<_> = lhm.rows.iter().map(|r| r.element.as_str()).collect();
        assert_eq!(elements, vec!["a", "b"]);
        assert!(lhm.rows[0].is_tuple);
    }

    #[test]
    fn test_tidy_csv_plain_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tidy.csv");
        let table = TidyTable {
            columns: vec!["d1".into(), "name".into()],
            rows: vec![vec!["1".into(), "Ann".into()], vec!["2".into(), String::new()]],
        };
        write_tidy_csv(&path, &table, Encoding::Utf8).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "d1,name\r\n1,Ann\r\n2,\r\n");
        assert_eq!(read_tidy_csv(&path).unwrap(), table);
    }

    #[test]
    fn test_ragged_rows_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "\u{feff}d1,d2,name\n1\n1,1,x\n").unwrap();
        let table = read_tidy_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["d1", "d2", "name"]);
        assert_eq!(table.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_json_indent_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &json!({"zeta": 1, "alpha": ["x"]})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"zeta\": 1,\n  \"alpha\": [\n    \"x\"\n  ]\n}\n");
        assert_eq!(read_json(&path).unwrap(), json!({"zeta": 1, "alpha": ["x"]}));
    }

    #[test]
    fn test_missing_input_reports_role() {
        let err = read_tidy_csv(Path::new("/nonexistent/tidy.csv")).unwrap_err();
        assert!(matches!(err, crate::Error::InputMissing { role: "tidy table", .. }));
    }
}
