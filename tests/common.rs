// Shared fixtures: small .xlsx workbooks written straight into a temp dir
#![allow(dead_code)]

use hydronomics_pipeline::metrics::SheetLayout;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// (row, col, value), zero-based like calamine positions
pub type Cell = (u32, u32, f64);

/// Header weeks of the fixture sheets as (column, week)
pub const FIXTURE_WEEKS: [(u32, u32); 2] = [(2, 18), (3, 19)];

/// A well-formed location sheet: week header plus a value in every metric cell
pub fn location_sheet() -> Vec<Cell> {
    let layout = SheetLayout::default();
    let mut cells: Vec<Cell> = FIXTURE_WEEKS
        .iter()
        .map(|&(col, week)| (layout.week_header_row as u32, col, f64::from(week)))
        .collect();

    for start in layout.metric_start_rows.values() {
        for day in 0..SheetLayout::DAYS_PER_BLOCK as u32 {
            for &(col, week) in &FIXTURE_WEEKS {
                let row = *start as u32 + day;
                cells.push((row, col, f64::from(week * 10 + day)));
            }
        }
    }
    cells
}

/// A sheet with metric values but nothing in the week header row
pub fn headerless_sheet() -> Vec<Cell> {
    let header_row = SheetLayout::default().week_header_row as u32;
    location_sheet()
        .into_iter()
        .filter(|&(row, _, _)| row != header_row)
        .collect()
}

/// Write a minimal .xlsx holding `sheets` in order
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Cell>)]) {
    let file = File::create(path).expect("create workbook");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut workbook_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook.push_str(&format!(
            r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
        ));
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    workbook_rels.push_str("</Relationships>");

    let parts = [
        ("[Content_Types].xml", content_types),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).expect("start part");
        zip.write_all(body.as_bytes()).expect("write part");
    }

    for (i, (_, cells)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
            .expect("start sheet");
        zip.write_all(sheet_xml(cells).as_bytes())
            .expect("write sheet");
    }
    zip.finish().expect("finish workbook");
}

fn sheet_xml(cells: &[Cell]) -> String {
    let mut rows: BTreeMap<u32, BTreeMap<u32, f64>> = BTreeMap::new();
    for &(row, col, value) in cells {
        rows.entry(row).or_default().insert(col, value);
    }

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row, cols) in rows {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, value) in cols {
            xml.push_str(&format!(
                r#"<c r="{}{}"><v>{}</v></c>"#,
                column_letters(col),
                row + 1,
                value
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii column letters")
}
