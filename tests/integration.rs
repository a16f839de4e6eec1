use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn gwc_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("gwc");
    path
}

/// Column letters for 0-based indices below 26.
fn col(i: usize) -> char {
    (b'A' + i as u8) as char
}

/// Worksheet XML from sparse rows of (0-based row, cells). Cells that parse
/// as numbers are written as numeric cells, everything else as inline strings.
fn sheet_xml(rows: &[(usize, Vec<&str>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, cells) in rows {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", col(c), r + 1);
            if value.parse::<f64>().is_ok() {
                xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
            } else {
                xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    cell_ref, value
                ));
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write an .xlsx holding `sheets` in order.
fn write_xlsx(path: &Path, sheets: &[(&str, String)]) {
    let mut workbook = String::from(
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name,
            i + 1,
            i + 1
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1,
            i + 1
        ));
    }
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();
    zip.start_file("xl/workbook.xml", opts).unwrap();
    zip.write_all(workbook.as_bytes()).unwrap();
    zip.start_file("xl/_rels/workbook.xml.rels", opts).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();
    for (i, (_, body)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts)
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// State-wise resources in BCM: data from row 6, name in column 1, figures in 2..=15.
fn annexure1_sheet() -> String {
    let kerala: Vec<&str> = vec![
        "1", "Kerala", "3.1", "0.4", "1.2", "0.3", "5.0", "0.5", "4.5", "1.1", "0.1", "1.5",
        "2.7", "1.6", "1.8", "60.2",
    ];
    let punjab: Vec<&str> = vec![
        "2", "Punjab", "10.2", "5.1", "2.0", "1.4", "18.7", "1.8", "16.9", "26.0", "0.5",
        "1.2", "27.7", "1.3", "0.9", "163.8",
    ];
    let total: Vec<&str> = vec!["", "Total", "13.3", "5.5"];
    sheet_xml(&[
        (0, vec!["ANNEXURE 1A"]),
        (2, vec!["S.No", "State"]),
        (6, kerala),
        (7, punjab),
        (8, total),
    ])
}

/// District-wise resources in HAM, one section per state.
fn annexure2_sheet() -> String {
    sheet_xml(&[
        (0, vec!["DYNAMIC GROUND WATER RESOURCES OF INDIA - 2023"]),
        (1, vec!["KERALA"]),
        (2, vec!["S.No", "Name of District"]),
        (3, vec!["1", "Idukki", "1200", "300", "400", "100", "2000", "200", "1800", "500", "20", "300", "820", "310", "980", "45.5"]),
        (4, vec!["", "Total(Ham)", "1200"]),
        (5, vec!["DYNAMIC GROUND WATER RESOURCES OF INDIA - 2023"]),
        (6, vec!["PUNJAB"]),
        (7, vec!["1", "Ludhiana", "5000", "900", "800", "600", "7300", "700", "6600", "9000", "150", "400", "9550", "420", "0", "144.7"]),
    ])
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(data_dir.join("annexures")).unwrap();

    write_xlsx(
        &data_dir.join("annexures/Annexure1_2022-23.xlsx"),
        &[
            ("Cover", sheet_xml(&[(0, vec!["cover"])])),
            ("Annexure 1A", annexure1_sheet()),
        ],
    );
    write_xlsx(
        &data_dir.join("annexures/Annexure2_2022-23.xlsx"),
        &[("Annexure II", annexure2_sheet())],
    );
    // lock file left by a spreadsheet editor
    fs::write(data_dir.join("annexures/~$Annexure1_2022-23.xlsx"), "lock").unwrap();

    let config_content = r#"[paths]
data_dir = "../data"
output_dir = "../output"
"#;
    let config_path = config_dir.join("gwc.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_gwc(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = gwc_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run gwc binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_extract_writes_records_and_master() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gwc(&config_path, &["extract"]);
    assert!(success, "extract failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("files found: 2"), "{}", stdout);
    assert!(stdout.contains("documents written: 2"), "{}", stdout);
    assert!(stdout.contains("  records: 4"), "{}", stdout);
    assert!(stdout.contains("failed files: 0"), "{}", stdout);
    assert!(stdout.trim_end().ends_with("ok"));

    let out = tmp.path().join("output");
    let doc_path = out.join("records/annexure_1/annexure_1_2022_2023.json");
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&doc_path).unwrap()).unwrap();
    assert_eq!(doc["source_type"], "annexure_1");
    assert_eq!(doc["year"], "2022-2023");
    assert_eq!(doc["record_count"], 2);
    assert_eq!(doc["records"][1]["state"], "Punjab");
    assert_eq!(doc["records"][1]["stage_of_extraction_percent"], 163.8);

    assert!(out.join("records/annexure_2/annexure_2_2022_2023.json").exists());

    let master: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("all_reports_master.json")).unwrap()).unwrap();
    assert_eq!(master["metadata"]["total_records"], 4);
    assert_eq!(master["metadata"]["record_counts"]["annexure_2"], 2);
    assert_eq!(master["metadata"]["years_covered"][0], "2022-2023");
    assert_eq!(master["data"]["annexure_1"]["2022-2023"].as_array().unwrap().len(), 2);
}

#[test]
fn test_broken_workbooks_are_reported_and_skipped() {
    let (tmp, config_path) = setup_test_env();
    let data_dir = tmp.path().join("data");
    fs::write(data_dir.join("Annexure2_2021-22.xlsx"), "not a zip archive").unwrap();
    write_xlsx(
        &data_dir.join("CentralReport2022-23.xlsx"),
        &[("Sheet1", sheet_xml(&[(0, vec!["nothing here"])]))],
    );

    let (stdout, stderr, success) = run_gwc(&config_path, &["extract"]);
    assert!(success, "extract failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("files found: 4"), "{}", stdout);
    assert!(stdout.contains("files processed: 2"), "{}", stdout);
    assert!(stdout.contains("failed files: 2"), "{}", stdout);
    assert!(stdout.contains("Annexure2_2021-22.xlsx: "), "{}", stdout);
    assert!(stdout.contains("CentralReport2022-23.xlsx: sheet 'GEC' not found"), "{}", stdout);
    assert!(stdout.contains("  records: 4"), "{}", stdout);
}

#[test]
fn test_facts_and_chunks_read_records_only() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, success) = run_gwc(&config_path, &["extract"]);
    assert!(success);
    // derivation must not need the workbooks
    fs::remove_dir_all(tmp.path().join("data")).unwrap();

    let (stdout, stderr, success) = run_gwc(&config_path, &["facts"]);
    assert!(success, "facts failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents read: 2"), "{}", stdout);
    assert!(stdout.contains("facts written: "), "{}", stdout);

    let facts = read_lines(&tmp.path().join("output/unified_dataset.jsonl"));
    assert!(!facts.is_empty());
    for fact in &facts {
        assert!(fact["source_type"] == "annexure_1" || fact["source_type"] == "annexure_2");
        assert!(fact["value"].as_f64() != Some(0.0), "zero-valued fact kept: {}", fact);
    }
    assert!(facts.iter().any(|f| f["state"] == "Punjab"));

    let (stdout, stderr, success) = run_gwc(&config_path, &["chunks"]);
    assert!(success, "chunks failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks written: "), "{}", stdout);

    let chunks = read_lines(&tmp.path().join("output/semantic_chunks.jsonl"));
    assert!(chunks.iter().any(|c| c["source_type"] == "annexure_1"));
    assert!(chunks.iter().any(|c| c["source_type"] == "annexure_2"));
    for chunk in &chunks {
        assert!(!chunk["id"].as_str().unwrap().is_empty());
        assert!(!chunk["text"].as_str().unwrap().is_empty());
    }
}

#[test]
fn test_run_is_deterministic() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("output");

    let (stdout, stderr, success) = run_gwc(&config_path, &["run"]);
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("extract"));
    assert!(stdout.contains("facts written: "));
    assert!(stdout.contains("chunks written: "));
    let facts1 = fs::read_to_string(out.join("unified_dataset.jsonl")).unwrap();
    let chunks1 = fs::read_to_string(out.join("semantic_chunks.jsonl")).unwrap();

    let (_, _, success) = run_gwc(&config_path, &["run"]);
    assert!(success);
    let facts2 = fs::read_to_string(out.join("unified_dataset.jsonl")).unwrap();
    let chunks2 = fs::read_to_string(out.join("semantic_chunks.jsonl")).unwrap();

    assert_eq!(facts1, facts2);
    assert_eq!(chunks1, chunks2);
}

#[test]
fn test_extract_clears_stale_records() {
    let (tmp, config_path) = setup_test_env();
    let (_, _, success) = run_gwc(&config_path, &["extract"]);
    assert!(success);

    fs::remove_file(tmp.path().join("data/annexures/Annexure2_2022-23.xlsx")).unwrap();
    let (stdout, _, success) = run_gwc(&config_path, &["extract"]);
    assert!(success);
    assert!(stdout.contains("documents written: 1"), "{}", stdout);
    assert!(!tmp
        .path()
        .join("output/records/annexure_2/annexure_2_2022_2023.json")
        .exists());
}

#[test]
fn test_stats_after_run() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, _) = run_gwc(&config_path, &["stats"]);
    assert!(stdout.contains("Generated:   never"), "{}", stdout);

    run_gwc(&config_path, &["run"]);
    let (stdout, stderr, success) = run_gwc(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Documents:   2"), "{}", stdout);
    assert!(stdout.contains("Records:     4"), "{}", stdout);
    assert!(stdout.contains("annexure_1"));
    assert!(stdout.contains("annexure_2"));
}

#[test]
fn test_search_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();
    run_gwc(&config_path, &["run"]);

    let (_, stderr, success) = run_gwc(&config_path, &["search", "over-exploited Punjab"]);
    assert!(!success);
    assert!(stderr.contains("embedding provider"), "{}", stderr);
}

#[test]
fn test_unknown_progress_mode_fails() {
    let (_tmp, config_path) = setup_test_env();
    let output = Command::new(gwc_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("loud")
        .arg("extract")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown progress mode"));
}

#[test]
fn test_missing_data_dir_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("data")).unwrap();

    let (_, stderr, success) = run_gwc(&config_path, &["extract"]);
    assert!(!success);
    assert!(stderr.contains("Data directory does not exist"), "{}", stderr);
}

#[test]
fn test_config_example_needs_no_config() {
    let output = Command::new(gwc_binary())
        .arg("--config")
        .arg("/nonexistent/gwc.toml")
        .arg("config-example")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[paths]"));
    assert!(stdout.contains("[embedding]"));
    assert_eq!(stdout, fs::read_to_string("config/gwc.example.toml").unwrap());
}
