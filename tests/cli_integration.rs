use std::io::Write;
use std::process::{Command, Output};

fn oneliner(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oneliner"))
        .args(args)
        .output()
        .expect("failed to execute process")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn single_query_prints_bare_result() {
    let output = oneliner(&[
        "--input",
        "fixture/quote.json",
        "--query",
        "max([additional_drivers.map(ncd).max(), proposer.ncd])",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!(16));
}

#[test]
fn rules_file_builds_object_in_rule_order() {
    let output = oneliner(&[
        "--input",
        "fixture/quote.json",
        "--rules",
        "fixture/quote_rules.yaml",
        "--query",
        "vehicle.rating",
        "--verbose",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    assert!(stdout.find("proposer_age").unwrap() < stdout.find("max_ncd").unwrap());

    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "proposer_age": 19,
            "max_ncd": 16,
            "driver_claims": [1, 0],
            "postcode_area": "AB",
            "line_3": null,
            "vehicle.rating": 21
        })
    );
}

#[test]
fn json_lines_keep_input_order() {
    let mut input = tempfile::NamedTempFile::with_suffix(".jsonl").unwrap();
    for ncd in [4, 9, 1, 12] {
        writeln!(input, "{{\"drivers\": [{{\"ncd\": {ncd}}}, {{\"ncd\": 2}}]}}").unwrap();
    }
    input.flush().unwrap();

    let output_file = tempfile::NamedTempFile::with_suffix(".jsonl").unwrap();
    let output_path = output_file.path().to_str().unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_oneliner"))
        .arg("--input")
        .arg(input.path())
        .arg("--query")
        .arg("drivers.map(ncd).max()")
        .arg("--output")
        .arg(output_path)
        .arg("--threads")
        .arg("2")
        .status()
        .expect("failed to execute process");
    assert!(status.success());

    let content = std::fs::read_to_string(output_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["4", "9", "2", "12"]);
}

#[test]
fn query_error_fails_with_message() {
    let output = oneliner(&[
        "--input",
        "fixture/quote.json",
        "--query",
        "proposer.claims.filter(code)",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Equator error"), "{stderr}");
}

#[test]
fn missing_query_and_rules_is_rejected() {
    let output = oneliner(&["--input", "fixture/quote.json"]);
    assert!(!output.status.success());
}
