//! End-to-end tests driving the compiled REPL binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn run_script(db_path: &Path, commands: &[String]) -> Vec<String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minidb"))
        .arg(db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn the database binary");

    {
        let mut stdin = child.stdin.take().expect("failed to open stdin");
        for command in commands {
            writeln!(stdin, "{command}").expect("failed to write to stdin");
        }
    }

    let output = child.wait_with_output().expect("failed to collect output");
    String::from_utf8_lossy(&output.stdout)
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn script(commands: &[&str]) -> Vec<String> {
    commands.iter().map(|c| c.to_string()).collect()
}

fn fresh_db() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    (dir, path)
}

#[test]
fn inserts_and_retrieves_a_row() {
    let (_dir, db) = fresh_db();
    let output = run_script(
        &db,
        &script(&["insert 1 user1 person1@example.com", "select", ".exit"]),
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.",
            "db > (1, user1, person1@example.com)",
            "Executed.",
            "db > Bye!",
        ]
    );
}

#[test]
fn rejects_negative_id() {
    let (_dir, db) = fresh_db();
    let output = run_script(&db, &script(&["insert -1 cstack foo@bar.com", "select", ".exit"]));

    assert_eq!(
        output,
        vec!["db > ID must be positive.", "db > Executed.", "db > Bye!"]
    );
}

#[test]
fn accepts_maximum_length_strings() {
    let (_dir, db) = fresh_db();
    let username = "a".repeat(32);
    let email = "a".repeat(255);
    let output = run_script(
        &db,
        &[
            format!("insert 1 {username} {email}"),
            "select".to_string(),
            ".exit".to_string(),
        ],
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.".to_string(),
            format!("db > (1, {username}, {email})"),
            "Executed.".to_string(),
            "db > Bye!".to_string(),
        ]
    );
}

#[test]
fn rejects_over_length_strings() {
    let (_dir, db) = fresh_db();
    let username = "a".repeat(33);
    let output = run_script(
        &db,
        &[
            format!("insert 1 {username} b@c"),
            "select".to_string(),
            ".exit".to_string(),
        ],
    );

    assert_eq!(
        output,
        vec!["db > String is too long.", "db > Executed.", "db > Bye!"]
    );
}

#[test]
fn rejects_duplicate_keys_without_mutation() {
    let (_dir, db) = fresh_db();
    let output = run_script(
        &db,
        &script(&["insert 1 a a@x", "insert 1 b b@x", "select", ".exit"]),
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.",
            "db > Error: Duplicate key.",
            "db > (1, a, a@x)",
            "Executed.",
            "db > Bye!",
        ]
    );
}

#[test]
fn splits_the_root_leaf_after_fourteen_rows() {
    let (_dir, db) = fresh_db();
    let mut commands: Vec<String> = (1..=14)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    commands.push(".btree".to_string());
    commands.push("select".to_string());
    commands.push(".exit".to_string());

    let output = run_script(&db, &commands);

    let mut expected: Vec<String> = (1..=14).map(|_| "db > Executed.".to_string()).collect();
    expected.push("db > Tree:".to_string());
    expected.push("- internal (size 1)".to_string());
    expected.push("  - leaf (size 7)".to_string());
    for i in 1..=7 {
        expected.push(format!("    - key {i}"));
    }
    expected.push("  - key 7".to_string());
    expected.push("  - leaf (size 7)".to_string());
    for i in 8..=14 {
        expected.push(format!("    - key {i}"));
    }
    expected.push("db > (1, user1, person1@example.com)".to_string());
    for i in 2..=14 {
        expected.push(format!("({i}, user{i}, person{i}@example.com)"));
    }
    expected.push("Executed.".to_string());
    expected.push("db > Bye!".to_string());

    assert_eq!(output, expected);
}

#[test]
fn keeps_rows_across_sessions() {
    let (_dir, db) = fresh_db();

    let first = run_script(
        &db,
        &script(&["insert 3 c c@x", "insert 1 a a@x", "insert 2 b b@x", ".exit"]),
    );
    assert_eq!(
        first,
        vec![
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > Bye!",
        ]
    );

    let second = run_script(&db, &script(&["select", ".exit"]));
    assert_eq!(
        second,
        vec![
            "db > (1, a, a@x)",
            "(2, b, b@x)",
            "(3, c, c@x)",
            "Executed.",
            "db > Bye!",
        ]
    );
}

#[test]
fn reports_table_full_and_stays_responsive() {
    let (_dir, db) = fresh_db();
    let mut commands: Vec<String> = (1..=1200)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    commands.push(".exit".to_string());

    let output = run_script(&db, &commands);

    assert!(output.iter().any(|line| line.contains("Error: Table full.")));
    assert_eq!(output.last().map(String::as_str), Some("db > Bye!"));
}

#[test]
fn prints_constants() {
    let (_dir, db) = fresh_db();
    let output = run_script(&db, &script(&[".constants", ".exit"]));

    assert_eq!(
        output,
        vec![
            "db > Constants:",
            "ROW_SIZE: 291",
            "COMMON_NODE_HEADER_SIZE: 6",
            "LEAF_NODE_HEADER_SIZE: 10",
            "LEAF_NODE_CELL_SIZE: 295",
            "LEAF_NODE_SPACE_FOR_CELLS: 4086",
            "LEAF_NODE_MAX_CELLS: 13",
            "db > Bye!",
        ]
    );
}

#[test]
fn prints_single_leaf_tree() {
    let (_dir, db) = fresh_db();
    let output = run_script(
        &db,
        &script(&["insert 3 c c@x", "insert 1 a a@x", "insert 2 b b@x", ".btree", ".exit"]),
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > Tree:",
            "- leaf (size 3)",
            "  - key 1",
            "  - key 2",
            "  - key 3",
            "db > Bye!",
        ]
    );
}

#[test]
fn reports_unrecognized_input() {
    let (_dir, db) = fresh_db();
    let output = run_script(&db, &script(&[".foo", "frobnicate", ".exit"]));

    assert_eq!(
        output,
        vec![
            "db > Unrecognized command '.foo'",
            "db > Unrecognized keyword at start of 'frobnicate'.",
            "db > Bye!",
        ]
    );
}

#[test]
fn reports_syntax_errors() {
    let (_dir, db) = fresh_db();
    let output = run_script(
        &db,
        &script(&["insert 1 a", "insert abc a b", "insert 1 a b extra", ".exit"]),
    );

    assert_eq!(
        output,
        vec![
            "db > Syntax error. Could not parse statement.",
            "db > Syntax error. Could not parse statement.",
            "db > Syntax error. Could not parse statement.",
            "db > Bye!",
        ]
    );
}

#[test]
fn requires_a_database_filename() {
    let output = Command::new(env!("CARGO_BIN_EXE_minidb"))
        .output()
        .expect("failed to run the database binary");

    assert!(!output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim_end(),
        "Must supply a database filename."
    );
}

#[test]
fn rejects_a_corrupt_file() {
    let (_dir, db) = fresh_db();
    std::fs::write(&db, vec![0u8; 100]).unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_minidb"))
        .arg(&db)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn the database binary");
    drop(child.stdin.take());
    let output = child.wait_with_output().expect("failed to collect output");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Error opening database:"));
}
