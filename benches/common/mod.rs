#![allow(dead_code)]
use std::fs;
use std::path::Path;

use objax::ExecutionResult;

pub const WORKLOADS: [(&str, &str); 2] = [
    ("long", "tests/programs/long_program/program.objax"),
    ("tasks", "tests/programs/task_board/program.objax"),
];

pub fn workloads() -> Vec<(&'static str, String)> {
    WORKLOADS
        .iter()
        .map(|(label, path)| (*label, load_source(path)))
        .collect()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(Path::new(path)).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_parsed(path: &str) -> ExecutionResult {
    let parsed = objax::parse(&load_source(path), &[]);
    assert!(parsed.is_ok(), "parse {path}: {:?}", parsed.errors);
    parsed
}
