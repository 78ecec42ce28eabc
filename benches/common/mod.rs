use std::path::Path;

use anchor::ast::Program;
use test_support::load_cases;

/// Fixture programs whose case file opts into benchmarking.
pub fn workloads() -> Vec<(String, Program)> {
    let cases = load_cases(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load cases: {err:#}"));
    cases
        .into_iter()
        .filter(|case| case.spec.bench.enabled)
        .map(|case| {
            let source = case
                .read_program()
                .unwrap_or_else(|err| panic!("read {}: {err:#}", case.name));
            let program = serde_json::from_str(&source)
                .unwrap_or_else(|err| panic!("decode {}: {err}", case.name));
            (case.name, program)
        })
        .collect()
}
