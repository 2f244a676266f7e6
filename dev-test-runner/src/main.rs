//! Feeds the fixture cases through the library the way a host would and
//! reports pass/fail per case.
//!
//! Usage: `dev-test-runner [FILTER_REGEX]`
use std::process::ExitCode;
use std::sync::Arc;

use json_models::{DeserializerRegistry, ModelContext, ModelError, SchemaFile};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// ————————————————————————————————————————————————————————————————————————————
// FIXTURES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixtures {
    schema: SchemaFile,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    model: String,
    input: serde_json::Value,
    expect: Expect,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Expect {
    Ok(serde_json::Value),
    /// `ModelError` variant name
    Error(String),
}

static FIXTURES_SRC: &str = include_str!("../fixtures/cases.json");

static FIXTURES: Lazy<Result<Fixtures, String>> = Lazy::new(|| {
    let de = &mut serde_json::Deserializer::from_str(FIXTURES_SRC);
    serde_path_to_error::deserialize::<_, Fixtures>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
});

// ————————————————————————————————————————————————————————————————————————————
// RUNNER
// ————————————————————————————————————————————————————————————————————————————

fn error_kind(error: &ModelError) -> &'static str {
    match error {
        ModelError::MissingMandatory { .. } => "MissingMandatory",
        ModelError::UnknownProperty(_) => "UnknownProperty",
        ModelError::InvalidValue { .. } => "InvalidValue",
        ModelError::PropertyNotFound(_) => "PropertyNotFound",
        ModelError::UnknownModel(_) => "UnknownModel",
        ModelError::NotAnObject(_) => "NotAnObject",
        ModelError::Definition { .. } => "Definition",
        ModelError::Deserialization { .. } => "Deserialization",
    }
}

fn run_case(ctx: &ModelContext, case: &Case) -> Result<(), String> {
    let result = ctx.model(&case.model, case.input.clone());
    match (&case.expect, result) {
        (Expect::Ok(expected), Ok(model)) => {
            let actual = model.to_json();
            if &actual == expected {
                Ok(())
            } else {
                Err(format!("expected {expected}, got {actual}"))
            }
        }
        (Expect::Ok(_), Err(error)) => Err(format!("unexpected error: {error}")),
        (Expect::Error(kind), Err(error)) if error_kind(&error) == kind => Ok(()),
        (Expect::Error(kind), Err(error)) => Err(format!("expected {kind}, got {}: {error}", error_kind(&error))),
        (Expect::Error(kind), Ok(model)) => Err(format!("expected {kind}, got {}", model.to_json())),
    }
}

fn main() -> ExitCode {
    let filter = match std::env::args().nth(1).map(|src| Regex::new(&src)).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("invalid filter: {error}");
            return ExitCode::FAILURE;
        }
    };
    let fixtures = match FIXTURES.as_ref() {
        Ok(fixtures) => fixtures,
        Err(error) => {
            eprintln!("failed to load fixtures: {error}");
            return ExitCode::FAILURE;
        }
    };
    let ctx = match fixtures.schema.context(Arc::new(DeserializerRegistry::with_defaults())) {
        Ok(ctx) => ctx,
        Err(error) => {
            eprintln!("invalid fixture schema: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut passed = 0usize;
    let mut failed = 0usize;
    for case in &fixtures.cases {
        if filter.as_ref().is_some_and(|re| !re.is_match(&case.name)) {
            continue;
        }
        match run_case(&ctx, case) {
            Ok(()) => {
                passed += 1;
                eprintln!("✅ {}", case.name);
            }
            Err(reason) => {
                failed += 1;
                eprintln!("❌ {}: {reason}", case.name);
            }
        }
    }
    eprintln!("{passed} passed, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
