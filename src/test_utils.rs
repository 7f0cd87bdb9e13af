use std::path::PathBuf;

use anyhow::bail;
use itertools::Itertools;
use serde::de::{Error, Visitor};
use serde::Deserialize;

use crate::builtin::list_elements;
use crate::error::SkinkError;
use crate::interpreter::SkinkValue;

/// One expected line of corpus output. `Something` matches any value; it
/// is used where the exact result is uninteresting (e.g. a closure).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TestOutput {
    Something(String),
    Bool(bool),
    Number(f64),
    List(Vec<TestOutput>),
}

#[derive(Debug, Clone)]
pub struct ExpectedResult(Result<TestOutput, SkinkError>);

impl ExpectedResult {
    pub fn into_result(self) -> Result<TestOutput, SkinkError> {
        self.0
    }
}

struct ExpectedResultVisitor {}

impl<'de> Deserialize<'de> for ExpectedResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de> {

        deserializer.deserialize_map(ExpectedResultVisitor {})
    }
}

impl<'de> Visitor<'de> for ExpectedResultVisitor {
    type Value = ExpectedResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A map with the boolean key 'ok'. If ok, the key 'output' holds the value, otherwise the key 'type' names the error")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()? != Some("ok".to_owned()) {
            return Err(A::Error::custom("First key should be 'ok'"));
        }

        let ok: bool = map.next_value()?;
        let result = if ok {
            if map.next_key::<String>()?.as_deref() != Some("output") {
                return Err(A::Error::custom("Second key should be 'output'"));
            }

            let value: TestOutput = map.next_value()?;
            Ok(ExpectedResult(Ok(value)))
        } else {
            if map.next_key::<String>()?.as_deref() != Some("type") {
                return Err(A::Error::custom("Second key should be 'type'"));
            }

            let error = match map.next_value::<String>()?.as_ref() {
                "SyntaxError" => SkinkError::SyntaxError,
                "NameError" => SkinkError::NameError,
                "EvaluationError" => SkinkError::EvaluationError,
                other => return Err(A::Error::custom(format!("Unrecognized error kind: {}", other))),
            };
            Ok(ExpectedResult(Err(error)))
        };

        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        result
    }
}

fn compare_lists(values: &[SkinkValue], expected: &[TestOutput]) -> bool {
    if values.len() != expected.len() {
        return false;
    }

    values.iter().zip(expected.iter())
        .all(|(value, expected)| compare(value, expected))
}

pub fn compare(value: &SkinkValue, expected: &TestOutput) -> bool {
    match (value, expected) {
        (_, TestOutput::Something(_)) => true,
        (SkinkValue::Boolean(a), TestOutput::Bool(b)) => a == b,
        (SkinkValue::Integer(a), TestOutput::Number(b)) => (*a as f64 - b).abs() < 1.0e-5,
        (SkinkValue::Float(a), TestOutput::Number(b)) => (a - b).abs() < 1.0e-5,
        (value, TestOutput::List(expected)) => match list_elements(value) {
            Ok(values) => compare_lists(&values, expected),
            Err(_) => false,
        },
        _ => false,
    }
}

pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, ExpectedResult)>> {
    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_programs");
    let input = std::fs::read_to_string(base_path.join(format!("{:02}.scm", testcase)))?;
    let input = input.lines().map(str::to_owned).collect_vec();

    let output = std::fs::read_to_string(base_path.join(format!("{:02}.json", testcase)))?;
    let output: Vec<ExpectedResult> = serde_json::from_str(&output)?;

    if input.len() != output.len() {
        bail!("Input and output of testcase {} do not match", testcase);
    }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = usize> {
    1..=6
}
