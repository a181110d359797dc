//! Isolated, time-bounded execution of generated Python fragments.
//!
//! The fragment runs in a `python3 -I` subprocess whose namespace is seeded
//! with the fixed reference pools and an enumerated set of standard
//! utilities; nothing else is offered. The process is killed on timeout and
//! every failure is converted into an error value, never a process fault.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use quizforge_common::{ExtractionContext, QuizforgeError};

/// Reference pool for generated person names.
pub const GIVEN_NAMES: &[&str] = &[
    "Alice", "Bruno", "Carla", "Diego", "Elena", "Felipe", "Gabriela", "Hugo",
];

/// Reference pool for generated surnames.
pub const SURNAMES: &[&str] = &[
    "Almeida", "Barbosa", "Cardoso", "Duarte", "Ferraz", "Gomes", "Moreira", "Silva",
];

/// Conventional names of the two output collections a fragment must define.
pub const INPUT_LIST: &str = "inp_list";
pub const OUTPUT_LIST: &str = "out_list";

/// Harness fed to the interpreter. Reads `{code, globals, result_path}` as
/// JSON on stdin, executes the code in a fresh namespace holding only the
/// seeded globals and the allowed utility modules, and writes the two output
/// collections (stringified element-wise) or the error to `result_path`.
const HARNESS: &str = r#"
import json
import sys

import datetime
import random
import uuid

payload = json.load(sys.stdin)
namespace = {
    "random": random,
    "json": json,
    "datetime": datetime,
    "uuid": uuid,
}
namespace.update(payload["globals"])

try:
    exec(compile(payload["code"], "<fragment>", "exec"), namespace)
except BaseException as exc:
    result = {"error": "%s: %s" % (type(exc).__name__, exc)}
else:
    result = {
        "input": [str(item) for item in namespace.get(payload["input_name"]) or []],
        "output": [str(item) for item in namespace.get(payload["output_name"]) or []],
    }

with open(payload["result_path"], "w", encoding="utf-8") as handle:
    json.dump(result, handle)
"#;

#[derive(Debug, Deserialize)]
struct HarnessResult {
    error: Option<String>,
    #[serde(default)]
    input: Vec<String>,
    #[serde(default)]
    output: Vec<String>,
}

pub struct Sandbox {
    python_bin: String,
    timeout: Duration,
}

impl Sandbox {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    /// Execute one normalized fragment and retrieve the named output
    /// collections. Missing or empty collections are NOT an error here;
    /// callers check `ExtractionContext::is_valid` before exporting.
    pub async fn execute(&self, code: &str) -> Result<ExtractionContext, QuizforgeError> {
        let dir = tempfile::tempdir()
            .map_err(|e| QuizforgeError::Extraction(format!("failed to create sandbox dir: {e}")))?;
        let result_path = dir.path().join("result.json");

        let payload = serde_json::json!({
            "code": code,
            "globals": {
                "given_names": GIVEN_NAMES,
                "surnames": SURNAMES,
            },
            "input_name": INPUT_LIST,
            "output_name": OUTPUT_LIST,
            "result_path": result_path.to_string_lossy(),
        });

        debug!(bytes = code.len(), "Executing fragment in sandbox");

        let mut child = Command::new(&self.python_bin)
            .args(["-I", "-c", HARNESS])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                QuizforgeError::Extraction(format!("failed to launch {}: {e}", self.python_bin))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            QuizforgeError::Extraction("sandbox stdin unavailable".to_string())
        })?;
        let body = serde_json::to_vec(&payload)
            .map_err(|e| QuizforgeError::Extraction(format!("payload encoding failed: {e}")))?;
        stdin
            .write_all(&body)
            .await
            .map_err(|e| QuizforgeError::Extraction(format!("failed to feed sandbox: {e}")))?;
        drop(stdin);

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            // kill_on_drop reaps the interpreter when the future is dropped here
            Err(_) => {
                return Err(QuizforgeError::SandboxTimeout {
                    seconds: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(QuizforgeError::Extraction(format!(
                    "sandbox process failed: {e}"
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QuizforgeError::Extraction(format!(
                "fragment interpreter exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let raw = std::fs::read_to_string(&result_path)
            .map_err(|e| QuizforgeError::Extraction(format!("sandbox produced no result: {e}")))?;
        let result: HarnessResult = serde_json::from_str(&raw)
            .map_err(|e| QuizforgeError::Extraction(format!("malformed sandbox result: {e}")))?;

        if let Some(error) = result.error {
            return Err(QuizforgeError::Extraction(error));
        }

        Ok(ExtractionContext {
            inputs: result.input,
            outputs: result.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn sandbox() -> Sandbox {
        Sandbox::new("python3", Duration::from_secs(10))
    }

    #[tokio::test]
    async fn collects_both_output_lists() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let ctx = sandbox()
            .execute("inp_list = ['a;cmd()']\nout_list = ['result']")
            .await
            .unwrap();
        assert_eq!(ctx.inputs, vec!["a;cmd()"]);
        assert_eq!(ctx.outputs, vec!["result"]);
        assert!(ctx.is_valid());
    }

    #[tokio::test]
    async fn namespace_is_seeded_with_reference_pools() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let code = "name = random.choice(given_names) + ' ' + random.choice(surnames)\n\
inp_list = [name]\nout_list = [name]";
        let ctx = sandbox().execute(code).await.unwrap();
        assert_eq!(ctx.inputs.len(), 1);
        let generated = &ctx.inputs[0];
        assert!(GIVEN_NAMES.iter().any(|n| generated.starts_with(n)));
        assert!(SURNAMES.iter().any(|s| generated.ends_with(s)));
    }

    #[tokio::test]
    async fn runtime_error_becomes_extraction_failure() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let err = sandbox().execute("x = 1 / 0").await.unwrap_err();
        match err {
            QuizforgeError::Extraction(message) => {
                assert!(message.contains("ZeroDivisionError"), "got: {message}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn hung_fragment_is_killed_at_the_deadline() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let sandbox = Sandbox::new("python3", Duration::from_secs(1));
        let err = sandbox
            .execute("while True:\n    pass")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizforgeError::SandboxTimeout { seconds: 1 }));
    }

    #[tokio::test]
    async fn missing_collections_yield_an_invalid_context() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let ctx = sandbox().execute("x = 41 + 1").await.unwrap();
        assert!(ctx.inputs.is_empty());
        assert!(!ctx.is_valid());
    }
}
