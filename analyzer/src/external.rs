//! Analysis through an external AI command-line tool.
//!
//! The tool is run in non-interactive mode with the prompt on its command
//! line and a JSON envelope on stdout:
//!
//! ```text
//! <program> -p <prompt> --output-format json --append-system-prompt <system>
//! ```
//!
//! The envelope's `result` string carries the analysis, optionally wrapped
//! in a markdown code fence. Run metadata from the envelope is attached to
//! the analysis under `_metadata`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};
use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::SchemaAnalyzer;
use crate::error::{AnalyzerError, Result};
use crate::prompt::{SYSTEM_PROMPT, build_prompt};

/// Program invoked when none is configured.
pub const DEFAULT_PROGRAM: &str = "claude";

/// Default upper bound on a single analysis run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Settings for [`ExternalAnalyzer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Program name or path.
    pub program: String,
    /// Kill the program if it runs longer than this.
    pub timeout: Duration,
    /// Passed through `--append-system-prompt`.
    pub system_prompt: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Runs an external AI tool to analyze schemas.
#[derive(Debug, Clone, Default)]
pub struct ExternalAnalyzer {
    config: AnalyzerConfig,
}

impl ExternalAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs the program with `prompt` and returns its stdout.
    ///
    /// Output pipes are drained on background threads so a large reply
    /// cannot block the child before it exits.
    pub fn run(&self, prompt: &str) -> Result<String> {
        let program = &self.config.program;
        debug!(program = %program, prompt_bytes = prompt.len(), "Invoking analyzer");

        let mut child = Command::new(program)
            .arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--append-system-prompt")
            .arg(&self.config.system_prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AnalyzerError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = match child.wait_timeout(self.config.timeout)? {
            Some(status) => status,
            None => {
                // Reap the child so it does not linger as a zombie.
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalyzerError::TimedOut {
                    seconds: self.config.timeout.as_secs(),
                });
            }
        };
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, %status, "Analyzer exited");

        let stdout = collect(stdout_thread)?;
        let stderr = collect(stderr_thread)?;

        if !status.success() {
            return Err(AnalyzerError::Failed {
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl SchemaAnalyzer for ExternalAnalyzer {
    fn analyze(&self, schemas: &Value) -> Result<Value> {
        let prompt = build_prompt(schemas)?;
        let stdout = self.run(&prompt)?;
        parse_response(&stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(AnalyzerError::Io(std::io::Error::other(
                "output reader thread panicked",
            ))),
        },
        None => Ok(Vec::new()),
    }
}

/// Interprets the analyzer's JSON envelope.
///
/// # Errors
///
/// - [`AnalyzerError::Json`] if stdout or the embedded result is not JSON.
/// - [`AnalyzerError::Reported`] if the envelope has `is_error: true`.
/// - [`AnalyzerError::MalformedResponse`] if the envelope or the result is
///   not a JSON object.
///
/// # Examples
///
/// ```
/// use sqlscope_analyzer::parse_response;
///
/// let stdout = r#"{"result": "```json\n{\"summary\": {}}\n```", "total_cost_usd": 0.01}"#;
/// let analysis = parse_response(stdout).unwrap();
/// assert!(analysis["summary"].is_object());
/// assert_eq!(analysis["_metadata"]["cost_usd"], 0.01);
/// ```
pub fn parse_response(stdout: &str) -> Result<Value> {
    let envelope: Value = serde_json::from_str(stdout)?;
    let envelope = envelope
        .as_object()
        .ok_or_else(|| AnalyzerError::MalformedResponse("envelope is not a JSON object".into()))?;

    let result_text = envelope.get("result").and_then(Value::as_str).unwrap_or("");

    if envelope.get("is_error").and_then(Value::as_bool).unwrap_or(false) {
        let message = envelope
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(AnalyzerError::Reported(message.to_string()));
    }

    let cost = envelope.get("total_cost_usd").and_then(Value::as_f64).unwrap_or(0.0);
    info!(cost_usd = cost, "Analyzer response received");

    let mut analysis = match serde_json::from_str::<Value>(strip_code_fence(result_text))? {
        Value::Object(map) => map,
        other => {
            return Err(AnalyzerError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    let metadata = json!({
        "cost_usd": field_or(envelope, "total_cost_usd", json!(0)),
        "duration_ms": field_or(envelope, "duration_ms", json!(0)),
        "num_turns": field_or(envelope, "num_turns", json!(0)),
        "session_id": field_or(envelope, "session_id", json!("")),
    });
    analysis.insert("_metadata".to_string(), metadata);

    Ok(Value::Object(analysis))
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn field_or(envelope: &Map<String, Value>, key: &str, fallback: Value) -> Value {
    envelope.get(key).cloned().unwrap_or(fallback)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{}"), "{}");
        assert_eq!(strip_code_fence("  ```json\n{\"a\":1}\n```  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_response_attaches_metadata() {
        let stdout = json!({
            "type": "result",
            "is_error": false,
            "result": "{\"identical_fields\": [], \"summary\": {\"total_tables\": 2}}",
            "total_cost_usd": 0.0421,
            "duration_ms": 1800,
            "num_turns": 1,
            "session_id": "abc-123"
        })
        .to_string();

        let analysis = parse_response(&stdout).unwrap();
        assert_eq!(analysis["summary"]["total_tables"], 2);
        assert_eq!(
            analysis["_metadata"],
            json!({
                "cost_usd": 0.0421,
                "duration_ms": 1800,
                "num_turns": 1,
                "session_id": "abc-123"
            })
        );
    }

    #[test]
    fn test_parse_response_defaults_missing_metadata() {
        let stdout = json!({"result": "{}"}).to_string();
        let analysis = parse_response(&stdout).unwrap();
        assert_eq!(
            analysis["_metadata"],
            json!({"cost_usd": 0, "duration_ms": 0, "num_turns": 0, "session_id": ""})
        );
    }

    #[test]
    fn test_parse_response_reported_error() {
        let stdout = json!({"is_error": true, "result": "credit balance too low"}).to_string();
        let err = parse_response(&stdout).unwrap_err();
        assert!(matches!(err, AnalyzerError::Reported(ref msg) if msg == "credit balance too low"));

        let stdout = json!({"is_error": true}).to_string();
        let err = parse_response(&stdout).unwrap_err();
        assert!(matches!(err, AnalyzerError::Reported(ref msg) if msg == "Unknown error"));
    }

    #[test]
    fn test_parse_response_rejects_non_json_stdout() {
        assert!(matches!(
            parse_response("not json at all").unwrap_err(),
            AnalyzerError::Json(_)
        ));
    }

    #[test]
    fn test_parse_response_rejects_non_json_result() {
        let stdout = json!({"result": "Sure! Here is the analysis you asked for."}).to_string();
        assert!(matches!(
            parse_response(&stdout).unwrap_err(),
            AnalyzerError::Json(_)
        ));
    }

    #[test]
    fn test_parse_response_rejects_non_object_result() {
        let stdout = json!({"result": "[1, 2, 3]"}).to_string();
        let err = parse_response(&stdout).unwrap_err();
        assert!(matches!(err, AnalyzerError::MalformedResponse(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let analyzer = ExternalAnalyzer::new(AnalyzerConfig {
            program: "__sqlscope_missing_analyzer__".to_string(),
            ..AnalyzerConfig::default()
        });
        let err = analyzer.analyze(&json!({})).unwrap_err();
        assert!(matches!(err, AnalyzerError::Spawn { .. }));
    }

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.program, "claude");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.system_prompt.contains("valid JSON only"));
    }
}
