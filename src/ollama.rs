use anyhow::{anyhow, Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Generation can take a while on big (or cloud-backed) models.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin wrapper around the `ollama` CLI. Replies are produced by
/// spawning `ollama run <model>` with the prompt on stdin and
/// capturing stdout.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    timeout: Duration,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            timeout: GENERATE_TIMEOUT,
        }
    }

    /// Run the model once with the given prompt and return its reply.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!(model, prompt_len = prompt.len(), "spawning ollama run");

        let mut child = Command::new("ollama")
            .arg("run")
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(map_spawn_error)?;

        let mut stdin = child
            .stdin
            .take()
            .context("could not open stdin of the ollama process")?;
        stdin.write_all(prompt.as_bytes()).await?;
        // Close stdin so ollama knows the prompt is complete.
        drop(stdin);

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("model timed out after {} seconds", self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "ollama exited with failure");
            return Err(anyhow!(
                "ollama exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let reply = decode_escapes(&raw);
        if reply.is_empty() {
            return Err(anyhow!("model returned no output"));
        }
        Ok(reply)
    }

    /// List locally available models via `ollama list`.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let output = Command::new("ollama")
            .arg("list")
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            return Err(anyhow!(
                "failed to list models: ollama exited with {}",
                output.status
            ));
        }

        Ok(parse_model_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_spawn_error(err: std::io::Error) -> anyhow::Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        anyhow!("'ollama' not found. Install Ollama and make sure it is on your PATH.")
    } else {
        anyhow!("failed to start ollama: {}", err)
    }
}

/// `ollama list` prints a table (NAME, ID, SIZE, MODIFIED) with a
/// header row; the model name is the first column.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Some models emit JSON-escaped text (\uXXXX, \n). Interpret the
/// escapes via serde_json; if the output is not a valid JSON string
/// body, keep it as-is.
fn decode_escapes(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}
