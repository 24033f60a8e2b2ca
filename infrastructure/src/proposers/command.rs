//! Subprocess proposer
//!
//! Spawns the configured command once per proposal, writes a JSON request
//! to its stdin and parses the action from its stdout:
//!
//! ```text
//! stdin:  {"observation": "...", "has_image": false}
//! stdout: {"type": "click", "target": "#add-to-cart"}
//! ```
//!
//! Any wrapper model (OpenAI, Anthropic, a local script) can sit behind this
//! without the committee knowing about it. The child is killed when the
//! committee's per-call timeout drops the future.

use async_trait::async_trait;
use committee_application::{ProposerError, ProposerPort};
use committee_domain::util::truncate_str;
use committee_domain::{Action, parse_action};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Maximum stderr echoed into an error message
const MAX_STDERR_BYTES: usize = 500;

pub struct CommandProposer {
    name: String,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandProposer {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn request(observation: &str, image: Option<&[u8]>) -> String {
        serde_json::json!({
            "observation": observation,
            "has_image": image.is_some(),
        })
        .to_string()
    }
}

#[async_trait]
impl ProposerPort for CommandProposer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn propose(&self, observation: &str, image: Option<&[u8]>) -> Result<Action, ProposerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProposerError::Unavailable(format!("failed to spawn '{}': {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(Self::request(observation, image).as_bytes())
                .await
                .map_err(|e| ProposerError::Other(format!("failed to write request: {}", e)))?;
            // Dropping stdin closes the pipe so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProposerError::Other(format!("failed to read output: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProposerError::Unavailable(format!(
                "'{}' exited with {}: {}",
                self.name,
                output.status,
                truncate_str(stderr.trim(), MAX_STDERR_BYTES)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Proposer {} returned {} bytes", self.name, stdout.len());
        Ok(parse_action(&stdout)?)
    }
}
