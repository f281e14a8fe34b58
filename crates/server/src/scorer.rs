//! External Scorer Gateway.
//!
//! Similarity scoring runs in separate processes (a different runtime with
//! heavy model dependencies). Each invocation spawns the configured command
//! with the request tokens appended as positional arguments, captures stdout
//! and stderr into bounded buffers, waits up to the configured timeout, and
//! parses a single JSON object from the trimmed stdout:
//!
//! - candidate roles reply `{"numbers": [int, ...]}` or `{"error": "..."}`,
//! - the embed role replies `{"embeddings": [[f32, ...]], "field": "..."}` or
//!   `{"error": "..."}`.
//!
//! Invocations share no state; concurrent requests each get their own child.

use crate::api::metrics;
use async_trait::async_trait;
use kural_core::config;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::process::Stdio;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Which configured scorer command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// Candidate verse numbers from verse filters.
    Verses,
    /// Candidate question numbers from question filters.
    Questions,
    /// Embedding of raw text.
    Embed,
}

impl ScorerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScorerKind::Verses => "verses",
            ScorerKind::Questions => "questions",
            ScorerKind::Embed => "embed",
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scorer command line: program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ScorerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl FromStr for ScorerCommand {
    type Err = String;

    /// Splits on whitespace. No shell quoting is interpreted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| "scorer command must not be empty".to_string())?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for ScorerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Scorer failures.
#[derive(Debug, Error)]
pub enum ScorerError {
    /// The program could not be started.
    #[error("failed to start scorer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process exited unsuccessfully. `stderr` is the captured diagnostic text.
    #[error("scorer exited with {status}: {stderr}")]
    Process { status: String, stderr: String },

    /// Stdout was not a reply of the expected shape, or was too large.
    #[error("invalid scorer output: {0}")]
    Output(String),

    /// The scorer replied with an explicit `error` field.
    #[error("scorer reported an error: {0}")]
    Reported(String),

    /// The process did not finish in time and was killed.
    #[error("scorer did not finish within {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ScorerError {
    /// Client-facing detail: captured stderr verbatim, the parse error, or the
    /// scorer's own message.
    pub fn detail(&self) -> String {
        match self {
            ScorerError::Spawn { source, .. } => source.to_string(),
            ScorerError::Process { stderr, .. } => stderr.clone(),
            ScorerError::Output(msg) | ScorerError::Reported(msg) => msg.clone(),
            ScorerError::Timeout(_) => self.to_string(),
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            ScorerError::Spawn { .. } => "spawn_error",
            ScorerError::Process { .. } => "process_error",
            ScorerError::Output(_) => "output_error",
            ScorerError::Reported(_) => "reported_error",
            ScorerError::Timeout(_) => "timeout",
        }
    }
}

/// Similarity scoring, as seen by the resolver.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Runs a candidate scorer with `tokens` and returns the candidate numbers,
    /// possibly empty.
    async fn candidates(&self, kind: ScorerKind, tokens: &[String])
        -> Result<Vec<i64>, ScorerError>;

    /// Embeds `text` for comparison against the stored embeddings of `field`.
    async fn embed(&self, text: &str, field: &str) -> Result<Vec<f32>, ScorerError>;
}

#[derive(Debug, Deserialize)]
struct CandidateReply {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    numbers: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct EmbedReply {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Parses a candidate reply. A reply without `numbers` is an empty list.
pub fn parse_candidates(stdout: &str) -> Result<Vec<i64>, ScorerError> {
    let reply: CandidateReply =
        serde_json::from_str(stdout).map_err(|e| ScorerError::Output(e.to_string()))?;
    match reply.error {
        Some(message) => Err(ScorerError::Reported(message)),
        None => Ok(reply.numbers),
    }
}

/// Parses an embed reply, returning the first embedding row.
pub fn parse_embedding(stdout: &str) -> Result<Vec<f32>, ScorerError> {
    let reply: EmbedReply =
        serde_json::from_str(stdout).map_err(|e| ScorerError::Output(e.to_string()))?;
    if let Some(message) = reply.error {
        return Err(ScorerError::Reported(message));
    }
    reply
        .embeddings
        .into_iter()
        .next()
        .filter(|row| !row.is_empty())
        .ok_or_else(|| ScorerError::Output("reply contains no embedding".into()))
}

struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Reads at most `limit` bytes, then drains the rest so the child never
/// blocks on a full pipe.
async fn read_bounded<R>(mut reader: R, limit: usize) -> io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    (&mut reader)
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .await?;
    let truncated = bytes.len() > limit;
    if truncated {
        bytes.truncate(limit);
        tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    }
    Ok(Captured { bytes, truncated })
}

/// Production [`Scorer`] backed by OS processes.
#[derive(Debug, Clone)]
pub struct ScorerGateway {
    verses: ScorerCommand,
    questions: ScorerCommand,
    embed: ScorerCommand,
    timeout: Duration,
    max_stdout_bytes: usize,
    max_stderr_bytes: usize,
}

impl ScorerGateway {
    pub fn new(
        verses: ScorerCommand,
        questions: ScorerCommand,
        embed: ScorerCommand,
        timeout: Duration,
    ) -> Self {
        Self {
            verses,
            questions,
            embed,
            timeout,
            max_stdout_bytes: config::MAX_SCORER_STDOUT_BYTES,
            max_stderr_bytes: config::MAX_SCORER_STDERR_BYTES,
        }
    }

    /// Overrides the capture limits.
    pub fn with_output_limits(mut self, stdout_bytes: usize, stderr_bytes: usize) -> Self {
        self.max_stdout_bytes = stdout_bytes;
        self.max_stderr_bytes = stderr_bytes;
        self
    }

    pub fn command(&self, kind: ScorerKind) -> &ScorerCommand {
        match kind {
            ScorerKind::Verses => &self.verses,
            ScorerKind::Questions => &self.questions,
            ScorerKind::Embed => &self.embed,
        }
    }

    /// Runs the `kind` scorer with `tokens` and returns its trimmed stdout.
    pub async fn run(&self, kind: ScorerKind, tokens: &[String]) -> Result<String, ScorerError> {
        let start = Instant::now();
        let result = self.execute(kind, tokens).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => {
                tracing::info!(
                    role = %kind,
                    tokens = tokens.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Scorer finished"
                );
                metrics::record_scorer_invocation(kind.as_str(), "ok", elapsed);
            }
            Err(e) => {
                tracing::warn!(
                    role = %kind,
                    tokens = tokens.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Scorer failed"
                );
                metrics::record_scorer_invocation(kind.as_str(), e.outcome(), elapsed);
            }
        }
        result
    }

    async fn execute(&self, kind: ScorerKind, tokens: &[String]) -> Result<String, ScorerError> {
        let command = self.command(kind);
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .args(tokens)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScorerError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScorerError::Output("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScorerError::Output("stderr was not captured".into()))?;

        let waited = tokio::time::timeout(self.timeout, async {
            tokio::join!(
                read_bounded(stdout, self.max_stdout_bytes),
                read_bounded(stderr, self.max_stderr_bytes),
                child.wait(),
            )
        })
        .await;

        let (stdout, stderr, status) = match waited {
            Ok(collected) => collected,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::error!(role = %kind, "Failed to kill timed-out scorer: {}", e);
                }
                return Err(ScorerError::Timeout(self.timeout));
            }
        };

        let status = status.map_err(|e| ScorerError::Process {
            status: "unknown".into(),
            stderr: e.to_string(),
        })?;
        let stderr = stderr.map_err(|e| ScorerError::Output(e.to_string()))?;
        let stdout = stdout.map_err(|e| ScorerError::Output(e.to_string()))?;

        if !status.success() {
            let mut text = String::from_utf8_lossy(&stderr.bytes).into_owned();
            if stderr.truncated {
                text.push_str("\n[stderr truncated]");
            }
            return Err(ScorerError::Process {
                status: status.to_string(),
                stderr: text,
            });
        }
        if stdout.truncated {
            return Err(ScorerError::Output(format!(
                "output exceeds {} bytes",
                self.max_stdout_bytes
            )));
        }
        Ok(String::from_utf8_lossy(&stdout.bytes).trim().to_string())
    }
}

#[async_trait]
impl Scorer for ScorerGateway {
    async fn candidates(
        &self,
        kind: ScorerKind,
        tokens: &[String],
    ) -> Result<Vec<i64>, ScorerError> {
        let stdout = self.run(kind, tokens).await?;
        parse_candidates(&stdout)
    }

    async fn embed(&self, text: &str, field: &str) -> Result<Vec<f32>, ScorerError> {
        let tokens = [text.to_string(), field.to_string()];
        let stdout = self.run(ScorerKind::Embed, &tokens).await?;
        parse_embedding(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let cmd: ScorerCommand = "python3  scorer/verses.py --top 5".parse().unwrap();
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["scorer/verses.py", "--top", "5"]);
        assert_eq!(cmd.to_string(), "python3 scorer/verses.py --top 5");
        assert!("   ".parse::<ScorerCommand>().is_err());
    }

    #[test]
    fn test_parse_candidates() {
        assert_eq!(parse_candidates(r#"{"numbers": [3, 7, 99]}"#).unwrap(), vec![3, 7, 99]);
        assert!(parse_candidates(r#"{"numbers": []}"#).unwrap().is_empty());
        assert!(parse_candidates("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_candidates_reported_error() {
        let err = parse_candidates(r#"{"error": "index missing"}"#).unwrap_err();
        assert!(matches!(err, ScorerError::Reported(ref m) if m == "index missing"));
        assert_eq!(err.detail(), "index missing");
    }

    #[test]
    fn test_parse_candidates_rejects_non_json() {
        let err = parse_candidates("Traceback (most recent call last)").unwrap_err();
        assert!(matches!(err, ScorerError::Output(_)));
        let err = parse_candidates(r#"{"numbers": ["three"]}"#).unwrap_err();
        assert!(matches!(err, ScorerError::Output(_)));
    }

    #[test]
    fn test_parse_embedding_takes_first_row() {
        let v = parse_embedding(r#"{"embeddings": [[0.5, 1.0], [9.0, 9.0]], "field": "verse"}"#)
            .unwrap();
        assert_eq!(v, vec![0.5, 1.0]);
        assert!(matches!(
            parse_embedding(r#"{"embeddings": [], "field": "verse"}"#),
            Err(ScorerError::Output(_))
        ));
        assert!(matches!(
            parse_embedding(r#"{"error": "bad field"}"#),
            Err(ScorerError::Reported(_))
        ));
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        /// Gateway whose every role runs `sh -c <script>`; tokens become `$1..`.
        fn sh_gateway(script: &str, timeout: Duration) -> ScorerGateway {
            let cmd = ScorerCommand::new(
                "sh",
                vec!["-c".to_string(), script.to_string(), "scorer".to_string()],
            );
            ScorerGateway::new(cmd.clone(), cmd.clone(), cmd, timeout)
        }

        fn tokens(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        #[tokio::test]
        async fn test_candidates_success() {
            let gw = sh_gateway(r#"echo '{"numbers": [3, 7, 99]}'"#, Duration::from_secs(10));
            let numbers = gw
                .candidates(ScorerKind::Verses, &tokens(&["அறம்", "chapterName"]))
                .await
                .unwrap();
            assert_eq!(numbers, vec![3, 7, 99]);
        }

        #[tokio::test]
        async fn test_tokens_are_positional_arguments() {
            let gw = sh_gateway(
                r#"printf '{"numbers": [%s]}' "$#""#,
                Duration::from_secs(10),
            );
            let numbers = gw
                .candidates(ScorerKind::Questions, &tokens(&["Hindi", "what is virtue", "input"]))
                .await
                .unwrap();
            assert_eq!(numbers, vec![3]);
        }

        #[tokio::test]
        async fn test_nonzero_exit_surfaces_stderr() {
            let gw = sh_gateway("echo 'model load failed' >&2; exit 3", Duration::from_secs(10));
            let err = gw.candidates(ScorerKind::Verses, &[]).await.unwrap_err();
            match &err {
                ScorerError::Process { stderr, status } => {
                    assert!(stderr.contains("model load failed"));
                    assert!(status.contains('3'));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(err.detail().contains("model load failed"));
        }

        #[tokio::test]
        async fn test_timeout_kills_child() {
            let gw = sh_gateway("sleep 30", Duration::from_millis(200));
            let start = Instant::now();
            let err = gw.candidates(ScorerKind::Verses, &[]).await.unwrap_err();
            assert!(matches!(err, ScorerError::Timeout(_)));
            assert!(start.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn test_oversized_stdout_is_output_error() {
            let gw = sh_gateway("head -c 4096 /dev/zero | tr '\\0' 'x'", Duration::from_secs(10))
                .with_output_limits(1024, 1024);
            let err = gw.run(ScorerKind::Verses, &[]).await.unwrap_err();
            assert!(matches!(err, ScorerError::Output(ref m) if m.contains("1024")));
        }

        #[tokio::test]
        async fn test_oversized_stderr_is_truncated() {
            let gw = sh_gateway(
                "head -c 4096 /dev/zero | tr '\\0' 'e' >&2; exit 1",
                Duration::from_secs(10),
            )
            .with_output_limits(1024, 100);
            let err = gw.run(ScorerKind::Verses, &[]).await.unwrap_err();
            let detail = err.detail();
            assert!(detail.starts_with(&"e".repeat(100)));
            assert!(detail.ends_with("[stderr truncated]"));
        }

        #[tokio::test]
        async fn test_missing_program_is_spawn_error() {
            let cmd = ScorerCommand::new("/nonexistent/kural-scorer", Vec::new());
            let gw = ScorerGateway::new(cmd.clone(), cmd.clone(), cmd, Duration::from_secs(5));
            let err = gw.candidates(ScorerKind::Verses, &[]).await.unwrap_err();
            assert!(matches!(err, ScorerError::Spawn { .. }));
        }

        #[tokio::test]
        async fn test_embed_passes_text_and_field() {
            let gw = sh_gateway(
                r#"if [ "$2" = "translation" ]; then echo '{"embeddings": [[1.0, 0.0]], "field": "translation"}'; else echo '{"error": "bad field"}'; fi"#,
                Duration::from_secs(10),
            );
            assert_eq!(gw.embed("rain", "translation").await.unwrap(), vec![1.0, 0.0]);
            assert!(matches!(
                gw.embed("rain", "verse").await,
                Err(ScorerError::Reported(_))
            ));
        }
    }
}
