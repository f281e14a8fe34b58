//! Global configuration constants for the kural backend.
//!
//! Collection names, scorer limits, input validation limits, and server defaults
//! are defined here. These are compile-time constants; runtime configuration is
//! handled via CLI arguments and environment variables in the server's `main.rs`.

/// Base verse collection (Tamil text with parallel English fields).
pub const BASE_VERSE_COLLECTION: &str = "DETAIL1";

/// Hindi verse collection.
pub const HINDI_VERSE_COLLECTION: &str = "HINDI_DETAIL";

/// Russian verse collection.
pub const RUSSIAN_VERSE_COLLECTION: &str = "RUSSIAN_DETAIL";

/// Generic question collection (`inputs` / `targets` / `english_input`).
pub const BASE_QUESTION_COLLECTION: &str = "DETAIL2";

/// Hindi question collection (`input` / `target`).
pub const HINDI_QUESTION_COLLECTION: &str = "HINDI_QUESTIONS";

/// Russian question collection (`input` / `target`).
pub const RUSSIAN_QUESTION_COLLECTION: &str = "RUSSIAN_QUESTIONS";

/// File extension of collection snapshot files inside the data directory.
pub const SNAPSHOT_EXTENSION: &str = "json";

/// Default embedding table file name inside the data directory.
pub const DEFAULT_EMBEDDINGS_FILE: &str = "embeddings.json";

/// Default English word list file name inside the data directory.
pub const DEFAULT_LEXICON_FILE: &str = "english_words.txt";

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory holding collection snapshots and lookup tables.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default command line for the verse scorer.
pub const DEFAULT_VERSE_SCORER: &str = "python3 scorer/verses.py";

/// Default command line for the question scorer.
pub const DEFAULT_QUESTION_SCORER: &str = "python3 scorer/questions.py";

/// Default command line for the embedding scorer used by `/api/compare`.
pub const DEFAULT_EMBED_SCORER: &str = "python3 scorer/embed.py";

/// Default bounded wait for one scorer invocation, in seconds.
///
/// Model loading dominates scorer start-up, so this is generous.
pub const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 60;

/// Maximum captured scorer standard output in bytes (1 MiB).
///
/// Output beyond this is a protocol violation: the reply is a single small JSON object.
pub const MAX_SCORER_STDOUT_BYTES: usize = 1024 * 1024;

/// Maximum captured scorer standard error in bytes (64 KiB). Excess is truncated.
pub const MAX_SCORER_STDERR_BYTES: usize = 64 * 1024;

/// Maximum length of a single filter value in bytes.
pub const MAX_FILTER_VALUE_LEN: usize = 4096;

/// Maximum length of the `/api/compare` text in bytes.
pub const MAX_COMPARE_TEXT_LEN: usize = 16 * 1024;

/// Per-request timeout in seconds. Must exceed the default scorer timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 90;

/// Maximum HTTP request body size in bytes (1 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Maximum number of concurrent in-flight requests.
///
/// Each scorer-backed request spawns a process, so this also bounds live scorer children.
pub const MAX_CONCURRENT_REQUESTS: usize = 64;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
