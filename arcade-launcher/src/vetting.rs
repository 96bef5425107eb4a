//! Static vetting of payload source text.
//!
//! This is a tripwire against careless payloads, not a security boundary:
//! only the first [`SCAN_WINDOW_BYTES`] are inspected and any reformatting
//! of a banned call slips past the patterns.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::ScanError;
use crate::path::ValidatedScript;

/// How much of the payload head is scanned.
pub const SCAN_WINDOW_BYTES: usize = 2048;

/// Dangerous-call signatures, matched case-insensitively.
///
/// Each entry is `(name reported on rejection, pattern)`. Word boundaries
/// mean prefixed names such as `literal_eval(` or `my_open(` are not flagged.
pub const DEFAULT_SIGNATURES: &[(&str, &str)] = &[
    ("eval(", r"\beval\s*\("),
    ("exec(", r"\bexec\s*\("),
    ("os.system(", r"\bos\s*\.\s*system\s*\("),
    ("os.popen(", r"\bos\s*\.\s*popen\s*\("),
    ("subprocess call", r"\bsubprocess\s*\.\s*\w+\s*\("),
    ("__import__(", r"__import__\s*\("),
    ("input(", r"\binput\s*\("),
    ("raw_input(", r"\braw_input\s*\("),
    ("open(", r"\bopen\s*\("),
];

static DEFAULT_VETTER: LazyLock<StaticVetter> = LazyLock::new(default_vetter);

#[expect(clippy::expect_used, reason = "built-in signatures are valid regexes")]
fn default_vetter() -> StaticVetter {
    StaticVetter::with_signatures(DEFAULT_SIGNATURES).expect("built-in signatures compile")
}

/// A payload that passed static vetting. Required by the process launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VettedScript {
    path: PathBuf,
}

impl VettedScript {
    /// Canonical absolute path of the payload.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone)]
struct Signature {
    name: String,
    pattern: Regex,
}

/// Scans payload heads for banned call signatures.
#[derive(Debug, Clone)]
pub struct StaticVetter {
    signatures: Vec<Signature>,
}

impl Default for StaticVetter {
    fn default() -> Self {
        DEFAULT_VETTER.clone()
    }
}

impl StaticVetter {
    /// Build a vetter from `(name, pattern)` pairs.
    ///
    /// # Errors
    /// Returns the regex error of the first pattern that fails to compile.
    pub fn with_signatures(signatures: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let signatures = signatures
            .iter()
            .map(|(name, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|pattern| Signature { name: (*name).to_owned(), pattern })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { signatures })
    }

    /// Name of the first signature found in `text`, if any.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.signatures
            .iter()
            .find(|sig| sig.pattern.is_match(text))
            .map(|sig| sig.name.as_str())
    }

    /// Scan the head of a validated payload.
    ///
    /// # Errors
    /// - [`ScanError::ContentRejected`] naming the matched signature
    /// - [`ScanError::NotText`] if the head is not UTF-8
    /// - [`ScanError::Io`] if the file cannot be read
    pub fn scan(&self, script: ValidatedScript) -> Result<VettedScript, ScanError> {
        let path = script.path();
        let head = read_head(path).map_err(|source| ScanError::Io {
            path: path.to_owned(),
            source,
        })?;
        let text = decode_head(&head).ok_or_else(|| ScanError::NotText { path: path.to_owned() })?;

        if let Some(signature) = self.first_match(text) {
            tracing::warn!(path = %path.display(), signature, "payload rejected by static vetting");
            return Err(ScanError::ContentRejected {
                path: path.to_owned(),
                signature: signature.to_owned(),
            });
        }

        Ok(VettedScript { path: path.to_owned() })
    }
}

pub(crate) fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SCAN_WINDOW_BYTES);
    File::open(path)?
        .take(SCAN_WINDOW_BYTES as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// Decode the head as UTF-8, tolerating a code point cut at the window edge.
pub(crate) fn decode_head(head: &[u8]) -> Option<&str> {
    match std::str::from_utf8(head) {
        Ok(text) => Some(text),
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok(),
        Err(_) => None,
    }
}
