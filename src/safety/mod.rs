//! Pre-dispatch content filtering.
//!
//! A fixed table of dangerous-command and malware-keyword patterns, applied
//! to inbound prompt text before any enrichment or model dispatch. Stateless
//! and scope-independent; a match aborts the pipeline before cost accrues.

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Destructive filesystem commands
        (
            Regex::new(r"(?i)\brm\s+(-[a-z]+\s+)*(/|--no-preserve-root)").unwrap(),
            "recursive filesystem delete",
        ),
        (Regex::new(r"(?i)\bmkfs(\.\w+)?\b").unwrap(), "filesystem format"),
        (
            Regex::new(r"(?i)\bdd\s+.*of\s*=\s*/dev/").unwrap(),
            "raw device write",
        ),
        (
            Regex::new(r":\(\)\s*\{\s*:\|:&\s*\}\s*;?\s*:").unwrap(),
            "fork bomb",
        ),
        (
            Regex::new(r"(?i)\b(shutdown|reboot|halt)\s+(-|/)[a-z]").unwrap(),
            "forced shutdown",
        ),
        (
            Regex::new(r"(?i)\bdel\s+/[fsq]\s+.*c:\\").unwrap(),
            "windows system delete",
        ),
        (
            Regex::new(r"(?i)format\s+c:").unwrap(),
            "windows drive format",
        ),
        // Registry and boot tampering
        (
            Regex::new(r"(?i)\breg\s+delete\s+hklm").unwrap(),
            "registry tampering",
        ),
        (
            Regex::new(r"(?i)\bbcdedit\b.*\bset\b").unwrap(),
            "boot configuration tampering",
        ),
        (
            Regex::new(r"(?i)\bvssadmin\s+delete\s+shadows").unwrap(),
            "shadow copy deletion",
        ),
        // Malware-adjacent intents
        (Regex::new(r"(?i)\bkeylogger\b").unwrap(), "keylogger"),
        (Regex::new(r"(?i)\bransomware\b").unwrap(), "ransomware"),
        (
            Regex::new(r"(?i)\breverse\s+shell\b").unwrap(),
            "reverse shell",
        ),
        (
            Regex::new(r"(?i)\bcredential\s+(dump|harvest)").unwrap(),
            "credential dumping",
        ),
        (
            Regex::new(r"(?i)\bdisable\s+(defender|antivirus|firewall)\b").unwrap(),
            "security tooling disablement",
        ),
        (
            Regex::new(r"(?i)\bexfiltrat\w+\b").unwrap(),
            "data exfiltration",
        ),
    ]
});

/// Input rejected by the safety filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content rejected: matched unsafe pattern ({pattern})")]
pub struct ContentViolation {
    pub pattern: &'static str,
}

/// Stateless pattern-based input filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSafetyFilter;

impl ContentSafetyFilter {
    pub fn new() -> Self {
        Self
    }

    /// Scan text against the pattern table. Pure function of the input.
    pub fn scan(&self, text: &str) -> Result<(), ContentViolation> {
        for (regex, label) in UNSAFE_PATTERNS.iter() {
            if regex.is_match(text) {
                return Err(ContentViolation { pattern: label });
            }
        }
        Ok(())
    }
}
