//! Environment Variables
//!
//! `KEY="value"` style env files plus process-environment overrides.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: BTreeMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Parses env-file content. Blank lines, `#` comments and lines without
    /// `=` are skipped; a leading `export ` is ignored. A quoted value
    /// ends at its closing quote; a trailing ` #` comment is dropped.
    pub fn parse(content: &str) -> Self {
        let mut env = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            env.set(key, unquote(value.trim()));
        }
        env
    }

    /// Reads an env file. A missing file is an empty set, not an error.
    pub fn read_file(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no env file");
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Overlays process-environment values for `keys`.
    pub fn overlay_process<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            if let Ok(value) = std::env::var(key.as_ref()) {
                debug!(key = key.as_ref(), "env value taken from process environment");
                self.set(key.as_ref(), value);
            }
        }
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            // Anything after the closing quote is a comment.
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }
    // Unquoted values may carry a trailing comment.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}
