//! Findings and Reports
//!
//! Rules produce findings. The report only aggregates them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hashing::compute_report_digest;
use crate::CHECKER_VERSION;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    fn marker(self) -> &'static str {
        match self {
            Severity::Ok => "✅",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        }
    }
}

/// One result of one rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remedy: Option<String>,
}

impl Finding {
    pub fn ok(rule: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Ok, subject, message)
    }

    pub fn warning(rule: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Warning, subject, message)
    }

    pub fn error(rule: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Error, subject, message)
    }

    fn new(
        rule: &str,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            subject: subject.into(),
            message: message.into(),
            remedy: None,
        }
    }

    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remedy = Some(remedy.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity.marker(), self.subject, self.message)?;
        if let Some(remedy) = &self.remedy {
            write!(f, "\n   Fix: {}", remedy)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceReport {
    pub passed: bool,
    pub findings: Vec<Finding>,
}

impl ComplianceReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let passed = !findings.iter().any(Finding::is_error);
        Self { passed, findings }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Warning)
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    /// SHA-256 over the checker version and the canonical JSON of the findings.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        compute_report_digest(&self.findings, CHECKER_VERSION)
    }

    /// Merge another report's findings after this one's, recomputing `passed`.
    pub fn extend(&mut self, other: ComplianceReport) {
        self.findings.extend(other.findings);
        self.passed = !self.findings.iter().any(Finding::is_error);
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current_rule: Option<&str> = None;
        for finding in &self.findings {
            if current_rule != Some(finding.rule.as_str()) {
                if current_rule.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "[{}]", finding.rule)?;
                current_rule = Some(finding.rule.as_str());
            }
            writeln!(f, "{}", finding)?;
        }
        writeln!(f)?;
        write!(
            f,
            "Summary: {} ok, {} warning(s), {} error(s) - {}",
            self.count(Severity::Ok),
            self.count(Severity::Warning),
            self.count(Severity::Error),
            if self.passed { "PASSED" } else { "FAILED" },
        )
    }
}
