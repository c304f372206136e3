//! Summary of a finished generation run.

use modelgen_core::{Artifact, PersistResult};
use serde::Serialize;

use super::Diagnostic;

/// Overall outcome of a run that did not fail fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Clean,
    CompletedWithErrors,
}

/// Persistence outcome for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub kind: String,
    pub path: String,
    pub result: PersistResult,
}

/// Counters, diagnostics and file outcomes of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub incremental: bool,
    pub total_nodes: usize,
    pub matched_nodes: usize,
    pub written: usize,
    pub skipped_unchanged: usize,
    pub skipped_no_override: usize,
    pub per_node_errors: usize,
    pub unresolved_references: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn new(incremental: bool) -> Self {
        Self {
            incremental,
            ..Self::default()
        }
    }

    pub(crate) fn record_file(&mut self, artifact: &Artifact, result: PersistResult) {
        match result {
            PersistResult::Written => self.written += 1,
            PersistResult::SkippedUnchanged => self.skipped_unchanged += 1,
            PersistResult::SkippedNoOverride => self.skipped_no_override += 1,
        }
        self.files.push(FileOutcome {
            kind: artifact.kind().to_string(),
            path: artifact.path().to_string(),
            result,
        });
    }

    pub(crate) fn record_node_error(&mut self, diagnostic: Diagnostic) {
        self.per_node_errors += 1;
        self.diagnostics.push(diagnostic);
    }

    /// [`RunStatus::CompletedWithErrors`] once any node error was recorded.
    pub fn status(&self) -> RunStatus {
        if self.per_node_errors == 0 {
            RunStatus::Clean
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    pub fn is_clean(&self) -> bool {
        self.status() == RunStatus::Clean
    }

    /// Paths whose persistence ended with `result`.
    pub fn paths(&self, result: PersistResult) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.result == result)
            .map(|f| f.path.as_str())
            .collect()
    }

    /// Error diagnostics in the order they were raised.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity.is_warning())
    }

    /// Serialize the report, including its status, as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct WithStatus<'a> {
            status: RunStatus,
            #[serde(flatten)]
            report: &'a RunReport,
        }

        serde_json::to_string_pretty(&WithStatus {
            status: self.status(),
            report: self,
        })
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} nodes matched, {} written, {} unchanged, {} protected, {} errors",
            self.matched_nodes,
            self.total_nodes,
            self.written,
            self.skipped_unchanged,
            self.skipped_no_override,
            self.per_node_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut report = RunReport::new(false);
        report.total_nodes = 3;
        report.matched_nodes = 2;
        report.record_file(&Artifact::new("file", "a.txt", "a"), PersistResult::Written);
        report.record_file(
            &Artifact::new("file", "b.txt", "b"),
            PersistResult::SkippedUnchanged,
        );
        report
    }

    #[test]
    fn test_counters_follow_results() {
        let report = report();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped_unchanged, 1);
        assert_eq!(report.paths(PersistResult::Written), vec!["a.txt"]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_node_error_changes_status() {
        let mut report = report();
        report.record_node_error(Diagnostic::error("generate", "boom"));
        assert_eq!(report.status(), RunStatus::CompletedWithErrors);
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            report().to_string(),
            "2 of 3 nodes matched, 1 written, 1 unchanged, 0 protected, 0 errors"
        );
    }

    #[test]
    fn test_to_json() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "clean");
        assert_eq!(json["written"], 1);
        assert_eq!(json["files"][1]["result"], "skipped-unchanged");
    }
}
