//! Run summary and the flat result file.

use crate::Result;
use chrono::Local;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Counts for one issue kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindSummary {
    pub kind: String,
    pub created: usize,
    pub linked: usize,
}

/// End-of-run numbers for the issues workflow.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub submitted: usize,
    pub per_kind: Vec<KindSummary>,
    /// Issues recovered by the retry sweep (already counted in `per_kind`).
    pub retry_created: usize,
    pub final_failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_created(&self) -> usize {
        self.per_kind.iter().map(|k| k.created).sum()
    }

    pub fn total_linked(&self) -> usize {
        self.per_kind.iter().map(|k| k.linked).sum()
    }

    /// Percentage of submitted requests that were created.
    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.total_created() as f64 / self.submitted as f64 * 100.0
        }
    }

    /// Human-readable result file body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Issue Creation Results");
        let _ = writeln!(out, "Timestamp: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        for kind in &self.per_kind {
            let _ = writeln!(out, "{} issues: {} (linked {})", kind.kind, kind.created, kind.linked);
        }
        let _ = writeln!(out, "Total: {}", self.total_created());
        if self.retry_created > 0 {
            let _ = writeln!(out, "Retry issues: {}", self.retry_created);
        }
        if self.final_failed > 0 {
            let _ = writeln!(out, "Final failed issues: {}", self.final_failed);
        }
        let _ = writeln!(out, "Execution time: {:.1}s", self.elapsed.as_secs_f64());
        let _ = writeln!(out, "Success rate: {:.1}%", self.success_rate());
        out
    }

    pub fn log(&self) {
        for kind in &self.per_kind {
            info!(kind = %kind.kind, created = kind.created, linked = kind.linked, "Kind summary");
        }
        let per_issue_secs = if self.total_created() > 0 {
            self.elapsed.as_secs_f64() / self.total_created() as f64
        } else {
            0.0
        };
        info!(
            submitted = self.submitted,
            created = self.total_created(),
            retry_created = self.retry_created,
            linked = self.total_linked(),
            final_failed = self.final_failed,
            success_rate = %format!("{:.1}%", self.success_rate()),
            elapsed_secs = %format!("{:.1}", self.elapsed.as_secs_f64()),
            per_issue_secs = %format!("{per_issue_secs:.2}"),
            "Issue creation completed"
        );
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        info!(path = %path.display(), "Result file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            submitted: 8,
            per_kind: vec![
                KindSummary {
                    kind: "task".into(),
                    created: 5,
                    linked: 4,
                },
                KindSummary {
                    kind: "kpt".into(),
                    created: 1,
                    linked: 1,
                },
            ],
            retry_created: 2,
            final_failed: 2,
            elapsed: Duration::from_millis(12_340),
        }
    }

    #[test]
    fn test_counts_and_rate() {
        let s = summary();
        assert_eq!(s.total_created(), 6);
        assert_eq!(s.total_linked(), 5);
        assert!((s.success_rate() - 75.0).abs() < 1e-9);
        assert_eq!(RunSummary::default().success_rate(), 0.0);
    }

    #[test]
    fn test_render_lines() {
        let text = summary().render();
        assert!(text.contains("task issues: 5 (linked 4)"));
        assert!(text.contains("Total: 6"));
        assert!(text.contains("Retry issues: 2"));
        assert!(text.contains("Final failed issues: 2"));
        assert!(text.contains("Execution time: 12.3s"));
        assert!(text.contains("Success rate: 75.0%"));
    }

    #[test]
    fn test_clean_run_omits_retry_lines() {
        let mut s = summary();
        s.retry_created = 0;
        s.final_failed = 0;
        let text = s.render();
        assert!(!text.contains("Retry issues"));
        assert!(!text.contains("Final failed"));
    }
}
