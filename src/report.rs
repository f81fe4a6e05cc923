//! Load results and the end-of-run summary

use crate::etl::PipelineRun;
use owo_colors::OwoColorize;
use std::process::ExitCode;
use std::time::Duration;

/// Which side an insert failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertFailureKind {
    /// The warehouse rejected the insert
    Database,
    /// Anything else: transport, unreadable response
    Unexpected,
}

impl std::fmt::Display for InsertFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => write!(f, "destination-database error"),
            Self::Unexpected => write!(f, "unexpected error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    pub kind: InsertFailureKind,
    pub detail: String,
}

/// Result of loading one destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    /// Qualified destination table name
    pub table: String,
    /// Rows submitted
    pub attempted: usize,
    /// Rows the warehouse confirmed, or why the insert failed
    ///
    /// `Ok(None)` means the warehouse accepted the batch without reporting
    /// a row count.
    pub result: Result<Option<u64>, InsertFailure>,
}

impl TableLoad {
    pub fn confirmed(&self) -> u64 {
        match self.result {
            Ok(Some(n)) => n,
            _ => 0,
        }
    }

    /// Accepted, but with no row count to check against
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self.result, Ok(None))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every destination table was loaded
    Complete,
    /// Some destination tables were loaded
    Partial,
    /// No destination table was loaded
    Failed,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Self::Complete => 0,
            Self::Partial => 2,
            Self::Failed => 3,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

impl LoadReport {
    pub fn attempted(&self) -> usize {
        self.tables.iter().map(|t| t.attempted).sum()
    }

    pub fn confirmed(&self) -> u64 {
        self.tables.iter().map(TableLoad::confirmed).sum()
    }

    pub fn outcome(&self) -> Outcome {
        let failed = self.tables.iter().filter(|t| t.result.is_err()).count();
        match failed {
            0 => Outcome::Complete,
            n if n == self.tables.len() => Outcome::Failed,
            _ => Outcome::Partial,
        }
    }
}

/// `M minutes and S.SSSSS seconds`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    format!(
        "{} minutes and {:.5} seconds",
        (secs / 60.0).floor() as u64,
        secs % 60.0
    )
}

pub fn banner(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Complete => "####OPERATION COMPLETE. DATA REPLICATED TO TERADATA OFS.####",
        Outcome::Partial => "####OPERATION FINISHED WITH ERRORS. REPLICATION IS PARTIAL.####",
        Outcome::Failed => "####OPERATION FAILED. NO DATA REPLICATED.####",
    }
}

/// Plain-text summary of a run, without the closing banner
pub fn render_summary(run: &PipelineRun<LoadReport>) -> String {
    let report = &run.report;
    let mut lines = vec![
        "####SUMMARY####".to_string(),
        format!(
            "Total number of rows fetched from PostgreSQL: {}",
            run.extracted
        ),
        format!(
            "Total number of rows submitted to Teradata: {} across {} table(s)",
            report.attempted(),
            report.tables.len()
        ),
    ];

    for table in &report.tables {
        lines.push(match &table.result {
            Ok(Some(confirmed)) => format!("  {}: {} row(s) confirmed", table.table, confirmed),
            Ok(None) => format!(
                "  {}: {} row(s) submitted, count not reported by Teradata",
                table.table, table.attempted
            ),
            Err(failure) => format!(
                "  {}: 0 of {} row(s) confirmed ({}: {})",
                table.table, table.attempted, failure.kind, failure.detail
            ),
        });
    }

    lines.push(format!(
        "Total number of rows confirmed by Teradata: {}",
        report.confirmed()
    ));
    lines.push(format!(
        "Total operational time: {}.",
        format_elapsed(run.elapsed)
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Print the summary and banner to stdout
pub fn print_summary(run: &PipelineRun<LoadReport>) {
    println!();
    print!("{}", render_summary(run));
    let outcome = run.report.outcome();
    match outcome {
        Outcome::Complete => println!("{}", banner(outcome).green()),
        Outcome::Partial => println!("{}", banner(outcome).yellow()),
        Outcome::Failed => println!("{}", banner(outcome).red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(table: &str, rows: usize) -> TableLoad {
        TableLoad {
            table: table.to_string(),
            attempted: rows,
            result: Ok(Some(rows as u64)),
        }
    }

    fn failed(table: &str, rows: usize, kind: InsertFailureKind) -> TableLoad {
        TableLoad {
            table: table.to_string(),
            attempted: rows,
            result: Err(InsertFailure {
                kind,
                detail: "[Error 2801] Duplicate unique prime key error".to_string(),
            }),
        }
    }

    #[test]
    fn test_outcomes() {
        let complete = LoadReport {
            tables: vec![loaded("a.ft", 3), loaded("a.ofs", 3)],
        };
        assert_eq!(complete.outcome(), Outcome::Complete);
        assert_eq!(complete.outcome().code(), 0);

        let partial = LoadReport {
            tables: vec![loaded("a.ft", 3), failed("a.ofs", 3, InsertFailureKind::Database)],
        };
        assert_eq!(partial.outcome(), Outcome::Partial);
        assert_eq!(partial.confirmed(), 3);
        assert_eq!(partial.attempted(), 6);

        let total = LoadReport {
            tables: vec![
                failed("a.ft", 3, InsertFailureKind::Unexpected),
                failed("a.ofs", 3, InsertFailureKind::Database),
            ],
        };
        assert_eq!(total.outcome(), Outcome::Failed);
        assert_eq!(total.outcome().code(), 3);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(
            format_elapsed(Duration::from_millis(125_500)),
            "2 minutes and 5.50000 seconds"
        );
        assert_eq!(
            format_elapsed(Duration::from_micros(1_250)),
            "0 minutes and 0.00125 seconds"
        );
    }

    #[test]
    fn test_render_summary_reports_confirmed_rows() {
        let run = PipelineRun {
            extracted: 3,
            report: LoadReport {
                tables: vec![
                    loaded("andy.ft_t", 3),
                    failed("andy.ofs_t", 3, InsertFailureKind::Database),
                ],
            },
            elapsed: Duration::from_secs(61),
        };

        let text = render_summary(&run);
        assert!(text.contains("rows fetched from PostgreSQL: 3"));
        assert!(text.contains("submitted to Teradata: 6 across 2 table(s)"));
        assert!(text.contains("andy.ft_t: 3 row(s) confirmed"));
        assert!(text.contains("andy.ofs_t: 0 of 3 row(s) confirmed (destination-database error"));
        assert!(text.contains("confirmed by Teradata: 3"));
        assert!(text.contains("1 minutes and 1.00000 seconds"));
        assert!(text.ends_with("seconds.\n"));
    }

    #[test]
    fn test_unreported_count_is_not_counted_as_confirmed() {
        let run = PipelineRun {
            extracted: 3,
            report: LoadReport {
                tables: vec![
                    loaded("andy.ft_t", 3),
                    TableLoad {
                        table: "andy.ofs_t".to_string(),
                        attempted: 3,
                        result: Ok(None),
                    },
                ],
            },
            elapsed: Duration::from_secs(1),
        };

        assert_eq!(run.report.outcome(), Outcome::Complete);
        assert_eq!(run.report.confirmed(), 3);
        assert!(run.report.tables[1].is_unconfirmed());

        let text = render_summary(&run);
        assert!(text.contains("andy.ofs_t: 3 row(s) submitted, count not reported by Teradata"));
        assert!(text.contains("confirmed by Teradata: 3"));
    }

    #[test]
    fn test_banner_only_claims_success_when_complete() {
        assert!(banner(Outcome::Complete).contains("COMPLETE"));
        assert!(!banner(Outcome::Partial).contains("COMPLETE"));
        assert!(!banner(Outcome::Failed).contains("COMPLETE"));
    }
}
