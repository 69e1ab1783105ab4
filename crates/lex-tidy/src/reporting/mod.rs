//! Run report generation.
//!
//! A [`RunReport`] gathers everything a run produced: stage statuses, the
//! full audit trail, the header mapping, before/after quality scores and
//! every validation finding. The Export stage writes it next to the cleaned
//! file as `<stem>_report.json`; the CLI prints the same structure with
//! `--json`.

mod generator;

pub use generator::{ReportGenerator, RunReport, RunSummary};
