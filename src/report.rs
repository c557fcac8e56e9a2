// src/report.rs
//! Report rendering (pure) and persistence.
//!
//! Layout:
//! ```text
//! {title} (YYYY-MM-DD)
//! ====================
//!
//! [Top choice] From {origin} to {dest}:
//! - Estimated travel time now: 15.0 min
//! - Free flow travel time: 14.5 min
//! - Traffic congestion index: 1.03 (Nice!)
//!
//! <Travel advisor recommendation>
//! {advisory or sentinel}
//! ```
//! Blocks are separated by one blank line.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::advisory::EnrichedEntry;
use crate::config::app::DEFAULT_REPORT_TITLE;
use crate::rank::Thresholds;

pub const RULE: &str = "====================";
pub const ADVISORY_LABEL: &str = "<Travel advisor recommendation>";
pub const NO_DATA: &str = "No route data available for this run.\n";

/// Rendered document for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub text: String,
}

/// Fixed parts of the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub thresholds: Thresholds,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl ReportLayout {
    pub fn new(title: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            title: title.into(),
            thresholds,
        }
    }

    pub fn render(&self, entries: &[EnrichedEntry], date: NaiveDate) -> String {
        let mut out = format!("{} ({})\n{RULE}\n\n", self.title, date.format("%Y-%m-%d"));
        if entries.is_empty() {
            out.push_str(NO_DATA);
            return out;
        }
        let blocks: Vec<String> = entries.iter().map(|e| self.block(e)).collect();
        out.push_str(&blocks.join("\n"));
        out
    }

    pub fn summary(&self, e: &EnrichedEntry) -> String {
        let rec = &e.entry.record;
        let tag = e.entry.label.map(|l| l.tag()).unwrap_or("");
        let status = self.thresholds.status(rec.congestion_ratio).label();
        format!(
            "{tag}From {} to {}:\n\
             - Estimated travel time now: {:.1} min\n\
             - Free flow travel time: {:.1} min\n\
             - Traffic congestion index: {:.2} ({status})\n",
            rec.origin_name,
            rec.dest_name,
            rec.travel_time_minutes,
            rec.free_flow_time_minutes,
            rec.congestion_ratio,
        )
    }

    fn block(&self, e: &EnrichedEntry) -> String {
        format!(
            "{}\n{ADVISORY_LABEL}\n{}\n",
            self.summary(e),
            e.advisory.as_text()
        )
    }

    pub fn build(&self, entries: &[EnrichedEntry], date: NaiveDate) -> Report {
        Report {
            generated_on: date,
            text: self.render(entries, date),
        }
    }
}

/// Render with the default title and thresholds.
pub fn render(entries: &[EnrichedEntry], date: NaiveDate) -> String {
    ReportLayout::default().render(entries, date)
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("daily_report_{}.txt", date.format("%Y-%m-%d"))
}

fn write_and_swap(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = fs::File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(bytes)
        .with_context(|| format!("writing {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("syncing {}", tmp.display()))?;
    drop(f);
    fs::rename(tmp, path).with_context(|| format!("moving report to {}", path.display()))?;
    Ok(())
}

/// Write `report` under `dir` (created if missing); same-day reruns overwrite.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating reports dir {}", dir.display()))?;
    let path = dir.join(report_file_name(report.generated_on));
    let tmp = path.with_extension("txt.tmp");

    let written = write_and_swap(&tmp, &path, report.text.as_bytes());
    if written.is_err() {
        // leave nothing half-written behind
        let _ = fs::remove_file(&tmp);
    }
    written?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{Advisory, ADVISORY_UNAVAILABLE};
    use crate::rank::{RankLabel, RankedEntry};
    use crate::route::{Coordinate, Place, RouteRecord};

    fn entry(
        dest: &str,
        travel: f64,
        free_flow: f64,
        label: Option<RankLabel>,
        advisory: Advisory,
    ) -> EnrichedEntry {
        let o = Place::new("Westwood (UCLA)", Coordinate::new(34.04, -118.26));
        let d = Place::new(dest, Coordinate::new(34.0, -118.3));
        let record = RouteRecord::from_minutes(&o, &d, travel, free_flow);
        let score = crate::rank::score(&record);
        EnrichedEntry {
            entry: RankedEntry {
                record,
                label,
                rank: 1,
                position: 0,
                score,
            },
            advisory,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn header_has_title_rule_and_date() {
        let out = render(&[], date());
        assert_eq!(
            out,
            format!("{DEFAULT_REPORT_TITLE} (2025-03-07)\n{RULE}\n\n{NO_DATA}")
        );
    }

    #[test]
    fn block_format_is_exact() {
        let e = entry("LACMA", 15.0, 14.5, Some(RankLabel::Best), Advisory::Text("Go now.".into()));
        let out = ReportLayout::new("T", Thresholds::default()).render(&[e], date());
        assert_eq!(
            out,
            "T (2025-03-07)\n====================\n\n\
             [Top choice] From Westwood (UCLA) to LACMA:\n\
             - Estimated travel time now: 15.0 min\n\
             - Free flow travel time: 14.5 min\n\
             - Traffic congestion index: 1.03 (Nice!)\n\
             \n\
             <Travel advisor recommendation>\n\
             Go now.\n"
        );
    }

    #[test]
    fn status_and_tags_per_entry() {
        let entries = vec![
            entry("A", 26.0, 20.0, Some(RankLabel::Best), Advisory::Unavailable),
            entry("B", 40.0, 20.0, Some(RankLabel::SecondBest), Advisory::Text("Later.".into())),
            entry("C", 10.0, 10.0, None, Advisory::Text("Fine.".into())),
        ];
        let out = render(&entries, date());
        assert!(out.contains("[Top choice] From Westwood (UCLA) to A:"));
        assert!(out.contains("Traffic congestion index: 1.30 (Yikes)"));
        assert!(out.contains("[Second choice] From Westwood (UCLA) to B:"));
        assert!(out.contains("Traffic congestion index: 2.00 (Oh noooo)"));
        assert!(out.contains("\nFrom Westwood (UCLA) to C:"));
        assert!(out.contains(ADVISORY_UNAVAILABLE));
        // blank line between blocks
        assert!(out.contains(&format!("{ADVISORY_UNAVAILABLE}\n\n[Second choice]")));
        assert!(out.ends_with("Fine.\n"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let entries = vec![
            entry("A", 20.0, 18.0, Some(RankLabel::Best), Advisory::Text("x".into())),
            entry("B", 15.0, 14.5, Some(RankLabel::SecondBest), Advisory::Unavailable),
        ];
        assert_eq!(render(&entries, date()), render(&entries, date()));
    }

    #[test]
    fn file_name_uses_iso_date() {
        assert_eq!(report_file_name(date()), "daily_report_2025-03-07.txt");
    }

    #[test]
    fn failed_swap_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // a directory squatting on the target name makes the rename fail
        let target = tmp.path().join(report_file_name(date()));
        fs::create_dir(&target).unwrap();
        let report = Report {
            generated_on: date(),
            text: "body".to_string(),
        };

        assert!(write_report(tmp.path(), &report).is_err());
        assert!(!target.with_extension("txt.tmp").exists());
        assert!(target.is_dir());
    }
}
