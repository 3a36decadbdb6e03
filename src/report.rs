//! Periodic JSON export of year reports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::world::YearReport;

pub struct ReportWriter {
    output_dir: PathBuf,
    interval_years: u64,
}

impl ReportWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_years: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_years,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_years > 0
    }

    /// Write `report` if its year falls on the interval.
    pub fn maybe_write(&self, scenario_name: &str, report: &YearReport) -> Result<Option<PathBuf>> {
        if !self.is_enabled() || report.year % self.interval_years != 0 {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let path = dir.join(format!("year_{:05}.json", report.year));
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn writes_only_on_interval() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(temp.path(), 2);
        let mut world = World::new("XXX\nXJX\nXXX").unwrap();

        world.finish_year();
        assert_eq!(writer.maybe_write("tiny", &world.report()).unwrap(), None);

        world.finish_year();
        let path = writer
            .maybe_write("tiny", &world.report())
            .unwrap()
            .expect("year 2 is on the interval");
        assert_eq!(path, temp.path().join("tiny").join("year_00002.json"));

        let data = fs::read_to_string(path).unwrap();
        assert!(data.contains("\"year\": 2"));
        assert!(data.contains("\"Jungle\""));
    }

    #[test]
    fn disabled_writer_never_writes() {
        let writer = ReportWriter::new("unused", 0);
        let world = World::new("XXX\nXJX\nXXX").unwrap();
        assert_eq!(writer.maybe_write("tiny", &world.report()).unwrap(), None);
    }
}
