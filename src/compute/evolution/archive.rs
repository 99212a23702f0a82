//! Per-generation archive of best layouts and run export.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::schema::{CandidateSnapshot, DataError, EvolutionResult, TurbineLayout};

/// Best candidate of every generation, in generation order.
#[derive(Debug, Default)]
pub struct LayoutArchive {
    entries: Vec<ArchivedLayout>,
}

/// An archived generation best.
#[derive(Debug, Clone)]
pub struct ArchivedLayout {
    /// Generation the snapshot was taken in.
    pub generation: usize,
    /// The candidate snapshot.
    pub snapshot: CandidateSnapshot,
}

impl LayoutArchive {
    /// Append the best candidate of `generation`.
    pub fn record(&mut self, generation: usize, snapshot: CandidateSnapshot) {
        self.entries.push(ArchivedLayout {
            generation,
            snapshot,
        });
    }

    /// Entry for a generation.
    pub fn get(&self, generation: usize) -> Option<&ArchivedLayout> {
        self.entries.iter().find(|e| e.generation == generation)
    }

    /// All entries.
    pub fn all(&self) -> impl Iterator<Item = &ArchivedLayout> {
        self.entries.iter()
    }

    /// Highest-AEP entry; the earliest one wins ties.
    pub fn best(&self) -> Option<&ArchivedLayout> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if b.snapshot.aep >= e.snapshot.aep => Some(b),
            _ => Some(e),
        })
    }

    /// Top N entries by AEP.
    pub fn top_n(&self, n: usize) -> Vec<&ArchivedLayout> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.snapshot.aep.total_cmp(&a.snapshot.aep));
        entries.into_iter().take(n).collect()
    }

    /// Write every entry as `gen_<generation>.csv` under `dir`.
    pub fn save_layouts<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, DataError> {
        let dir = dir.as_ref();
        let mut paths = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let path = dir.join(format!("gen_{:05}.csv", entry.generation));
            entry.snapshot.layout.save_csv(&path)?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Load every `*.csv` layout in `dir`, ordered by file name.
pub fn load_seed_layouts<P: AsRef<Path>>(dir: P) -> Result<Vec<TurbineLayout>, DataError> {
    let dir = dir.as_ref();
    let label = dir.display().to_string();

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DataError::io(&label, e))? {
        let path = entry.map_err(|e| DataError::io(&label, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
            paths.push(path);
        }
    }
    paths.sort();

    let layouts = paths
        .iter()
        .map(TurbineLayout::load_csv)
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("loaded {} seed layouts from {}", layouts.len(), label);
    Ok(layouts)
}

/// Save a run result as pretty JSON.
pub fn save_result<P: AsRef<Path>>(path: P, result: &EvolutionResult) -> Result<(), DataError> {
    let path = path.as_ref();
    let label = path.display().to_string();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| DataError::io(&label, e))?;
    }
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| DataError::io(&label, io::Error::new(io::ErrorKind::InvalidData, e)))?;
    fs::write(path, json).map_err(|e| DataError::io(&label, e))
}

/// Load a run result saved by [`save_result`].
pub fn load_result<P: AsRef<Path>>(path: P) -> Result<EvolutionResult, DataError> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| DataError::io(&label, e))?;
    serde_json::from_str(&content)
        .map_err(|e| DataError::io(&label, io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::wake::fixtures::grid_layout;
    use crate::schema::{EvolutionHistory, EvolutionStats, StopReason};

    fn test_snapshot(id: u64, aep: f64) -> CandidateSnapshot {
        CandidateSnapshot {
            id,
            aep,
            layout: grid_layout(420.0),
            generation: 0,
            parents: Vec::new(),
        }
    }

    #[test]
    fn test_archive_record() {
        let mut archive = LayoutArchive::default();
        archive.record(0, test_snapshot(1, 500.0));
        archive.record(1, test_snapshot(7, 510.0));
        archive.record(2, test_snapshot(9, 510.0));

        assert_eq!(archive.len(), 3);
        assert_eq!(archive.get(1).unwrap().snapshot.id, 7);
        assert_eq!(archive.best().unwrap().generation, 1);

        let top2 = archive.top_n(2);
        assert_eq!(top2.len(), 2);
        assert_eq!(top2[0].snapshot.aep, 510.0);

        archive.clear();
        assert!(archive.is_empty());
        assert!(archive.best().is_none());
    }

    #[test]
    fn test_save_and_reload_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = LayoutArchive::default();
        archive.record(0, test_snapshot(1, 500.0));
        archive.record(1, test_snapshot(2, 505.0));

        let paths = archive.save_layouts(dir.path()).unwrap();
        assert_eq!(paths.len(), 2);

        // Unrelated files are ignored.
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let layouts = load_seed_layouts(dir.path()).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0], grid_layout(420.0));
    }

    #[test]
    fn test_missing_seed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_seed_layouts(dir.path().join("absent"));
        assert!(matches!(result, Err(DataError::Io { .. })));
    }

    #[test]
    fn test_result_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("history.json");
        let result = EvolutionResult {
            best: test_snapshot(3, 512.5),
            stats: EvolutionStats {
                generations: 2,
                total_evaluations: 30,
                best_aep: 512.5,
                final_avg_aep: 505.0,
                elapsed_seconds: 0.5,
                evaluations_per_second: 60.0,
                fallback_offspring: 0,
                stop_reason: StopReason::MaxGenerations,
            },
            history: EvolutionHistory {
                best_aep: vec![500.0, 510.0, 512.5],
                avg_aep: vec![490.0, 500.0, 505.0],
                regressions: Vec::new(),
            },
        };

        save_result(&path, &result).unwrap();
        let loaded = load_result(&path).unwrap();
        assert_eq!(loaded.history.best_aep, result.history.best_aep);
        assert_eq!(loaded.best.layout, result.best.layout);
        assert_eq!(loaded.stats.stop_reason, StopReason::MaxGenerations);
    }
}
