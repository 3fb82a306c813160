use crate::error::{CliError, Result};
use readuct::core::io::traits::StructureFile;
use readuct::core::io::xyz::XyzFile;
use readuct::core::models::results::Results;
use readuct::core::models::structure::AtomCollection;
use readuct::engine::observer::Observer;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Records every observed step as an XYZ frame, one multi-frame file per label.
pub struct TrajectoryRecorder {
    directory: PathBuf,
    writers: RefCell<BTreeMap<String, BufWriter<File>>>,
}

impl TrajectoryRecorder {
    pub fn new(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_path_buf(),
            writers: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.directory.join(format!("{}.trj.xyz", label))
    }

    pub fn observer(&self) -> Observer<'_> {
        Box::new(
            move |step: usize, structure: &AtomCollection, results: &Results, label: &str| {
                if let Err(e) = self.record(step, structure, results, label) {
                    warn!(label, step, "Failed to record trajectory frame: {}", e);
                }
            },
        )
    }

    fn record(
        &self,
        step: usize,
        structure: &AtomCollection,
        results: &Results,
        label: &str,
    ) -> Result<()> {
        let mut writers = self.writers.borrow_mut();
        if !writers.contains_key(label) {
            let path = self.path_for(label);
            debug!("Opening trajectory file {:?}", &path);
            writers.insert(label.to_string(), BufWriter::new(File::create(&path)?));
        }
        let Some(writer) = writers.get_mut(label) else {
            return Ok(());
        };

        let comment = match results.energy {
            Some(energy) => format!("step {} energy {:.10}", step, energy),
            None => format!("step {}", step),
        };
        XyzFile::write_to(structure, &comment, writer).map_err(|e| CliError::FileParsing {
            path: self.path_for(label),
            source: e.into(),
        })
    }

    /// Flushes all open trajectories and returns their paths.
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for (label, mut writer) in self.writers.into_inner() {
            writer.flush()?;
            paths.push(self.directory.join(format!("{}.trj.xyz", label)));
        }
        Ok(paths)
    }
}
