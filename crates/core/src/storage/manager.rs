use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::errors::{CoreError, ParseError};
use crate::models::crypto::CryptoRecord;
use crate::models::history::HistoryPoint;
use crate::models::settings::Settings;
use crate::providers::simulator::PriceSimulator;

use super::format;
use super::history;
use super::seed;
use super::traits::RecordStore;

/// Where the records returned by a load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from the records file
    File,
    /// No file existed; the seed set was synthesized and written
    SeededNew,
    /// The file was unreadable or had no usable rows; the seed set was
    /// synthesized but the file was left as it was
    SeededFallback,
}

/// Outcome of `CsvRecordStore::load_with_report`.
#[derive(Debug)]
pub struct LoadReport {
    pub records: Vec<CryptoRecord>,
    pub source: LoadSource,
    /// Rows dropped while parsing
    pub skipped: Vec<ParseError>,
    /// Rows loaded with a defaulted field
    pub repaired: Vec<ParseError>,
}

/// CSV-backed record store.
///
/// Single-writer: there is no file locking, so two processes pointing at
/// the same data directory will overwrite each other's changes.
#[derive(Debug)]
pub struct CsvRecordStore {
    settings: Settings,
    simulator: PriceSimulator,
}

impl CsvRecordStore {
    pub fn new(settings: Settings) -> Self {
        Self::with_simulator(settings, PriceSimulator::new())
    }

    /// Store whose seed prices come from `simulator`.
    pub fn with_simulator(settings: Settings, simulator: PriceSimulator) -> Self {
        Self {
            settings,
            simulator,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load the records and describe how the load went.
    ///
    /// Flow: file missing → seed + write; unreadable or zero usable rows →
    /// seed only; otherwise the parsed rows.
    pub fn load_with_report(&mut self) -> LoadReport {
        let path = self.settings.records_path();

        if !path.exists() {
            info!(path = %path.display(), "Records file not found, creating seed data");
            let records = seed::seed_records(&mut self.simulator);
            if let Err(e) = self.save(&records) {
                error!(error = %e, "Failed to write seed data");
            }
            return LoadReport {
                records,
                source: LoadSource::SeededNew,
                skipped: Vec::new(),
                repaired: Vec::new(),
            };
        }

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read records file, using seed data");
                return self.fallback(Vec::new(), Vec::new());
            }
        };

        let parsed = format::decode_records(&data);
        if parsed.records.is_empty() {
            warn!(
                path = %path.display(),
                skipped = parsed.skipped.len(),
                "No usable rows in records file, using seed data"
            );
            return self.fallback(parsed.skipped, parsed.repaired);
        }

        info!(
            loaded = parsed.records.len(),
            skipped = parsed.skipped.len(),
            repaired = parsed.repaired.len(),
            "Loaded cryptocurrencies"
        );
        LoadReport {
            records: parsed.records,
            source: LoadSource::File,
            skipped: parsed.skipped,
            repaired: parsed.repaired,
        }
    }

    fn fallback(&mut self, skipped: Vec<ParseError>, repaired: Vec<ParseError>) -> LoadReport {
        LoadReport {
            records: seed::seed_records(&mut self.simulator),
            source: LoadSource::SeededFallback,
            skipped,
            repaired,
        }
    }

    /// Copy the current file aside. Failure is logged, never fatal.
    fn backup(&self, target: &Path) {
        if !target.exists() {
            return;
        }
        let backup = self.settings.backup_path();
        if let Err(e) = fs::copy(target, &backup) {
            warn!(backup = %backup.display(), error = %e, "Could not create backup");
        }
    }

    /// Write `bytes` to the temp path and move it over the target.
    fn write_atomically(&self, bytes: &[u8]) -> Result<(), CoreError> {
        let target = self.settings.records_path();
        let temp = self.settings.temp_path();

        let write_temp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(bytes)?;
            file.sync_all()
        };

        if let Err(e) = write_temp().and_then(|()| fs::rename(&temp, &target)) {
            // Only clean up a plain file; the temp path may be something we don't own.
            if temp.is_file() {
                if let Err(cleanup) = fs::remove_file(&temp) {
                    warn!(temp = %temp.display(), error = %cleanup, "Could not remove temp file");
                }
            }
            return Err(CoreError::Persistence(format!(
                "Failed to write {}: {e}",
                target.display()
            )));
        }
        Ok(())
    }
}

impl RecordStore for CsvRecordStore {
    fn load(&mut self) -> Vec<CryptoRecord> {
        self.load_with_report().records
    }

    fn save(&mut self, records: &[CryptoRecord]) -> Result<(), CoreError> {
        fs::create_dir_all(&self.settings.data_dir).map_err(|e| {
            CoreError::Persistence(format!(
                "Failed to create data directory {}: {e}",
                self.settings.data_dir.display()
            ))
        })?;

        let bytes = format::encode_records(records)?;
        let target = self.settings.records_path();
        self.backup(&target);

        match self.write_atomically(&bytes) {
            Ok(()) => {
                info!(count = records.len(), path = %target.display(), "Saved cryptocurrencies");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Save failed, previous file left untouched");
                Err(e)
            }
        }
    }

    fn append_history(
        &mut self,
        crypto_id: &str,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), CoreError> {
        let point = HistoryPoint::new(crypto_id, price, timestamp);
        history::append_point(&self.settings.history_path(), &point)
    }

    fn load_history(&self, crypto_id: &str) -> Result<Vec<HistoryPoint>, CoreError> {
        history::read_points(&self.settings.history_path(), crypto_id)
    }
}
