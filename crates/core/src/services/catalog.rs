use chrono::{Local, Timelike, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{CoreError, ValidationError};
use crate::models::crypto::{CryptoRecord, RecordUpdate, SortKey};
use crate::models::history::HistoryPoint;
use crate::models::report::RefreshReport;
use crate::models::settings::Settings;
use crate::providers::simulator::PriceSimulator;
use crate::storage::manager::CsvRecordStore;
use crate::storage::traits::RecordStore;

/// Allowed symbol length, in characters.
pub const SYMBOL_LEN: std::ops::RangeInclusive<usize> = 2..=5;

/// The session's authoritative list of cryptocurrencies.
///
/// Every mutation rewrites the whole list through the store. If the write
/// fails the in-memory change is undone before returning, so the list and
/// the file agree after every call. Refresh is the exception: new prices
/// stay in memory even when they could not be persisted.
///
/// Methods take `&mut self`; callers sharing a catalog between the refresh
/// loop and user actions must wrap it in a lock (see `SharedCatalog`).
pub struct Catalog {
    records: Vec<CryptoRecord>,
    store: Box<dyn RecordStore>,
    simulator: PriceSimulator,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Build a catalog and load it from `store`.
    pub fn new(mut store: Box<dyn RecordStore>, simulator: PriceSimulator) -> Self {
        let records = store.load();
        debug!(count = records.len(), "Catalog initialized");
        Self {
            records,
            store,
            simulator,
        }
    }

    /// Catalog over the CSV store described by `settings`.
    pub fn open(settings: &Settings) -> Self {
        Self::new(
            Box::new(CsvRecordStore::new(settings.clone())),
            PriceSimulator::new(),
        )
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn list(&self) -> &[CryptoRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&CryptoRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Case-insensitive symbol lookup.
    #[must_use]
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&CryptoRecord> {
        let symbol = normalize_symbol(symbol);
        self.records.iter().find(|r| r.symbol == symbol)
    }

    /// Records whose visible text contains `query` (case-insensitive).
    /// An empty query returns every record. The catalog is not modified.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<CryptoRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.records.clone();
        }
        self.records
            .iter()
            .filter(|r| r.searchable_fields().iter().any(|f| f.contains(&q)))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<CryptoRecord> {
        self.records.iter().filter(|r| r.is_favorite).cloned().collect()
    }

    /// Stored price observations for one record.
    pub fn history(&self, id: &str) -> Result<Vec<HistoryPoint>, CoreError> {
        self.store.load_history(id)
    }

    /// Export the current list as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.records)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize records: {e}")))
    }

    pub fn simulator_mut(&mut self) -> &mut PriceSimulator {
        &mut self.simulator
    }

    // ── Ordering ────────────────────────────────────────────────────

    /// Stable in-place sort. Not persisted until the next mutation.
    pub fn sort_by(&mut self, key: SortKey) {
        match key {
            SortKey::Name => self.records.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Price => self
                .records
                .sort_by(|a, b| b.current_price().total_cmp(&a.current_price())),
            SortKey::Change => self.records.sort_by(|a, b| {
                b.price_change_percentage_24h()
                    .total_cmp(&a.price_change_percentage_24h())
            }),
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Add a new cryptocurrency with a simulated opening price.
    pub fn create(
        &mut self,
        name: &str,
        symbol: &str,
        category: &str,
    ) -> Result<CryptoRecord, CoreError> {
        let (name, symbol, category) = validate_fields(name, symbol, category)?;
        if self.symbol_taken(&symbol, None) {
            return Err(ValidationError::DuplicateSymbol(symbol).into());
        }

        let id = self.generate_id(&symbol);
        let mut record = CryptoRecord::new(id, name, symbol, category);
        let price = self.simulator.price_for(&record.name);
        let change_pct = self.simulator.change_for(&record.name);
        record.seed_price(price, change_pct);

        self.records.push(record.clone());
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        info!(id = %record.id, symbol = %record.symbol, "Created cryptocurrency");
        Ok(record)
    }

    /// Replace name, symbol and category (and optionally favorite flag / id).
    ///
    /// Validation is the same as `create`, except a record may keep its own
    /// symbol. On any failure the record is left exactly as it was.
    pub fn update(&mut self, id: &str, update: RecordUpdate) -> Result<CryptoRecord, CoreError> {
        let idx = self.position(id)?;
        let (name, symbol, category) =
            validate_fields(&update.name, &update.symbol, &update.category)?;

        if self.symbol_taken(&symbol, Some(idx)) {
            return Err(ValidationError::DuplicateSymbol(symbol).into());
        }

        let new_id = match update.id {
            Some(new_id) => {
                let new_id = new_id.trim().to_string();
                if new_id.is_empty() {
                    return Err(ValidationError::EmptyField("id").into());
                }
                if new_id != id && self.records.iter().any(|r| r.id == new_id) {
                    return Err(ValidationError::DuplicateId(new_id).into());
                }
                Some(new_id)
            }
            None => None,
        };

        let previous = self.records[idx].clone();
        {
            let record = &mut self.records[idx];
            record.name = name;
            record.symbol = symbol;
            record.category = category;
            if let Some(fav) = update.is_favorite {
                record.is_favorite = fav;
            }
            if let Some(new_id) = new_id {
                record.id = new_id;
            }
        }

        if let Err(e) = self.persist() {
            self.records[idx] = previous;
            return Err(e);
        }

        let updated = self.records[idx].clone();
        info!(id = %updated.id, symbol = %updated.symbol, "Updated cryptocurrency");
        Ok(updated)
    }

    /// Flip the favorite flag, persisting the change.
    pub fn set_favorite(&mut self, id: &str, is_favorite: bool) -> Result<CryptoRecord, CoreError> {
        let idx = self.position(id)?;
        let previous = self.records[idx].is_favorite;
        self.records[idx].is_favorite = is_favorite;

        if let Err(e) = self.persist() {
            self.records[idx].is_favorite = previous;
            return Err(e);
        }
        Ok(self.records[idx].clone())
    }

    /// Remove a record. On a failed save it is put back at its old index.
    pub fn delete(&mut self, id: &str) -> Result<CryptoRecord, CoreError> {
        let idx = self.position(id)?;
        let removed = self.records.remove(idx);

        if let Err(e) = self.persist() {
            self.records.insert(idx, removed);
            return Err(e);
        }

        info!(id = %removed.id, symbol = %removed.symbol, "Deleted cryptocurrency");
        Ok(removed)
    }

    /// Discard the in-memory list and reload it from the store.
    pub fn refresh_from_store(&mut self) {
        self.records = self.store.load();
        debug!(count = self.records.len(), "Catalog reloaded from store");
    }

    /// Re-simulate every price and persist the list.
    ///
    /// Best effort: when the save fails the new prices are kept in memory
    /// and the error is returned. History points are only appended after a
    /// successful save; a failed append is counted, not fatal.
    pub fn refresh_prices(&mut self, record_history: bool) -> Result<RefreshReport, CoreError> {
        for record in &mut self.records {
            let new_price = self.simulator.price_for(&record.name);
            record.reprice(new_price);
        }

        self.persist()?;

        let mut history_failures = 0;
        if record_history {
            let now = Local::now().naive_local();
            let now = now.with_nanosecond(0).unwrap_or(now);
            for record in &self.records {
                if let Err(e) = self
                    .store
                    .append_history(&record.id, record.current_price(), now)
                {
                    warn!(id = %record.id, error = %e, "Failed to append price history");
                    history_failures += 1;
                }
            }
        }

        Ok(RefreshReport {
            updated: self.records.len(),
            history_failures,
            refreshed_at: Utc::now(),
        })
    }

    // ── Internal ────────────────────────────────────────────────────

    fn persist(&mut self) -> Result<(), CoreError> {
        self.store.save(&self.records).map_err(|e| {
            error!(error = %e, "Failed to persist catalog");
            match e {
                CoreError::Persistence(msg) => CoreError::Persistence(msg),
                other => CoreError::Persistence(other.to_string()),
            }
        })
    }

    fn position(&self, id: &str) -> Result<usize, CoreError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    fn symbol_taken(&self, symbol: &str, except: Option<usize>) -> bool {
        let symbol = normalize_symbol(symbol);
        self.records
            .iter()
            .enumerate()
            .any(|(i, r)| Some(i) != except && r.symbol == symbol)
    }

    /// `SYMBOL-xxxxxxxx` with a random hex suffix, unique in the catalog.
    fn generate_id(&self, symbol: &str) -> String {
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let id = format!("{symbol}-{}", &suffix[..8]);
            if self.find(&id).is_none() {
                return id;
            }
        }
    }
}

/// Trim all three fields, uppercase the symbol and check the field rules.
pub fn validate_fields(
    name: &str,
    symbol: &str,
    category: &str,
) -> Result<(String, String, String), ValidationError> {
    let name = name.trim();
    let symbol = normalize_symbol(symbol);
    let category = category.trim();

    if name.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    if symbol.is_empty() {
        return Err(ValidationError::EmptyField("symbol"));
    }
    if category.is_empty() {
        return Err(ValidationError::EmptyField("category"));
    }

    let len = symbol.chars().count();
    if !SYMBOL_LEN.contains(&len) {
        return Err(ValidationError::SymbolLength { symbol, len });
    }

    Ok((name.to_string(), symbol, category.to_string()))
}

/// Symbols are compared and stored trimmed and uppercased (Unicode-aware).
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
