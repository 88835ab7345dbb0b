pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use models::{
    chart::ChartDataPoint,
    crypto::{CryptoRecord, RecordUpdate, SortKey},
    history::HistoryPoint,
    report::{MarketSummary, RefreshReport},
    settings::Settings,
};
use providers::simulator::PriceSimulator;
use services::{
    catalog::Catalog,
    chart_service::ChartService,
    refresh::{with_catalog_blocking, RefreshEvent, RefreshLoop, SharedCatalog},
    report_service::ReportService,
};
use storage::{manager::CsvRecordStore, traits::RecordStore};
use tokio::sync::{broadcast, Mutex};

use errors::CoreError;

/// Default spacing of simulated chart points.
const CHART_STEP_MINUTES: i64 = 60;

/// Main entry point for the Crypto Dashboard core library.
///
/// This is the collaborator interface a presentation layer drives. Every
/// operation returns a `Result` or a plain value, never panics, and hands
/// out owned snapshots: re-query `list()` after a mutation instead of
/// holding on to records.
///
/// All catalog access goes through one async mutex, which the refresh loop
/// shares, so user actions and refresh ticks are serialized. Operations that
/// touch the files run on Tokio's blocking pool while holding that lock.
#[must_use]
pub struct CryptoDashboard {
    settings: Settings,
    catalog: SharedCatalog,
    refresh: RefreshLoop,
    report_service: ReportService,
    chart_service: ChartService,
}

impl std::fmt::Debug for CryptoDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoDashboard")
            .field("settings", &self.settings)
            .field("refresh", &self.refresh)
            .finish()
    }
}

impl CryptoDashboard {
    /// Open the CSV-backed dashboard described by `settings`.
    /// A missing records file is created with the seed set.
    pub fn open(settings: Settings) -> Self {
        let store = CsvRecordStore::new(settings.clone());
        Self::with_parts(settings, Box::new(store), PriceSimulator::new())
    }

    /// Assemble a dashboard from an explicit store and simulator.
    pub fn with_parts(
        settings: Settings,
        store: Box<dyn RecordStore>,
        simulator: PriceSimulator,
    ) -> Self {
        let catalog = Arc::new(Mutex::new(Catalog::new(store, simulator)));
        let refresh = RefreshLoop::new(Arc::clone(&catalog), settings.record_history);
        Self {
            settings,
            catalog,
            refresh,
            report_service: ReportService::new(),
            chart_service: ChartService::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle to the shared catalog, for callers that need several
    /// operations under one lock.
    #[must_use]
    pub fn catalog(&self) -> SharedCatalog {
        Arc::clone(&self.catalog)
    }

    // ── CRUD ────────────────────────────────────────────────────────

    pub async fn create(
        &self,
        name: &str,
        symbol: &str,
        category: &str,
    ) -> Result<CryptoRecord, CoreError> {
        let (name, symbol, category) = (name.to_string(), symbol.to_string(), category.to_string());
        with_catalog_blocking(&self.catalog, move |c| c.create(&name, &symbol, &category)).await
    }

    pub async fn update(&self, id: &str, update: RecordUpdate) -> Result<CryptoRecord, CoreError> {
        let id = id.to_string();
        with_catalog_blocking(&self.catalog, move |c| c.update(&id, update)).await
    }

    pub async fn delete(&self, id: &str) -> Result<CryptoRecord, CoreError> {
        let id = id.to_string();
        with_catalog_blocking(&self.catalog, move |c| c.delete(&id)).await
    }

    pub async fn set_favorite(&self, id: &str, is_favorite: bool) -> Result<CryptoRecord, CoreError> {
        let id = id.to_string();
        with_catalog_blocking(&self.catalog, move |c| c.set_favorite(&id, is_favorite)).await
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Snapshot of all records in their current order.
    pub async fn list(&self) -> Vec<CryptoRecord> {
        self.catalog.lock().await.list().to_vec()
    }

    pub async fn find(&self, id: &str) -> Option<CryptoRecord> {
        self.catalog.lock().await.find(id).cloned()
    }

    pub async fn find_by_symbol(&self, symbol: &str) -> Option<CryptoRecord> {
        self.catalog.lock().await.find_by_symbol(symbol).cloned()
    }

    pub async fn filter(&self, query: &str) -> Vec<CryptoRecord> {
        self.catalog.lock().await.filter(query)
    }

    pub async fn favorites(&self) -> Vec<CryptoRecord> {
        self.catalog.lock().await.favorites()
    }

    pub async fn sort_by(&self, key: SortKey) {
        self.catalog.lock().await.sort_by(key);
    }

    /// Drop in-memory state and reload from disk (after an external edit).
    pub async fn reload(&self) -> Result<(), CoreError> {
        with_catalog_blocking(&self.catalog, |c| {
            c.refresh_from_store();
            Ok(())
        })
        .await
    }

    pub async fn history(&self, id: &str) -> Result<Vec<HistoryPoint>, CoreError> {
        let id = id.to_string();
        with_catalog_blocking(&self.catalog, move |c| c.history(&id)).await
    }

    pub async fn export_json(&self) -> Result<String, CoreError> {
        self.catalog.lock().await.to_json()
    }

    // ── Reports & Charts ────────────────────────────────────────────

    pub async fn market_summary(&self) -> MarketSummary {
        let catalog = self.catalog.lock().await;
        self.report_service
            .summary(catalog.list(), Local::now().naive_local())
    }

    /// Simulated hourly price series ending now for the detail chart.
    pub async fn simulated_chart(
        &self,
        id: &str,
        points: usize,
    ) -> Result<Vec<ChartDataPoint>, CoreError> {
        let mut catalog = self.catalog.lock().await;
        let name = catalog
            .find(id)
            .map(|r| r.name.clone())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        Ok(self.chart_service.simulated_series(
            catalog.simulator_mut(),
            &name,
            points,
            Local::now().naive_local(),
            chrono::Duration::minutes(CHART_STEP_MINUTES),
        ))
    }

    /// Recorded price history for one record as a chart series.
    pub async fn history_chart(&self, id: &str) -> Result<Vec<ChartDataPoint>, CoreError> {
        let history = self.history(id).await?;
        Ok(self.chart_service.history_series(&history))
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Refresh all prices now.
    pub async fn trigger_refresh(&self) -> Result<RefreshReport, CoreError> {
        self.refresh.trigger_once().await
    }

    /// Start periodic refresh at the configured interval.
    /// Fails with `CoreError::Runtime` outside a Tokio runtime.
    pub fn start_refresh(&mut self) -> Result<(), CoreError> {
        let interval = self.settings.refresh_interval();
        self.refresh.start(interval)
    }

    /// Start periodic refresh at an explicit interval.
    pub fn start_refresh_every(&mut self, interval: Duration) -> Result<(), CoreError> {
        self.refresh.start(interval)
    }

    pub fn stop_refresh(&mut self) {
        self.refresh.stop();
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    /// Subscribe to refresh outcomes (scheduled and on-demand ticks).
    pub fn subscribe_refresh(&self) -> broadcast::Receiver<RefreshEvent> {
        self.refresh.subscribe()
    }
}
