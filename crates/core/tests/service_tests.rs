use chrono::{Duration, NaiveDate, NaiveDateTime};
use crypto_dashboard_core::errors::{CoreError, ValidationError};
use crypto_dashboard_core::models::crypto::{CryptoRecord, RecordUpdate, SortKey};
use crypto_dashboard_core::models::history::HistoryPoint;
use crypto_dashboard_core::models::settings::Settings;
use crypto_dashboard_core::providers::price_table::base_range;
use crypto_dashboard_core::providers::simulator::{PriceSimulator, FLUCTUATION};
use crypto_dashboard_core::services::catalog::{normalize_symbol, validate_fields, Catalog};
use crypto_dashboard_core::services::chart_service::ChartService;
use crypto_dashboard_core::services::report_service::ReportService;
use crypto_dashboard_core::storage::manager::CsvRecordStore;
use crypto_dashboard_core::storage::traits::RecordStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const HEADER_LINE: &str = "ID,Name,Symbol,Category,Price,Change24h,ChangePercent24h,IsFavorite";

/// CSV store whose saves can be made to fail on demand.
struct FlakyStore {
    inner: CsvRecordStore,
    fail: Arc<AtomicBool>,
}

impl RecordStore for FlakyStore {
    fn load(&mut self) -> Vec<CryptoRecord> {
        self.inner.load()
    }

    fn save(&mut self, records: &[CryptoRecord]) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::FileIO("simulated disk failure".into()));
        }
        self.inner.save(records)
    }

    fn append_history(
        &mut self,
        crypto_id: &str,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), CoreError> {
        self.inner.append_history(crypto_id, price, timestamp)
    }

    fn load_history(&self, crypto_id: &str) -> Result<Vec<HistoryPoint>, CoreError> {
        self.inner.load_history(crypto_id)
    }
}

struct Fixture {
    _dir: TempDir,
    settings: Settings,
    fail: Arc<AtomicBool>,
    catalog: Catalog,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::in_dir(dir)
    }

    fn in_dir(dir: TempDir) -> Self {
        let settings = Settings::with_data_dir(dir.path());
        let fail = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner: CsvRecordStore::with_simulator(settings.clone(), PriceSimulator::seeded(1)),
            fail: Arc::clone(&fail),
        };
        let catalog = Catalog::new(Box::new(store), PriceSimulator::seeded(2));
        Self {
            _dir: dir,
            settings,
            fail,
            catalog,
        }
    }

    fn file_bytes(&self) -> Vec<u8> {
        std::fs::read(self.settings.records_path()).unwrap()
    }

    fn reloaded(&self) -> Vec<CryptoRecord> {
        CsvRecordStore::new(self.settings.clone()).load()
    }

    fn break_disk(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn priced(symbol: &str, price: f64, pct: f64) -> CryptoRecord {
    let mut r = CryptoRecord::new(format!("{symbol}-1"), format!("{symbol} coin"), symbol, "Test");
    r.seed_price(price, pct);
    r
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog: Loading & Queries
// ═══════════════════════════════════════════════════════════════════

mod catalog_queries {
    use super::*;

    #[test]
    fn fresh_catalog_holds_seed_set() {
        let fx = Fixture::new();
        assert_eq!(fx.catalog.len(), 10);
        assert!(!fx.catalog.is_empty());
        assert!(fx.catalog.find("BTC-001").is_some());
        assert!(fx.settings.records_path().exists());
    }

    #[test]
    fn find_by_symbol_is_case_insensitive() {
        let fx = Fixture::new();
        assert_eq!(fx.catalog.find_by_symbol("eth").unwrap().id, "ETH-002");
        assert_eq!(fx.catalog.find_by_symbol(" Eth ").unwrap().id, "ETH-002");
        assert!(fx.catalog.find_by_symbol("NOPE").is_none());
    }

    #[test]
    fn find_by_symbol_handles_non_ascii_case() {
        let mut fx = Fixture::new();
        let created = fx.catalog.create("Euro Coin", "éur", "Currency").unwrap();
        assert_eq!(created.symbol, "ÉUR");
        assert_eq!(fx.catalog.find_by_symbol("éur").unwrap().id, created.id);
        assert_eq!(fx.catalog.find_by_symbol(" Éur ").unwrap().id, created.id);
    }

    #[test]
    fn find_unknown_id_is_none() {
        let fx = Fixture::new();
        assert!(fx.catalog.find("missing").is_none());
    }

    #[test]
    fn filter_matches_name_symbol_id_and_category() {
        let fx = Fixture::new();
        let by_name = fx.catalog.filter("bit");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol, "BTC");

        assert_eq!(fx.catalog.filter("DOGE").len(), 1);
        assert_eq!(fx.catalog.filter("link-010").len(), 1);
        assert_eq!(fx.catalog.filter("platform").len(), 5);
    }

    #[test]
    fn filter_matches_status_text() {
        let fx = Fixture::new();
        let up = fx.catalog.filter("up").len();
        let down = fx.catalog.filter("down").len();
        let gainers = fx
            .catalog
            .list()
            .iter()
            .filter(|r| r.price_change_percentage_24h() >= 0.0)
            .count();
        assert!(up >= gainers);
        assert!(down >= fx.catalog.len() - gainers);
    }

    #[test]
    fn filter_matches_formatted_price() {
        let fx = Fixture::new();
        let btc = fx.catalog.find("BTC-001").unwrap().clone();
        let hits = fx.catalog.filter(&btc.formatted_price());
        assert!(hits.iter().any(|r| r.id == "BTC-001"));
    }

    #[test]
    fn empty_filter_returns_everything() {
        let fx = Fixture::new();
        assert_eq!(fx.catalog.filter("").len(), 10);
        assert_eq!(fx.catalog.filter("   ").len(), 10);
    }

    #[test]
    fn filter_without_match_is_empty_and_leaves_catalog() {
        let fx = Fixture::new();
        assert!(fx.catalog.filter("zzzz-nothing").is_empty());
        assert_eq!(fx.catalog.len(), 10);
    }

    #[test]
    fn filter_twice_gives_same_result() {
        let fx = Fixture::new();
        assert_eq!(fx.catalog.filter("o"), fx.catalog.filter("o"));
    }

    #[test]
    fn to_json_exports_all_records() {
        let fx = Fixture::new();
        let json = fx.catalog.to_json().unwrap();
        let back: Vec<CryptoRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fx.catalog.list());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Field Validation
// ═══════════════════════════════════════════════════════════════════

mod field_validation {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        let (name, symbol, category) = validate_fields("  Test Coin ", " tst ", "Platform").unwrap();
        assert_eq!(name, "Test Coin");
        assert_eq!(symbol, "TST");
        assert_eq!(category, "Platform");
    }

    #[test]
    fn reports_first_empty_field() {
        assert_eq!(
            validate_fields("", "", ""),
            Err(ValidationError::EmptyField("name"))
        );
        assert_eq!(
            validate_fields("A", "  ", "C"),
            Err(ValidationError::EmptyField("symbol"))
        );
        assert_eq!(
            validate_fields("A", "AB", ""),
            Err(ValidationError::EmptyField("category"))
        );
    }

    #[test]
    fn symbol_length_bounds() {
        assert!(validate_fields("A", "AB", "C").is_ok());
        assert!(validate_fields("A", "ABCDE", "C").is_ok());
        assert_eq!(
            validate_fields("A", "a", "C"),
            Err(ValidationError::SymbolLength {
                symbol: "A".into(),
                len: 1
            })
        );
        assert!(matches!(
            validate_fields("A", "ABCDEF", "C"),
            Err(ValidationError::SymbolLength { len: 6, .. })
        ));
    }

    #[test]
    fn symbol_length_counts_characters() {
        assert!(validate_fields("Euro", "éur", "C").is_ok());
    }

    #[test]
    fn normalize_symbol_is_unicode_aware() {
        assert_eq!(normalize_symbol(" éur "), "ÉUR");
        assert_eq!(normalize_symbol("btc"), "BTC");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog: Sorting
// ═══════════════════════════════════════════════════════════════════

mod catalog_sorting {
    use super::*;

    #[test]
    fn sort_by_name_is_lexicographic() {
        let mut fx = Fixture::new();
        fx.catalog.sort_by(SortKey::Name);
        let names: Vec<&str> = fx.catalog.list().iter().map(|r| r.name.as_str()).collect();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(names, expected);
        assert_eq!(names[0], "Avalanche");
    }

    #[test]
    fn sort_by_price_is_descending() {
        let mut fx = Fixture::new();
        fx.catalog.sort_by(SortKey::Price);
        let list = fx.catalog.list();
        assert_eq!(list[0].symbol, "BTC");
        assert!(list
            .windows(2)
            .all(|w| w[0].current_price() >= w[1].current_price()));
    }

    #[test]
    fn sort_by_change_is_descending() {
        let mut fx = Fixture::new();
        fx.catalog.sort_by(SortKey::Change);
        assert!(fx.catalog.list().windows(2).all(|w| {
            w[0].price_change_percentage_24h() >= w[1].price_change_percentage_24h()
        }));
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut fx = Fixture::new();
        for key in [SortKey::Name, SortKey::Price, SortKey::Change] {
            fx.catalog.sort_by(key);
            let once = fx.catalog.list().to_vec();
            fx.catalog.sort_by(key);
            assert_eq!(fx.catalog.list(), once.as_slice());
        }
    }

    #[test]
    fn sorting_is_not_persisted() {
        let mut fx = Fixture::new();
        let before = fx.file_bytes();
        fx.catalog.sort_by(SortKey::Name);
        assert_eq!(fx.file_bytes(), before);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog: Create
// ═══════════════════════════════════════════════════════════════════

mod catalog_create {
    use super::*;

    #[test]
    fn create_appends_and_persists() {
        let mut fx = Fixture::new();
        let created = fx.catalog.create(" Test Coin ", "tst", "Platform").unwrap();

        assert_eq!(created.name, "Test Coin");
        assert_eq!(created.symbol, "TST");
        assert_eq!(created.category, "Platform");
        assert!(created.id.starts_with("TST-"));
        assert!(!created.is_favorite);
        assert_eq!(fx.catalog.len(), 11);
        assert_eq!(fx.catalog.list().last().unwrap().id, created.id);

        let reloaded = fx.reloaded();
        assert!(reloaded.iter().any(|r| r.symbol == "TST"));
    }

    #[test]
    fn created_price_is_simulated_for_unknown_asset() {
        let mut fx = Fixture::new();
        let created = fx.catalog.create("Test Coin", "TST", "Platform").unwrap();
        let p = created.current_price();
        assert!(p >= 100.0 * (1.0 - FLUCTUATION) && p <= 200.0 * (1.0 + FLUCTUATION));
        assert!(created.price_change_percentage_24h().abs() <= 5.0);
    }

    #[test]
    fn created_ids_are_unique() {
        let mut fx = Fixture::new();
        let a = fx.catalog.create("Alpha", "ALP", "X").unwrap();
        let b = fx.catalog.create("Beta", "BET", "X").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), "ALP-".len() + 8);
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.catalog.create("  ", "TST", "X"),
            Err(CoreError::Validation(ValidationError::EmptyField("name")))
        ));
        assert!(matches!(
            fx.catalog.create("Test", "", "X"),
            Err(CoreError::Validation(ValidationError::EmptyField("symbol")))
        ));
        assert!(matches!(
            fx.catalog.create("Test", "TST", " "),
            Err(CoreError::Validation(ValidationError::EmptyField("category")))
        ));
        assert_eq!(fx.catalog.len(), 10);
    }

    #[test]
    fn symbol_length_is_enforced() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.catalog.create("Test", "T", "X"),
            Err(CoreError::Validation(ValidationError::SymbolLength { len: 1, .. }))
        ));
        assert!(matches!(
            fx.catalog.create("Test", "TOOLONG", "X"),
            Err(CoreError::Validation(ValidationError::SymbolLength { len: 7, .. }))
        ));
        assert!(fx.catalog.create("Two", "TW", "X").is_ok());
        assert!(fx.catalog.create("Five", "FIVES", "X").is_ok());
    }

    #[test]
    fn duplicate_symbol_is_rejected_case_insensitively() {
        let mut fx = Fixture::new();
        let before = fx.file_bytes();
        let err = fx.catalog.create("Other Bitcoin", "btc", "Currency").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateSymbol(ref s)) if s == "BTC"
        ));
        assert_eq!(fx.catalog.len(), 10);
        assert_eq!(fx.file_bytes(), before);
    }

    #[test]
    fn duplicate_non_ascii_symbol_is_rejected() {
        let mut fx = Fixture::new();
        fx.catalog.create("Euro Coin", "ÉUR", "Currency").unwrap();
        assert!(matches!(
            fx.catalog.create("Other Euro", "éur", "Currency"),
            Err(CoreError::Validation(ValidationError::DuplicateSymbol(ref s))) if s == "ÉUR"
        ));
        assert_eq!(fx.catalog.len(), 11);
    }

    #[test]
    fn failed_save_rolls_back_create() {
        let mut fx = Fixture::new();
        let before = fx.file_bytes();
        fx.break_disk();

        let err = fx.catalog.create("Test Coin", "TST", "Platform").unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(fx.catalog.len(), 10);
        assert!(fx.catalog.find_by_symbol("TST").is_none());
        assert_eq!(fx.file_bytes(), before);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog: Update / Favorite / Delete
// ═══════════════════════════════════════════════════════════════════

mod catalog_mutations {
    use super::*;

    #[test]
    fn update_replaces_fields_and_persists() {
        let mut fx = Fixture::new();
        let updated = fx
            .catalog
            .update("ETH-002", RecordUpdate::new("Ether", "ethx", "Smart Contracts"))
            .unwrap();
        assert_eq!(updated.id, "ETH-002");
        assert_eq!(updated.name, "Ether");
        assert_eq!(updated.symbol, "ETHX");

        let reloaded = fx.reloaded();
        let eth = reloaded.iter().find(|r| r.id == "ETH-002").unwrap();
        assert_eq!(eth.category, "Smart Contracts");
    }

    #[test]
    fn update_may_keep_own_symbol() {
        let mut fx = Fixture::new();
        let updated = fx
            .catalog
            .update("BTC-001", RecordUpdate::new("Bitcoin Core", "btc", "Currency"))
            .unwrap();
        assert_eq!(updated.symbol, "BTC");
        assert_eq!(updated.name, "Bitcoin Core");
    }

    #[test]
    fn update_keeps_prices() {
        let mut fx = Fixture::new();
        let before = fx.catalog.find("SOL-005").unwrap().clone();
        let updated = fx
            .catalog
            .update("SOL-005", RecordUpdate::new("Solana", "SOL", "Layer 1"))
            .unwrap();
        assert_eq!(updated.current_price(), before.current_price());
        assert_eq!(
            updated.price_change_percentage_24h(),
            before.price_change_percentage_24h()
        );
    }

    #[test]
    fn update_to_taken_symbol_is_rejected() {
        let mut fx = Fixture::new();
        let err = fx
            .catalog
            .update("ETH-002", RecordUpdate::new("Ethereum", "BTC", "Platform"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateSymbol(_))
        ));
        assert_eq!(fx.catalog.find("ETH-002").unwrap().symbol, "ETH");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.catalog.update("NOPE-1", RecordUpdate::new("A", "AB", "C")),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn update_with_invalid_fields_changes_nothing() {
        let mut fx = Fixture::new();
        let before = fx.catalog.find("ADA-004").unwrap().clone();
        assert!(fx
            .catalog
            .update("ADA-004", RecordUpdate::new("", "ADA", "Platform"))
            .is_err());
        assert_eq!(fx.catalog.find("ADA-004").unwrap(), &before);
    }

    #[test]
    fn update_sets_favorite_and_corrects_id() {
        let mut fx = Fixture::new();
        let updated = fx
            .catalog
            .update(
                "DOT-007",
                RecordUpdate::new("Polkadot", "DOT", "Platform")
                    .with_favorite(true)
                    .with_id("DOT-100"),
            )
            .unwrap();
        assert_eq!(updated.id, "DOT-100");
        assert!(updated.is_favorite);
        assert!(fx.catalog.find("DOT-007").is_none());
        assert!(fx.reloaded().iter().any(|r| r.id == "DOT-100"));
    }

    #[test]
    fn update_to_taken_id_is_rejected() {
        let mut fx = Fixture::new();
        let err = fx
            .catalog
            .update(
                "DOT-007",
                RecordUpdate::new("Polkadot", "DOT", "Platform").with_id("BTC-001"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateId(_))
        ));
    }

    #[test]
    fn update_to_blank_id_is_rejected() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.catalog.update(
                "DOT-007",
                RecordUpdate::new("Polkadot", "DOT", "Platform").with_id("  "),
            ),
            Err(CoreError::Validation(ValidationError::EmptyField("id")))
        ));
    }

    #[test]
    fn failed_save_rolls_back_update() {
        let mut fx = Fixture::new();
        let before_record = fx.catalog.find("XRP-006").unwrap().clone();
        let before_bytes = fx.file_bytes();
        fx.break_disk();

        let err = fx
            .catalog
            .update("XRP-006", RecordUpdate::new("Ripple Labs", "XRPL", "Payment"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(fx.catalog.find("XRP-006").unwrap(), &before_record);
        assert_eq!(fx.file_bytes(), before_bytes);
    }

    #[test]
    fn set_favorite_persists_and_lists_favorites() {
        let mut fx = Fixture::new();
        assert!(fx.catalog.favorites().is_empty());

        let fav = fx.catalog.set_favorite("LINK-010", true).unwrap();
        assert!(fav.is_favorite);
        assert_eq!(fx.catalog.favorites().len(), 1);
        assert!(fx
            .reloaded()
            .iter()
            .any(|r| r.id == "LINK-010" && r.is_favorite));

        fx.catalog.set_favorite("LINK-010", false).unwrap();
        assert!(fx.catalog.favorites().is_empty());
    }

    #[test]
    fn failed_save_reverts_favorite() {
        let mut fx = Fixture::new();
        fx.break_disk();
        assert!(fx.catalog.set_favorite("BTC-001", true).is_err());
        assert!(!fx.catalog.find("BTC-001").unwrap().is_favorite);
    }

    #[test]
    fn delete_removes_and_persists() {
        let mut fx = Fixture::new();
        let removed = fx.catalog.delete("DOGE-008").unwrap();
        assert_eq!(removed.symbol, "DOGE");
        assert_eq!(fx.catalog.len(), 9);
        assert!(fx.catalog.find("DOGE-008").is_none());
        assert!(!fx.reloaded().iter().any(|r| r.id == "DOGE-008"));
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let mut fx = Fixture::new();
        let before = fx.file_bytes();
        assert!(matches!(
            fx.catalog.delete("NOPE-1"),
            Err(CoreError::NotFound(_))
        ));
        assert_eq!(fx.catalog.len(), 10);
        assert_eq!(fx.file_bytes(), before);
    }

    #[test]
    fn failed_save_restores_deleted_record_in_place() {
        let mut fx = Fixture::new();
        let before = fx.catalog.list().to_vec();
        let before_bytes = fx.file_bytes();
        fx.break_disk();

        assert!(matches!(
            fx.catalog.delete("ADA-004"),
            Err(CoreError::Persistence(_))
        ));
        assert_eq!(fx.catalog.list(), before.as_slice());
        assert_eq!(fx.file_bytes(), before_bytes);
    }

    #[test]
    fn deleted_symbol_can_be_reused() {
        let mut fx = Fixture::new();
        fx.catalog.delete("BTC-001").unwrap();
        assert!(fx.catalog.create("Bitcoin Again", "BTC", "Currency").is_ok());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Catalog: Refresh
// ═══════════════════════════════════════════════════════════════════

mod catalog_refresh {
    use super::*;

    #[test]
    fn refresh_reprices_every_record_within_range() {
        let mut fx = Fixture::new();
        let report = fx.catalog.refresh_prices(false).unwrap();
        assert_eq!(report.updated, 10);
        assert_eq!(report.history_failures, 0);

        for r in fx.catalog.list() {
            let range = base_range(&r.name);
            let p = r.current_price();
            assert!(
                p >= range.low * (1.0 - FLUCTUATION) && p <= range.high * (1.0 + FLUCTUATION),
                "{}: {p}",
                r.name
            );
            assert!(r.price_change_percentage_24h().is_finite());
        }
    }

    #[test]
    fn refresh_persists_new_prices() {
        let mut fx = Fixture::new();
        fx.catalog.refresh_prices(false).unwrap();
        let reloaded = fx.reloaded();
        for (mem, disk) in fx.catalog.list().iter().zip(&reloaded) {
            assert_eq!(mem.id, disk.id);
            assert!((mem.current_price() - disk.current_price()).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn refresh_from_zero_price_stays_finite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cryptocurrencies.csv"),
            format!("{HEADER_LINE}\nZRO-1,Zero Coin,ZRO,Test,0.00,0.00,0.00,false\n"),
        )
        .unwrap();
        let mut fx = Fixture::in_dir(dir);
        assert_eq!(fx.catalog.len(), 1);

        fx.catalog.refresh_prices(false).unwrap();
        let r = &fx.catalog.list()[0];
        assert!(r.current_price() > 0.0);
        assert_eq!(r.price_change_percentage_24h(), 0.0);
        assert!(r.price_change_24h().is_finite());
    }

    #[test]
    fn refresh_appends_history_per_record() {
        let mut fx = Fixture::new();
        fx.catalog.refresh_prices(true).unwrap();
        fx.catalog.refresh_prices(true).unwrap();

        let history = fx.catalog.history("BTC-001").unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|p| p.crypto_id == "BTC-001"));
        assert!(fx.catalog.history("ETH-002").unwrap().len() == 2);
    }

    #[test]
    fn refresh_without_history_writes_no_history_file() {
        let mut fx = Fixture::new();
        fx.catalog.refresh_prices(false).unwrap();
        assert!(!fx.settings.history_path().exists());
        assert!(fx.catalog.history("BTC-001").unwrap().is_empty());
    }

    #[test]
    fn failed_refresh_save_keeps_new_prices_in_memory() {
        let mut fx = Fixture::new();
        let before: Vec<f64> = fx.catalog.list().iter().map(|r| r.current_price()).collect();
        let before_bytes = fx.file_bytes();
        fx.break_disk();

        let err = fx.catalog.refresh_prices(true).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));

        let after: Vec<f64> = fx.catalog.list().iter().map(|r| r.current_price()).collect();
        assert_ne!(before, after);
        assert_eq!(fx.file_bytes(), before_bytes);
        assert!(!fx.settings.history_path().exists());
    }

    #[test]
    fn refresh_from_store_picks_up_external_edit() {
        let mut fx = Fixture::new();
        std::fs::write(
            fx.settings.records_path(),
            format!("{HEADER_LINE}\nNEW-1,Newcoin,NEW,Test,12.00,0.00,0.00,true\n"),
        )
        .unwrap();

        fx.catalog.refresh_from_store();
        assert_eq!(fx.catalog.len(), 1);
        assert_eq!(fx.catalog.list()[0].symbol, "NEW");
        assert!(fx.catalog.list()[0].is_favorite);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  ReportService
// ═══════════════════════════════════════════════════════════════════

mod report_service {
    use super::*;

    #[test]
    fn summary_of_empty_catalog() {
        let s = ReportService::new().summary(&[], at(9, 0));
        assert_eq!(s.total, 0);
        assert_eq!(s.gainers, 0);
        assert_eq!(s.losers, 0);
        assert_eq!(s.estimated_market_cap, 0.0);
        assert_eq!(s.average_change_pct, 0.0);
        assert!(s.top_performers.is_empty());
    }

    #[test]
    fn summary_totals() {
        let mut a = priced("AAA", 100.0, 2.0);
        a.is_favorite = true;
        let b = priced("BBB", 50.0, -4.0);
        let s = ReportService::new().summary(&[a, b], at(9, 0));

        assert_eq!(s.generated_at, at(9, 0));
        assert_eq!(s.total, 2);
        assert_eq!(s.gainers, 1);
        assert_eq!(s.losers, 1);
        assert_eq!(s.favorites, 1);
        assert!((s.estimated_market_cap - 150_000_000.0).abs() < 1e-3);
        assert!((s.estimated_volume_24h - 400_000.0).abs() < 1e-3);
        assert!((s.average_change_pct + 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_change_counts_as_gainer() {
        let s = ReportService::new().summary(&[priced("ZZ", 1.0, 0.0)], at(9, 0));
        assert_eq!(s.gainers, 1);
        assert_eq!(s.losers, 0);
    }

    #[test]
    fn top_performers_are_best_five() {
        let records: Vec<CryptoRecord> = [-3.0, 4.0, 1.0, -1.0, 5.0, 2.0, 0.5]
            .iter()
            .enumerate()
            .map(|(i, pct)| priced(&format!("S{i}"), 10.0, *pct))
            .collect();
        let s = ReportService::default().summary(&records, at(9, 0));

        let pcts: Vec<f64> = s.top_performers.iter().map(|p| p.change_pct).collect();
        assert_eq!(pcts, vec![5.0, 4.0, 2.0, 1.0, 0.5]);
        assert_eq!(s.top_performers[0].symbol, "S4");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  ChartService
// ═══════════════════════════════════════════════════════════════════

mod chart_service {
    use super::*;

    #[test]
    fn zero_points_is_empty() {
        let mut sim = PriceSimulator::seeded(1);
        let series =
            ChartService::new().simulated_series(&mut sim, "Bitcoin", 0, at(12, 0), Duration::hours(1));
        assert!(series.is_empty());
    }

    #[test]
    fn series_is_evenly_spaced_and_ends_at_end() {
        let mut sim = PriceSimulator::seeded(1);
        let end = at(23, 0);
        let series =
            ChartService::new().simulated_series(&mut sim, "Bitcoin", 24, end, Duration::hours(1));

        assert_eq!(series.len(), 24);
        assert_eq!(series.last().unwrap().timestamp, end);
        assert_eq!(series[0].timestamp, at(0, 0));
        assert!(series
            .windows(2)
            .all(|w| w[1].timestamp - w[0].timestamp == Duration::hours(1)));
    }

    #[test]
    fn series_prices_follow_base_range() {
        let mut sim = PriceSimulator::seeded(4);
        let series = ChartService::new().simulated_series(
            &mut sim,
            "Bitcoin",
            50,
            at(12, 0),
            Duration::minutes(30),
        );
        let low = 35_000.0 * (1.0 - FLUCTUATION) * 0.94;
        let high = 45_000.0 * (1.0 + FLUCTUATION) * 1.06;
        assert!(series.iter().all(|p| p.price >= low && p.price <= high));
    }

    #[test]
    fn series_is_never_negative() {
        let mut sim = PriceSimulator::new();
        let series =
            ChartService::new().simulated_series(&mut sim, "doge", 100, at(12, 0), Duration::hours(1));
        assert!(series.iter().all(|p| p.price >= 0.0));
    }

    #[test]
    fn history_series_sorted_oldest_first() {
        let points = vec![
            HistoryPoint::new("BTC-001", 3.0, at(12, 0)),
            HistoryPoint::new("BTC-001", 1.0, at(10, 0)),
            HistoryPoint::new("BTC-001", 2.0, at(11, 0)),
        ];
        let series = ChartService::default().history_series(&points);
        let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert_eq!(series[0].timestamp, at(10, 0));
    }
}
