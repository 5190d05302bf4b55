use chrono::{Days, NaiveDate};
use daybudget_core::db::open_db_in_memory;
use daybudget_core::{
    BudgetService, ExpenseRecord, ExpenseService, FixedClock, JsonPreferencesStore,
    PreferencesError, RepoError, SqliteExpenseLedger, Theme,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

fn expense_service(clock: Arc<FixedClock>) -> ExpenseService<SqliteExpenseLedger> {
    let ledger = Arc::new(SqliteExpenseLedger::new(open_db_in_memory().unwrap()));
    ExpenseService::new(ledger, clock)
}

fn budget_service(clock: Arc<FixedClock>) -> (TempDir, BudgetService<JsonPreferencesStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonPreferencesStore::new(
        dir.path().join("preferences.json"),
        clock.clone(),
    ));
    (dir, BudgetService::new(store, clock))
}

#[test]
fn record_spend_today_creates_unnamed_expense_dated_today() {
    let clock = Arc::new(FixedClock::new(day(12)));
    let service = expense_service(clock);

    let id = service.record_spend_today(dec!(7.25)).unwrap();
    let record = service.get_expense(id).unwrap().unwrap();
    assert_eq!(record.name, "");
    assert_eq!(record.amount, dec!(7.25));
    assert_eq!(record.date, day(12));
    assert_eq!(service.list_today().unwrap(), vec![record]);
}

#[test]
fn edit_and_remove_surface_ledger_errors() {
    let clock = Arc::new(FixedClock::new(day(12)));
    let service = expense_service(clock);

    let id = service.record_expense("fuel", dec!(60), day(11)).unwrap();
    let mut record = service.get_expense(id).unwrap().unwrap();
    record.amount = dec!(55);
    service.edit_expense(&record).unwrap();
    assert_eq!(service.get_expense(id).unwrap().unwrap().amount, dec!(55));

    service.remove_expense(&record).unwrap();
    assert!(matches!(
        service.remove_expense(&record),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        service.edit_expense(&ExpenseRecord::with_id(id, "fuel", dec!(1), day(11))),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn purge_and_reset_ids_restart_numbering() {
    let clock = Arc::new(FixedClock::new(day(20)));
    let service = expense_service(clock);
    for d in [1, 2, 3] {
        service.record_expense("", dec!(1), day(d)).unwrap();
    }

    assert_eq!(service.purge_before(day(20)).unwrap(), 3);
    service.reset_ids().unwrap();
    assert_eq!(service.record_spend_today(dec!(2)).unwrap(), 1);
    assert_eq!(service.list_expenses().unwrap().len(), 1);
}

#[test]
fn restart_budget_starts_today_and_runs_to_end_date() {
    let clock = Arc::new(FixedClock::new(day(1)));
    let (_dir, service) = budget_service(clock.clone());
    assert_eq!(service.configuration().start_date, day(1));

    clock.set(day(15));
    service.restart_budget(dec!(2500), day(25)).unwrap();

    let config = service.configuration();
    assert_eq!(config.total_amount, dec!(2500));
    assert_eq!(config.start_date, day(15));
    assert_eq!(config.period_days, 10);
    assert_eq!(config.end_date(), Some(day(25)));
}

#[test]
fn restart_budget_rejects_past_end_and_non_positive_amount() {
    let clock = Arc::new(FixedClock::new(day(10)));
    let (_dir, service) = budget_service(clock);
    let before = service.configuration();

    assert!(matches!(
        service.restart_budget(dec!(100), day(10)),
        Err(PreferencesError::InvalidValue(_))
    ));
    assert!(matches!(
        service.restart_budget(Decimal::ZERO, day(10) + Days::new(5)),
        Err(PreferencesError::InvalidValue(_))
    ));
    assert_eq!(service.configuration(), before);
}

#[test]
fn presentation_settings_do_not_touch_budget_fields() {
    let clock = Arc::new(FixedClock::new(day(3)));
    let (_dir, service) = budget_service(clock);
    let before = service.configuration();

    service.set_theme(Theme::Dark).unwrap();
    service.set_undo_delay(1500).unwrap();

    let after = service.configuration();
    assert_eq!(after.theme, Theme::Dark);
    assert_eq!(after.undo_delay_millis, 1500);
    assert_eq!(after.total_amount, before.total_amount);
    assert_eq!(after.start_date, before.start_date);
    assert_eq!(after.period_days, before.period_days);
}
