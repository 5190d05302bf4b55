use chrono::{Days, NaiveDate};
use daybudget_core::{
    compute, Allowance, BudgetAggregator, BudgetConfiguration, BudgetError, ExpenseRecord,
    SpendFigures,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

fn config(total: Decimal, period_days: u32) -> BudgetConfiguration {
    BudgetConfiguration {
        total_amount: total,
        period_days,
        ..BudgetConfiguration::with_defaults(start())
    }
}

#[test]
fn first_day_without_spending_splits_budget_evenly() {
    let snapshot = compute(&config(dec!(3000), 30), &SpendFigures::default(), start()).unwrap();

    assert_eq!(snapshot.days_elapsed, 0);
    assert_eq!(snapshot.days_remaining, 30);
    assert_eq!(snapshot.allowance_today, Allowance::Amount(dec!(100)));
    assert_eq!(snapshot.allowance_tomorrow, Allowance::Amount(dec!(3000) / dec!(29)));
    assert_eq!(snapshot.amount_remaining_total, dec!(3000));
    assert!(!snapshot.period_complete);
}

#[test]
fn mid_period_allowance_subtracts_todays_spend() {
    let today = start() + Days::new(5);
    let spend = SpendFigures::new(dec!(450), dec!(400));
    let snapshot = compute(&config(dec!(3000), 30), &spend, today).unwrap();

    assert_eq!(snapshot.days_elapsed, 5);
    assert_eq!(snapshot.days_remaining, 25);
    assert_eq!(snapshot.allowance_today, Allowance::Amount(dec!(54)));
    assert_eq!(snapshot.allowance_tomorrow, Allowance::Amount(dec!(106.25)));
    assert!(!snapshot.tomorrow_is_tighter());
}

#[test]
fn spending_today_reduces_today_and_spreads_into_tomorrow() {
    let today = start() + Days::new(10);
    let spend = SpendFigures::new(dec!(1100), dec!(1000));
    let snapshot = compute(&config(dec!(3000), 30), &spend, today).unwrap();

    assert_eq!(snapshot.days_remaining, 20);
    assert_eq!(snapshot.allowance_today, Allowance::Amount(dec!(0)));
    assert_eq!(snapshot.allowance_tomorrow, Allowance::Amount(dec!(1900) / dec!(19)));
    assert_eq!(snapshot.amount_remaining_total, dec!(1900));
}

#[test]
fn overspending_clamps_today_but_not_remaining_total() {
    let today = start() + Days::new(5);
    let spend = SpendFigures::new(dec!(3500), dec!(3200));
    let snapshot = compute(&config(dec!(3000), 10), &spend, today).unwrap();

    assert_eq!(snapshot.allowance_today, Allowance::Amount(Decimal::ZERO));
    assert_eq!(snapshot.amount_remaining_total, dec!(-500));
    assert_eq!(snapshot.allowance_tomorrow, Allowance::Amount(dec!(-125)));
}

#[test]
fn completed_period_reports_period_ended() {
    let today = start() + Days::new(30);
    let spend = SpendFigures::new(dec!(100), dec!(100));
    let snapshot = compute(&config(dec!(3000), 30), &spend, today).unwrap();

    assert!(snapshot.period_complete);
    assert_eq!(snapshot.days_remaining, 0);
    assert_eq!(snapshot.allowance_today, Allowance::PeriodEnded);
    assert_eq!(snapshot.allowance_tomorrow, Allowance::PeriodEnded);
    assert_eq!(snapshot.allowance_today.value(), Decimal::ZERO);
    assert_eq!(snapshot.amount_remaining_total, dec!(2900));
}

#[test]
fn long_after_the_period_days_remaining_goes_negative() {
    let today = start() + Days::new(45);
    let snapshot = compute(&config(dec!(300), 30), &SpendFigures::default(), today).unwrap();
    assert_eq!(snapshot.days_elapsed, 45);
    assert_eq!(snapshot.days_remaining, -15);
    assert!(snapshot.period_complete);
}

#[test]
fn today_allowance_follows_the_formula_across_the_period() {
    let budget = config(dec!(1000), 7);
    let spend = SpendFigures::new(dec!(260), dec!(200));
    for offset in 0..7u64 {
        let today = start() + Days::new(offset);
        let snapshot = compute(&budget, &spend, today).unwrap();
        let days_remaining = Decimal::from(7 - offset);
        let expected = ((dec!(1000) - dec!(200)) / days_remaining - dec!(60)).max(Decimal::ZERO);

        assert_eq!(snapshot.allowance_today, Allowance::Amount(expected));
        assert!(snapshot.allowance_today.value() >= Decimal::ZERO);
        assert_eq!(
            snapshot.spend.spent_today,
            snapshot.spend.total_spent - snapshot.spend.spent_before_today
        );
    }
}

#[test]
fn more_spending_today_never_raises_today_allowance() {
    let budget = config(dec!(1000), 10);
    let today = start() + Days::new(2);
    let mut previous = None;
    for spent_today in [0, 10, 50, 99, 100, 250, 5000] {
        let spend = SpendFigures::new(dec!(150) + Decimal::from(spent_today), dec!(150));
        let allowance = compute(&budget, &spend, today)
            .unwrap()
            .allowance_today
            .value();
        if let Some(previous) = previous {
            assert!(allowance <= previous);
        }
        previous = Some(allowance);
    }
}

#[test]
fn larger_total_never_lowers_today_allowance() {
    let today = start() + Days::new(4);
    let spend = SpendFigures::new(dec!(500), dec!(300));
    let mut previous = None;
    // Totals up to 1500 clamp today's allowance at zero.
    for total in [1, 50, 300, 1300, 1500, 1501, 1506, 2000, 15453, 1_000_000] {
        let allowance = compute(&config(Decimal::from(total), 10), &spend, today)
            .unwrap()
            .allowance_today
            .value();
        if let Some(previous) = previous {
            assert!(allowance >= previous, "total {total}: {allowance} < {previous}");
        }
        previous = Some(allowance);
    }
    assert_eq!(previous, Some((dec!(1000000) - dec!(300)) / dec!(6) - dec!(200)));
}

#[test]
fn same_inputs_give_identical_snapshots() {
    let budget = config(dec!(15453), 30);
    let spend = SpendFigures::new(dec!(812.40), dec!(700));
    let today = start() + Days::new(12);
    assert_eq!(
        compute(&budget, &spend, today).unwrap(),
        compute(&budget, &spend, today).unwrap()
    );
}

#[test]
fn invalid_inputs_are_errors_not_panics() {
    let spend = SpendFigures::default();
    assert!(matches!(
        compute(&config(dec!(-1), 30), &spend, start()),
        Err(BudgetError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        compute(&config(dec!(100), 0), &spend, start()),
        Err(BudgetError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        compute(
            &config(dec!(100), 30),
            &SpendFigures::new(dec!(5), dec!(-1)),
            start()
        ),
        Err(BudgetError::InvalidSpend(_))
    ));
}

#[test]
fn future_dated_records_count_as_spent_today() {
    let today = start() + Days::new(3);
    let records = vec![
        ExpenseRecord::with_id(1, "rent", dec!(400), start()),
        ExpenseRecord::with_id(2, "coffee", dec!(3.50), today),
        ExpenseRecord::with_id(3, "lunch", dec!(11.50), today),
        ExpenseRecord::with_id(4, "ticket", dec!(20), today + Days::new(2)),
    ];
    let snapshot = BudgetAggregator::recompute(&records, &config(dec!(1000), 10), today).unwrap();

    assert_eq!(snapshot.spend.spent_before_today, dec!(400));
    assert_eq!(snapshot.spend.total_spent, dec!(435));
    assert_eq!(snapshot.spend.spent_today, dec!(55));
    assert_eq!(snapshot.days_remaining, 7);
    assert_eq!(
        snapshot.allowance_today,
        Allowance::Amount(dec!(600) / dec!(7) - dec!(55))
    );
    assert_eq!(snapshot.allowance_tomorrow, Allowance::Amount(dec!(565) / dec!(6)));
}
