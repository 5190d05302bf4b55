//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `daybudget_core` linkage.
//! - Print one budget snapshot from a throwaway engine.

use daybudget_core::{Allowance, BudgetEngine, SystemClock};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("daybudget_core ping={}", daybudget_core::ping());
    println!("daybudget_core version={}", daybudget_core::core_version());

    let preferences_path = std::env::temp_dir().join(format!(
        "daybudget_cli_{}_preferences.json",
        std::process::id()
    ));
    let result = BudgetEngine::open_in_memory(&preferences_path, Arc::new(SystemClock))
        .map(|engine| engine.snapshot());
    let _ = std::fs::remove_file(&preferences_path);

    match result {
        Ok(snapshot) => {
            println!(
                "snapshot days_elapsed={} days_remaining={} allowance_today={} allowance_tomorrow={}",
                snapshot.days_elapsed,
                snapshot.days_remaining,
                allowance_label(snapshot.allowance_today),
                allowance_label(snapshot.allowance_tomorrow)
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("engine open failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn allowance_label(allowance: Allowance) -> String {
    match allowance {
        Allowance::Amount(amount) => amount.to_string(),
        Allowance::PeriodEnded => "period_ended".to_string(),
    }
}
