//! Reactive budget aggregator.
//!
//! # Responsibility
//! - Subscribe to the ledger's full record set and to the preferences store.
//! - Recompute the budget snapshot on every emission of either stream.
//! - Republish whole snapshots to subscribers.
//!
//! # Invariants
//! - The first real snapshot exists before `start` returns.
//! - Pending emissions of both streams are drained before recomputing, so a
//!   recomputation never uses a stale value once a newer one has arrived.
//! - "Today" comes from the clock at recomputation time.
//! - On a computation fault the last good snapshot stays published.

use crate::budget::calculator::{compute, BudgetError};
use crate::clock::Clock;
use crate::model::budget::{BudgetSnapshot, SpendFigures};
use crate::model::expense::ExpenseRecord;
use crate::model::preferences::BudgetConfiguration;
use crate::repo::expense_repo::{ExpenseLedger, RepoError};
use crate::repo::preferences_repo::PreferencesStore;
use crate::stream::Subscribers;
use chrono::NaiveDate;
use flume::{Receiver, RecvError, Selector, Sender};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "budget-aggregator";

/// Error raised while starting the aggregator.
#[derive(Debug)]
pub enum AggregatorError {
    Repo(RepoError),
    /// An upstream stream closed before emitting its first value.
    UpstreamClosed(&'static str),
    Spawn(std::io::Error),
}

impl Display for AggregatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UpstreamClosed(stream) => {
                write!(f, "{stream} stream closed before its first value")
            }
            Self::Spawn(err) => write!(f, "failed to spawn aggregator worker: {err}"),
        }
    }
}

impl Error for AggregatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::UpstreamClosed(_) => None,
        }
    }
}

impl From<RepoError> for AggregatorError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

enum Control {
    Refresh,
}

enum Upstream {
    Records(Vec<ExpenseRecord>),
    Config(BudgetConfiguration),
    Control(Control),
}

struct Shared {
    snapshot: RwLock<BudgetSnapshot>,
    subscribers: Subscribers<(), BudgetSnapshot>,
}

impl Shared {
    fn publish(&self, snapshot: BudgetSnapshot) {
        // Held across the fan-out so `subscribe` cannot interleave.
        let mut current = self.snapshot.write();
        *current = snapshot;
        let delivered = self.subscribers.publish_with(|_| Some(current.clone()));
        debug!("event=budget_publish module=budget status=ok subscribers={delivered}");
    }
}

/// Live budget view over a ledger and a preferences store.
pub struct BudgetAggregator {
    shared: Arc<Shared>,
    control_tx: Option<Sender<Control>>,
    worker: Option<JoinHandle<()>>,
}

impl BudgetAggregator {
    /// Subscribes to both stores, computes the first snapshot and starts the
    /// recompute worker.
    ///
    /// # Errors
    /// - `Repo` when the ledger query cannot be opened.
    /// - `UpstreamClosed` when a store drops its stream before emitting.
    /// - `Spawn` when the worker thread cannot be created.
    pub fn start(
        ledger: &dyn ExpenseLedger,
        preferences: &dyn PreferencesStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AggregatorError> {
        let records_rx = ledger.stream_all()?;
        let config_rx = preferences.stream();

        let records = records_rx
            .recv()
            .map_err(|_| AggregatorError::UpstreamClosed("expenses"))?;
        let config = config_rx
            .recv()
            .map_err(|_| AggregatorError::UpstreamClosed("preferences"))?;

        let initial = match Self::recompute(&records, &config, clock.today()) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    "event=budget_recompute module=budget status=error fallback=empty error={}",
                    err
                );
                BudgetSnapshot::empty()
            }
        };

        let shared = Arc::new(Shared {
            snapshot: RwLock::new(initial),
            subscribers: Subscribers::new(),
        });
        let (control_tx, control_rx) = flume::unbounded();

        let worker = Worker {
            shared: Arc::clone(&shared),
            clock,
            records_rx,
            config_rx,
            control_rx,
            records,
            config,
        };
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(AggregatorError::Spawn)?;

        info!("event=budget_aggregator_start module=budget status=ok");
        Ok(Self {
            shared,
            control_tx: Some(control_tx),
            worker: Some(handle),
        })
    }

    /// Pure recomputation used by the worker.
    ///
    /// Identical inputs always yield an identical snapshot.
    pub fn recompute(
        records: &[ExpenseRecord],
        config: &BudgetConfiguration,
        today: NaiveDate,
    ) -> Result<BudgetSnapshot, BudgetError> {
        let spend = SpendFigures::from_records(records, today)?;
        compute(config, &spend, today)
    }

    /// Returns the last published snapshot.
    pub fn current(&self) -> BudgetSnapshot {
        self.shared.snapshot.read().clone()
    }

    /// Returns a receiver that gets the current snapshot immediately and
    /// every later one. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<BudgetSnapshot> {
        let current = self.shared.snapshot.read();
        self.shared.subscribers.subscribe((), current.clone())
    }

    /// Asks the worker to recompute with a fresh "today".
    ///
    /// Useful when the presentation layer resumes after midnight.
    pub fn refresh(&self) {
        if let Some(tx) = &self.control_tx {
            let _ = tx.send(Control::Refresh);
        }
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(&mut self) {
        // Dropping the sender disconnects the control channel, which ends
        // the worker loop.
        self.control_tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("event=budget_aggregator_stop module=budget status=error reason=worker_panicked");
                return;
            }
            info!("event=budget_aggregator_stop module=budget status=ok");
        }
    }
}

impl Drop for BudgetAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    records_rx: Receiver<Vec<ExpenseRecord>>,
    config_rx: Receiver<BudgetConfiguration>,
    control_rx: Receiver<Control>,
    records: Vec<ExpenseRecord>,
    config: BudgetConfiguration,
}

impl Worker {
    fn run(mut self) {
        loop {
            let next = Selector::new()
                .recv(&self.records_rx, |value| value.map(Upstream::Records))
                .recv(&self.config_rx, |value| value.map(Upstream::Config))
                .recv(&self.control_rx, |value| value.map(Upstream::Control))
                .wait();

            match next {
                Ok(Upstream::Records(records)) => self.records = records,
                Ok(Upstream::Config(config)) => self.config = config,
                Ok(Upstream::Control(Control::Refresh)) => {}
                Err(RecvError::Disconnected) => break,
            }

            self.drain_pending();
            self.recompute_and_publish();
        }
        debug!("event=budget_worker_exit module=budget status=ok");
    }

    fn drain_pending(&mut self) {
        if let Some(records) = self.records_rx.try_iter().last() {
            self.records = records;
        }
        if let Some(config) = self.config_rx.try_iter().last() {
            self.config = config;
        }
    }

    fn recompute_and_publish(&self) {
        let today = self.clock.today();
        match BudgetAggregator::recompute(&self.records, &self.config, today) {
            Ok(snapshot) => self.shared.publish(snapshot),
            Err(err) => warn!(
                "event=budget_recompute module=budget status=error fallback=last_snapshot error={}",
                err
            ),
        }
    }
}
