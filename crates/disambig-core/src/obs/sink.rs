//! Metrics sink boundary.
//!
//! Engine and session code never touch `obs::metrics` directly; every
//! counter update flows through `MetricsEvent` and `MetricsSink`.
use crate::{obs::metrics, traits::Path};
use std::{cell::RefCell, marker::PhantomData};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Load,
    Save,
    Delete,
    Renumber,
}

///
/// MetricsEvent
///
/// Events raised inside a session write are held until its commit window
/// closes and dropped if it rolls back; only `Rollback` reports that work.
/// Callers driving `Engine` on their own store get events immediately.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        entity_path: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        entity_path: &'static str,
        rows_touched: u64,
        inst_delta: u64,
    },
    GroupScanned {
        entity_path: &'static str,
        members: u64,
    },
    LedgerDelta {
        entity_path: &'static str,
        creates: u64,
        updates: u64,
        deletes: u64,
    },
    GroupCollapsed {
        entity_path: &'static str,
    },
    HooksInvoked {
        entity_path: &'static str,
        calls: u64,
    },
    Rollback {
        entity_path: &'static str,
        ops: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, entity_path } => {
                metrics::with_state_mut(|m| {
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    match kind {
                        ExecKind::Load => {
                            m.ops.load_calls = m.ops.load_calls.saturating_add(1);
                            entry.load_calls = entry.load_calls.saturating_add(1);
                        }
                        ExecKind::Save => {
                            m.ops.save_calls = m.ops.save_calls.saturating_add(1);
                            entry.save_calls = entry.save_calls.saturating_add(1);
                        }
                        ExecKind::Delete => {
                            m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                            entry.delete_calls = entry.delete_calls.saturating_add(1);
                        }
                        ExecKind::Renumber => {
                            m.ops.renumber_passes = m.ops.renumber_passes.saturating_add(1);
                            entry.renumber_passes = entry.renumber_passes.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind, inst_delta, ..
            } => {
                metrics::with_state_mut(|m| match kind {
                    ExecKind::Save => metrics::add_instructions(
                        &mut m.perf.save_inst_total,
                        &mut m.perf.save_inst_max,
                        inst_delta,
                    ),
                    ExecKind::Delete => metrics::add_instructions(
                        &mut m.perf.delete_inst_total,
                        &mut m.perf.delete_inst_max,
                        inst_delta,
                    ),
                    ExecKind::Renumber => metrics::add_instructions(
                        &mut m.perf.renumber_inst_total,
                        &mut m.perf.renumber_inst_max,
                        inst_delta,
                    ),
                    ExecKind::Load => {}
                });
            }

            MetricsEvent::GroupScanned { members, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.group_members_scanned =
                        m.ops.group_members_scanned.saturating_add(members);
                });
            }

            MetricsEvent::LedgerDelta {
                entity_path,
                creates,
                updates,
                deletes,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.ledger_creates = m.ops.ledger_creates.saturating_add(creates);
                    m.ops.ledger_updates = m.ops.ledger_updates.saturating_add(updates);
                    m.ops.ledger_deletes = m.ops.ledger_deletes.saturating_add(deletes);

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.ledger_creates = entry.ledger_creates.saturating_add(creates);
                    entry.ledger_updates = entry.ledger_updates.saturating_add(updates);
                    entry.ledger_deletes = entry.ledger_deletes.saturating_add(deletes);
                });
            }

            MetricsEvent::GroupCollapsed { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.group_collapses = m.ops.group_collapses.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.group_collapses = entry.group_collapses.saturating_add(1);
                });
            }

            MetricsEvent::HooksInvoked { entity_path, calls } => {
                metrics::with_state_mut(|m| {
                    m.ops.hook_calls = m.ops.hook_calls.saturating_add(calls);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.hook_calls = entry.hook_calls.saturating_add(calls);
                });
            }

            MetricsEvent::Rollback { entity_path, ops } => {
                metrics::with_state_mut(|m| {
                    m.ops.rollbacks = m.ops.rollbacks.saturating_add(1);
                    m.ops.rollback_ops = m.ops.rollback_ops.saturating_add(ops);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.rollbacks = entry.rollbacks.saturating_add(1);
                });
            }
        }
    }
}

///
/// EventBuffer
///
/// Sink that holds events until `flush` forwards them to the active sink.
/// Dropping it discards them.
///

#[derive(Default)]
pub(crate) struct EventBuffer(RefCell<Vec<MetricsEvent>>);

impl EventBuffer {
    pub(crate) fn flush(self) {
        for event in self.0.into_inner() {
            record(event);
        }
    }
}

impl MetricsSink for EventBuffer {
    fn record(&self, event: MetricsEvent) {
        self.0.borrow_mut().push(event);
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` comes from a live `&dyn MetricsSink` installed by
        //   `with_metrics_sink`, whose guard restores the previous slot on
        //   every exit including unwind.
        // - `record` is synchronous and never retains `ptr`.
        // - Only a shared reference is materialized.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The pointer is installed only for this dynamic scope and the guard
    //   restores the previous slot on all exits.
    // - `record` dereferences it synchronously and never persists it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard emitting start/finish events for one session call.
/// Finish accounting happens on unwind and on early `?` returns too.

pub(crate) struct Span<E: Path> {
    kind: ExecKind,
    start: u64,
    rows: u64,
    _marker: PhantomData<E>,
}

#[expect(clippy::missing_const_for_fn)]
fn read_perf_counter() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        canic_cdk::api::performance_counter(1)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0
    }
}

impl<E: Path> Span<E> {
    #[must_use]
    pub(crate) fn new(kind: ExecKind) -> Self {
        record(MetricsEvent::ExecStart {
            kind,
            entity_path: E::PATH,
        });

        Self {
            kind,
            start: read_perf_counter(),
            rows: 0,
            _marker: PhantomData,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl<E: Path> Drop for Span<E> {
    fn drop(&mut self) {
        let delta = read_perf_counter().saturating_sub(self.start);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            entity_path: E::PATH,
            rows_touched: self.rows,
            inst_delta: delta,
        });
    }
}

///
/// TESTS
///
