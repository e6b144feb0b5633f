use candid::CandidType;
use canic_cdk::utils::time::now_millis;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple perf totals for operations.
///

#[derive(CandidType, Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub entities: BTreeMap<String, EntityCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            entities: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Session entrypoints
    pub load_calls: u64,
    pub save_calls: u64,
    pub delete_calls: u64,
    pub renumber_passes: u64,

    // Group resolution
    pub group_members_scanned: u64,
    pub group_collapses: u64,

    // Ledger maintenance
    pub ledger_creates: u64,
    pub ledger_updates: u64,
    pub ledger_deletes: u64,

    // Completion hooks
    pub hook_calls: u64,

    // Commit windows rolled back
    pub rollbacks: u64,
    pub rollback_ops: u64,
}

///
/// EntityCounters
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub load_calls: u64,
    pub save_calls: u64,
    pub delete_calls: u64,
    pub renumber_passes: u64,
    pub group_collapses: u64,
    pub ledger_creates: u64,
    pub ledger_updates: u64,
    pub ledger_deletes: u64,
    pub hook_calls: u64,
    pub rollbacks: u64,
}

///
/// EventPerf
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    // Instruction totals per entrypoint (performance_counter(1) on wasm32)
    pub save_inst_total: u128,
    pub delete_inst_total: u128,
    pub renumber_inst_total: u128,

    // Maximum observed instruction deltas
    pub save_inst_max: u64,
    pub delete_inst_max: u64,
    pub renumber_inst_max: u64,
}

///
/// EventReport
/// Snapshot handed to endpoints and tests.
///

#[derive(CandidType, Clone, Debug, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub entities: Vec<EntitySummary>,
    pub since_ms: u64,
}

///
/// EntitySummary
///

#[derive(CandidType, Clone, Debug, Deserialize, Serialize)]
pub struct EntitySummary {
    pub path: String,
    pub counters: EntityCounters,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and perf totals.
pub fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate instruction counts and track a max.
pub(crate) fn add_instructions(total: &mut u128, max: &mut u64, delta_inst: u64) {
    *total = total.saturating_add(u128::from(delta_inst));
    if delta_inst > *max {
        *max = delta_inst;
    }
}

/// Build a report from the current state, entities ordered by path.
#[must_use]
pub fn report() -> EventReport {
    with_state(|m| EventReport {
        ops: m.ops.clone(),
        perf: m.perf.clone(),
        entities: m
            .entities
            .iter()
            .map(|(path, counters)| EntitySummary {
                path: path.clone(),
                counters: counters.clone(),
            })
            .collect(),
        since_ms: m.since_ms,
    })
}

///
/// TESTS
///
