mod plan;

pub use plan::{GroupMember, LedgerOp, RenumberPlan, plan_renumber};

use crate::{
    db::{
        data::DataKey,
        registry::DisambiguationModel,
        traits::{LedgerAccess, RecordSource},
    },
    error::InternalError,
    obs::sink::{self, MetricsEvent},
    traits::Disambiguatable,
};

///
/// RenumberReport
///
/// Outcome of one renumbering pass over one duplicate group.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenumberReport {
    pub members: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub hooks_fired: usize,
    pub collapsed: bool,
}

impl RenumberReport {
    /// Total ledger writes performed.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

///
/// Engine
///
/// Keeps ledger indices in step with host writes. The engine never writes
/// host rows; callers persist the row, then hand the engine the lifecycle
/// point that just happened.
///

pub struct Engine<'a, S> {
    store: &'a mut S,
    debug: bool,
}

impl<'a, S: RecordSource + LedgerAccess> Engine<'a, S> {
    #[must_use]
    pub const fn new(store: &'a mut S, debug: bool) -> Self {
        Self { store, debug }
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            tracing::debug!("{}", s.into());
        }
    }

    // ======================================================================
    // Lifecycle points
    // ======================================================================

    /// Renumber after `saved` was persisted.
    ///
    /// When `previous` is the row as it was before an update and its
    /// disambiguation values differ, the group it left is renumbered too.
    /// Reports come back joined group first.
    pub fn after_save<E: Disambiguatable>(
        &mut self,
        model: &DisambiguationModel,
        saved: &E,
        previous: Option<&E>,
    ) -> Result<Vec<RenumberReport>, InternalError> {
        let mut reports = vec![self.renumber(model, saved)?];

        if let Some(previous) = previous
            && model.clauses_for(previous)? != model.clauses_for(saved)?
        {
            self.debug_log(format!(
                "{} #{} left its duplicate group; renumbering the old group",
                E::PATH,
                saved.id()
            ));
            reports.push(self.renumber(model, previous)?);
        }

        Ok(reports)
    }

    /// Drop the ledger entry of a record about to be removed.
    pub fn before_delete<E: Disambiguatable>(
        &mut self,
        model: &DisambiguationModel,
        record: &E,
    ) -> Result<bool, InternalError> {
        model.ensure_for::<E>()?;

        let removed = self
            .store
            .delete_entry(DataKey::new(model.entity(), record.id()))?;

        if removed {
            sink::record(MetricsEvent::LedgerDelta {
                entity_path: E::PATH,
                creates: 0,
                updates: 0,
                deletes: 1,
            });
        }

        Ok(removed)
    }

    /// Renumber the group a removed record belonged to.
    pub fn after_delete<E: Disambiguatable>(
        &mut self,
        model: &DisambiguationModel,
        removed: &E,
    ) -> Result<RenumberReport, InternalError> {
        self.renumber(model, removed)
    }

    // ======================================================================
    // Renumbering
    // ======================================================================

    /// Bring the group holding `record`'s disambiguation values to `0..n`,
    /// then run the completion hook for every member if `n >= 2`.
    pub fn renumber<E: Disambiguatable>(
        &mut self,
        model: &DisambiguationModel,
        record: &E,
    ) -> Result<RenumberReport, InternalError> {
        let group = duplicates_of(&*self.store, model, record)?;

        let mut members = Vec::with_capacity(group.len());
        for member in &group {
            let key = DataKey::new(model.entity(), member.id());
            members.push(GroupMember {
                id: member.id(),
                current: self.store.get_entry(key)?.map(|entry| entry.index),
            });
        }

        let plan = plan_renumber(&members)?;
        sink::record(MetricsEvent::GroupScanned {
            entity_path: E::PATH,
            members: group.len() as u64,
        });

        let mut report = self.apply::<E>(model, &plan)?;

        if plan.notifies() {
            for (member, index) in group.iter().zip(0u32..) {
                if let Err(err) = member.after_disambiguated(index) {
                    record_hooks::<E>(report.hooks_fired);
                    return Err(err.into());
                }
                report.hooks_fired += 1;
            }
            record_hooks::<E>(report.hooks_fired);
        }

        self.debug_log(format!(
            "renumbered {} group of {}: created={} updated={} deleted={} hooks={}",
            E::PATH,
            report.members,
            report.created,
            report.updated,
            report.deleted,
            report.hooks_fired,
        ));

        Ok(report)
    }

    // Write the planned ops. The store reports conflicts and missing
    // entries itself; a delete that removes nothing means the plan was
    // built from a ledger that changed underneath it.
    fn apply<E: Disambiguatable>(
        &mut self,
        model: &DisambiguationModel,
        plan: &RenumberPlan,
    ) -> Result<RenumberReport, InternalError> {
        let mut report = RenumberReport {
            members: plan.members,
            collapsed: plan.collapsed,
            ..RenumberReport::default()
        };

        for op in &plan.ops {
            match *op {
                LedgerOp::Create { id, index } => {
                    self.store
                        .create_entry(DataKey::new(model.entity(), id), index)?;
                    report.created += 1;
                }
                LedgerOp::Update { id, to, .. } => {
                    self.store
                        .update_entry(DataKey::new(model.entity(), id), to)?;
                    report.updated += 1;
                }
                LedgerOp::Delete { id } => {
                    let key = DataKey::new(model.entity(), id);
                    if !self.store.delete_entry(key)? {
                        return Err(InternalError::engine_invariant(format!(
                            "planned ledger delete found no entry for {key}"
                        )));
                    }
                    report.deleted += 1;
                }
            }
        }

        if report.writes() > 0 {
            sink::record(MetricsEvent::LedgerDelta {
                entity_path: E::PATH,
                creates: report.created as u64,
                updates: report.updated as u64,
                deletes: report.deleted as u64,
            });
        }
        if report.collapsed && report.deleted > 0 {
            sink::record(MetricsEvent::GroupCollapsed {
                entity_path: E::PATH,
            });
        }

        Ok(report)
    }
}

fn record_hooks<E: Disambiguatable>(calls: usize) {
    if calls > 0 {
        sink::record(MetricsEvent::HooksInvoked {
            entity_path: E::PATH,
            calls: calls as u64,
        });
    }
}

// ==========================================================================
// Read-side helpers
// ==========================================================================

/// Persisted records sharing `record`'s disambiguation values, ascending by
/// id. Includes `record` itself when it is persisted.
pub fn duplicates_of<S: RecordSource, E: Disambiguatable>(
    source: &S,
    model: &DisambiguationModel,
    record: &E,
) -> Result<Vec<E>, InternalError> {
    let clauses = model.clauses_for(record)?;

    source.find_where(model.entity(), &clauses)
}

/// The ledger index of `record`, or the model default when it has none.
pub fn disambiguator_of<S: LedgerAccess, E: Disambiguatable>(
    ledger: &S,
    model: &DisambiguationModel,
    record: &E,
) -> Result<Option<u32>, InternalError> {
    model.ensure_for::<E>()?;

    let entry = ledger.get_entry(DataKey::new(model.entity(), record.id()))?;

    Ok(entry
        .map(|entry| entry.index)
        .or(model.default_disambiguator()))
}

#[cfg(test)]
mod tests;
