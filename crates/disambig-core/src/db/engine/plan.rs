use crate::{db::identity::RecordId, error::InternalError};

///
/// GroupMember
///
/// One member of a duplicate group as seen by the planner: its id and the
/// index currently stored for it, if any. Members arrive in group order.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GroupMember {
    pub id: RecordId,
    pub current: Option<u32>,
}

///
/// LedgerOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LedgerOp {
    Create { id: RecordId, index: u32 },
    Update { id: RecordId, from: u32, to: u32 },
    Delete { id: RecordId },
}

///
/// RenumberPlan
///
/// Ledger writes needed to bring one group to `0..n` in group order.
/// Unchanged members produce no op.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenumberPlan {
    pub ops: Vec<LedgerOp>,
    pub members: usize,
    pub collapsed: bool,
}

impl RenumberPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether members should be told their index after the plan is applied.
    #[must_use]
    pub const fn notifies(&self) -> bool {
        self.members >= 2
    }
}

/// Plan the renumbering of one group.
///
/// A lone member loses its entry; it is marked `collapsed` even when it had
/// none, so callers can tell a singleton pass from a multi-member one.
pub fn plan_renumber(members: &[GroupMember]) -> Result<RenumberPlan, InternalError> {
    match members {
        [] => Ok(RenumberPlan::default()),

        [only] => Ok(RenumberPlan {
            ops: only
                .current
                .map(|_| LedgerOp::Delete { id: only.id })
                .into_iter()
                .collect(),
            members: 1,
            collapsed: true,
        }),

        _ => {
            let mut ops = Vec::new();

            for (position, member) in members.iter().enumerate() {
                let index = u32::try_from(position).map_err(|_| {
                    InternalError::engine_invariant(format!(
                        "duplicate group exceeds {} members",
                        u32::MAX
                    ))
                })?;

                match member.current {
                    Some(current) if current == index => {}
                    Some(current) => ops.push(LedgerOp::Update {
                        id: member.id,
                        from: current,
                        to: index,
                    }),
                    None => ops.push(LedgerOp::Create {
                        id: member.id,
                        index,
                    }),
                }
            }

            Ok(RenumberPlan {
                ops,
                members: members.len(),
                collapsed: false,
            })
        }
    }
}

///
/// TESTS
///
