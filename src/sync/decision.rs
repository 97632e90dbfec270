//! Rule evaluation
//!
//! `decide` is a pure function of (rule, current value, proposal). It never
//! touches the store; the synchronizer performs the write only when the
//! decision says so.

use crate::policy::{MutabilityRule, ReviewRank};

use super::change::ChangeAction;
use super::proposal::Proposal;

pub const REASON_NO_VALUE: &str = "no value supplied";
pub const REASON_IMMUTABLE: &str = "immutable field already set";
pub const REASON_WRITE_ONCE: &str = "write-once field already set; use force";
pub const REASON_FORCED: &str = "forced overwrite";

/// What to do with one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: ChangeAction,
    pub reason: Option<String>,
}

impl Decision {
    fn created() -> Self {
        Self {
            action: ChangeAction::Created,
            reason: None,
        }
    }

    fn updated(reason: Option<String>) -> Self {
        Self {
            action: ChangeAction::Updated,
            reason,
        }
    }

    fn unchanged() -> Self {
        Self {
            action: ChangeAction::Unchanged,
            reason: None,
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            action: ChangeAction::Skipped,
            reason: Some(reason.into()),
        }
    }

    /// Whether the proposal must be written
    pub fn writes(&self) -> bool {
        self.action.is_write()
    }
}

fn is_empty(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Decide the fate of `proposal` against the stored `current` value.
pub fn decide(rule: MutabilityRule, current: Option<&str>, proposal: &Proposal) -> Decision {
    if proposal.is_blank() {
        return Decision::skipped(REASON_NO_VALUE);
    }

    let current = match current {
        Some(v) if !is_empty(Some(v)) => v,
        _ => return Decision::created(),
    };
    let proposed = proposal.value.as_str();

    match rule {
        MutabilityRule::Immutable => Decision::skipped(REASON_IMMUTABLE),

        MutabilityRule::WriteOnce => {
            if current == proposed {
                Decision::unchanged()
            } else if proposal.force {
                Decision::updated(Some(REASON_FORCED.to_string()))
            } else {
                Decision::skipped(REASON_WRITE_ONCE)
            }
        }

        MutabilityRule::Iterable => {
            if current == proposed {
                Decision::unchanged()
            } else {
                Decision::updated(None)
            }
        }

        MutabilityRule::MonotonicStatus => decide_status(current, proposed),
    }
}

fn decide_status(current: &str, proposed: &str) -> Decision {
    match (ReviewRank::parse(current), ReviewRank::parse(proposed)) {
        (Some(have), Some(want)) => {
            if want == have {
                Decision::unchanged()
            } else if want > have {
                Decision::updated(None)
            } else {
                Decision::skipped(format!("no downgrade: kept existing '{}'", current))
            }
        }
        // An unrecognized value never displaces a ranked one.
        (Some(_), None) => Decision::skipped(format!(
            "unrecognized status '{}' cannot replace '{}'",
            proposed, current
        )),
        // A ranked value repairs an unrecognized stored one.
        (None, Some(_)) => Decision::updated(Some(format!(
            "replaced unrecognized status '{}'",
            current
        ))),
        (None, None) => {
            if current == proposed {
                Decision::unchanged()
            } else {
                Decision::skipped(format!(
                    "incomparable status: kept existing '{}'",
                    current
                ))
            }
        }
    }
}
