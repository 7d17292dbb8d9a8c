//! Per-workflow action state machine
//!
//! `Idle → Submitting → (confirmed → Idle) | (failed → Failed)`. At most one
//! action of a workflow is submitting at a time; `Failed` counts as idle for
//! availability and is cleared by the next edit or action.

use dex_types::{Asset, DexError};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;

/// A user-triggerable action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// ERC-20 approval of the exchange for one asset
    Approve(Asset),
    Swap,
    /// Add liquidity
    Deposit,
    /// Remove liquidity
    Withdraw,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Approve(asset) => write!(f, "approve {}", asset.label()),
            ActionKind::Swap => write!(f, "swap"),
            ActionKind::Deposit => write!(f, "deposit"),
            ActionKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Submitting(ActionKind),
    /// Last action failed; inputs and cache are as they were before it
    Failed { kind: ActionKind, error: DexError },
}

impl ActionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, ActionState::Submitting(_))
    }
}

/// Owner of one workflow's action state
#[derive(Debug, Default)]
pub struct ActionSlot {
    state: Mutex<ActionState>,
}

impl ActionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ActionState {
        self.state.lock().clone()
    }

    /// Forget a previous failure
    pub fn clear_failure(&self) {
        let mut state = self.state.lock();
        if matches!(*state, ActionState::Failed { .. }) {
            *state = ActionState::Idle;
        }
    }

    /// Enter `Submitting(kind)`
    ///
    /// Fails with `ActionInProgress`, leaving the state untouched, while
    /// another action is submitting.
    pub fn begin(&self, kind: ActionKind) -> Result<SubmittingGuard<'_>, DexError> {
        let mut state = self.state.lock();
        if let ActionState::Submitting(current) = *state {
            return Err(DexError::ActionInProgress {
                action: current.to_string(),
            });
        }
        *state = ActionState::Submitting(kind);

        Ok(SubmittingGuard {
            slot: self,
            kind,
            finished: false,
        })
    }

    /// Run `action` as `kind`, recording its outcome
    ///
    /// `action` is not polled when the slot is busy.
    pub async fn run<T, F>(&self, kind: ActionKind, action: F) -> Result<T, DexError>
    where
        F: Future<Output = Result<T, DexError>>,
    {
        let guard = self.begin(kind)?;
        match action.await {
            Ok(value) => {
                guard.succeed();
                Ok(value)
            }
            Err(e) => Err(guard.fail(e)),
        }
    }
}

/// Held while an action is submitting; dropping it unfinished returns to idle
pub struct SubmittingGuard<'a> {
    slot: &'a ActionSlot,
    kind: ActionKind,
    finished: bool,
}

impl SubmittingGuard<'_> {
    pub fn succeed(mut self) {
        self.finished = true;
        *self.slot.state.lock() = ActionState::Idle;
    }

    /// Record the failure and hand the error back
    pub fn fail(mut self, error: DexError) -> DexError {
        self.finished = true;
        *self.slot.state.lock() = ActionState::Failed {
            kind: self.kind,
            error: error.clone(),
        };
        error
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.slot.state.lock() = ActionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_action_is_rejected_without_touching_state() {
        let slot = ActionSlot::new();
        let guard = slot.begin(ActionKind::Approve(Asset::Base)).unwrap();

        let err = slot.begin(ActionKind::Swap).err().unwrap();
        assert_eq!(
            err,
            DexError::ActionInProgress {
                action: "approve BASE".to_string()
            }
        );
        assert_eq!(
            slot.state(),
            ActionState::Submitting(ActionKind::Approve(Asset::Base))
        );

        guard.succeed();
        assert_eq!(slot.state(), ActionState::Idle);
    }

    #[test]
    fn test_failure_then_clear() {
        let slot = ActionSlot::new();
        let err = slot.begin(ActionKind::Swap).unwrap().fail(DexError::UserRejected);
        assert_eq!(err, DexError::UserRejected);
        assert_eq!(
            slot.state(),
            ActionState::Failed {
                kind: ActionKind::Swap,
                error: DexError::UserRejected
            }
        );

        // Failed behaves as idle
        assert!(slot.begin(ActionKind::Withdraw).is_ok());
        assert_eq!(slot.state(), ActionState::Idle);

        slot.begin(ActionKind::Deposit).unwrap().fail(DexError::network("down"));
        slot.clear_failure();
        assert_eq!(slot.state(), ActionState::Idle);
    }

    #[test]
    fn test_dropped_guard_returns_to_idle() {
        let slot = ActionSlot::new();
        {
            let _guard = slot.begin(ActionKind::Deposit).unwrap();
            assert!(slot.state().is_submitting());
        }
        assert_eq!(slot.state(), ActionState::Idle);
    }

    #[tokio::test]
    async fn test_run_records_outcome() {
        let slot = ActionSlot::new();

        let value = slot.run(ActionKind::Swap, async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(slot.state(), ActionState::Idle);

        let result: Result<(), DexError> = slot
            .run(ActionKind::Withdraw, async { Err(DexError::reverted("no liquidity")) })
            .await;
        assert!(result.is_err());
        assert!(matches!(
            slot.state(),
            ActionState::Failed {
                kind: ActionKind::Withdraw,
                ..
            }
        ));
    }
}
