//! Decisions produced by strategies.

use serde::Serialize;

use crate::Time;

/// What a combatant decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// No decision yet.
    #[default]
    None,
    /// Stay idle until something happens.
    Wait,
    /// Use the fast move.
    Fast,
    /// Use a charged move (`value` selects which).
    Charged,
    /// Dodge after `delay`.
    Dodge,
    /// Switch to a party member (`value` selects which).
    Switch,
}

/// A committed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Action {
    /// Kind of action.
    pub kind: ActionKind,
    /// Charged move index or party member index.
    pub value: usize,
    /// Delay before the action starts.
    pub delay: Time,
    /// When the action was issued; set by the scheduler.
    pub time: Time,
}

impl Action {
    /// Use the fast move.
    #[must_use]
    pub const fn fast() -> Self {
        Self::of(ActionKind::Fast, 0, 0)
    }

    /// Use charged move `index`.
    #[must_use]
    pub const fn charged(index: usize) -> Self {
        Self::of(ActionKind::Charged, index, 0)
    }

    /// Dodge after `delay` milliseconds.
    #[must_use]
    pub const fn dodge(delay: Time) -> Self {
        Self::of(ActionKind::Dodge, 0, delay)
    }

    /// Wait for the next trigger.
    #[must_use]
    pub const fn wait() -> Self {
        Self::of(ActionKind::Wait, 0, 0)
    }

    /// Switch to party member `index`.
    #[must_use]
    pub const fn switch(index: usize) -> Self {
        Self::of(ActionKind::Switch, index, 0)
    }

    const fn of(kind: ActionKind, value: usize, delay: Time) -> Self {
        Self {
            kind,
            value,
            delay,
            time: 0,
        }
    }

    /// Same action, stamped with the time it was issued.
    #[must_use]
    pub const fn at(mut self, time: Time) -> Self {
        self.time = time;
        self
    }

    /// Returns `true` for fast and charged moves.
    #[must_use]
    pub const fn is_attack(&self) -> bool {
        matches!(self.kind, ActionKind::Fast | ActionKind::Charged)
    }
}
