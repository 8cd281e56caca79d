//! Append-only record of what a run did.

use serde::Serialize;

use crate::Time;

/// Kind of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A defender pre-committed its next move (value: charged index + 1, or 0
    /// for the fast move).
    Announce,
    /// A combatant became free to act.
    Free,
    /// A fast move started.
    Fast,
    /// A charged move started (value: charged index).
    Charged,
    /// Damage landed (value: amount).
    Damage,
    /// A dodge started.
    Dodge,
    /// Background damage landed (value: amount).
    BackgroundDps,
    /// A move's stage effect activated.
    Effect,
    /// A combatant entered the field (value: party member index).
    Enter,
    /// A combatant left the field (value: party member index).
    Exit,
    /// A PvP shield absorbed a charged hit.
    Shield,
}

/// One timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    /// When it happened.
    pub time: Time,
    /// What happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Player (PvE) or side (PvP) index.
    pub player: usize,
    /// Kind-specific value.
    pub value: i64,
}

/// Timeline collector. Recording is skipped entirely when disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    enabled: bool,
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Creates a collector.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    /// Records an entry if enabled.
    pub fn push(&mut self, time: Time, kind: EventKind, player: usize, value: i64) {
        if self.enabled {
            self.events.push(TimelineEvent {
                time,
                kind,
                player,
                value,
            });
        }
    }

    /// Returns the entries, stably sorted by time.
    #[must_use]
    pub fn finish(mut self) -> Vec<TimelineEvent> {
        self.events.sort_by_key(|e| e.time);
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timeline_records_nothing() {
        let mut log = Timeline::new(false);
        log.push(0, EventKind::Enter, 0, 0);
        assert!(log.finish().is_empty());
    }

    #[test]
    fn finish_sorts_stably() {
        let mut log = Timeline::new(true);
        log.push(500, EventKind::Damage, 0, 6);
        log.push(0, EventKind::Fast, 0, 0);
        log.push(500, EventKind::Damage, 1, 3);
        let events = log.finish();
        assert_eq!(events[0].kind, EventKind::Fast);
        assert_eq!(events[1].player, 0);
        assert_eq!(events[2].player, 1);
    }
}
