//! Day and hour change detection

use crate::time::DateTime;

/// What changed since the previous observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RolloverChange {
    /// Calendar date changed
    pub day: bool,
    /// Hour changed; always set when `day` is
    pub hour: bool,
}

/// Remembers the last observed time
#[derive(Debug, Clone, Copy, Default)]
pub struct Rollover {
    last: Option<DateTime>,
}

impl Rollover {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Record `now` and report what changed; the first call reports nothing
    pub fn observe(&mut self, now: DateTime) -> RolloverChange {
        let change = match self.last {
            None => RolloverChange::default(),
            Some(last) => {
                let day = last.date() != now.date();
                RolloverChange {
                    day,
                    hour: day || last.hour != now.hour,
                }
            }
        };
        self.last = Some(now);
        change
    }

    pub fn last(&self) -> Option<DateTime> {
        self.last
    }
}
