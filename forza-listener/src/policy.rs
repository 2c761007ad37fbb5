//! Race-aware forwarding policy.
//!
//! | mode   | admitted | race active | action                                    |
//! |--------|----------|-------------|-------------------------------------------|
//! | always | yes      | -           | forward                                   |
//! | always | no       | -           | drop                                      |
//! | race   | yes      | yes         | forward, count (enter/progress events)    |
//! | race   | yes      | no          | drop, reset count (left event if counted) |
//! | race   | no       | -           | drop, no state change                     |

use std::fmt;

use clap::ValueEnum;

/// A progress event fires every this many packets forwarded in one race.
pub const PROGRESS_EVERY: u64 = 60;

/// When records are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Forward every admitted packet, regardless of race state.
    #[default]
    Always,
    /// Forward admitted packets only while a race is active.
    Race,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Always => "always",
            Mode::Race => "race",
        })
    }
}

/// Whether a record goes to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Drop,
}

/// Race state transitions worth logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceEvent {
    /// First packet forwarded in a race.
    Entered,
    /// Forwarded-packet count reached a multiple of `PROGRESS_EVERY`.
    Progress(u64),
    /// Race ended after at least one forwarded packet.
    Left,
}

/// Outcome of evaluating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub event: Option<RaceEvent>,
}

impl Verdict {
    fn forward(event: Option<RaceEvent>) -> Self {
        Self {
            decision: Decision::Forward,
            event,
        }
    }

    fn drop(event: Option<RaceEvent>) -> Self {
        Self {
            decision: Decision::Drop,
            event,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.decision == Decision::Forward
    }
}

/// Forwarding policy with its race packet counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingPolicy {
    mode: Mode,
    packets_in_race: u64,
}

impl ForwardingPolicy {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            packets_in_race: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Packets forwarded since the current race started (race mode only).
    pub fn packets_in_race(&self) -> u64 {
        self.packets_in_race
    }

    /// Evaluate one tick.
    ///
    /// The race flag is only consulted for admitted ticks in race mode.
    pub fn evaluate(&mut self, admitted: bool, race_active: bool) -> Verdict {
        if !admitted {
            return Verdict::drop(None);
        }

        match self.mode {
            Mode::Always => Verdict::forward(None),
            Mode::Race if race_active => {
                let entered = self.packets_in_race == 0;
                self.packets_in_race += 1;

                let event = if entered {
                    Some(RaceEvent::Entered)
                } else if self.packets_in_race % PROGRESS_EVERY == 0 {
                    Some(RaceEvent::Progress(self.packets_in_race))
                } else {
                    None
                };
                Verdict::forward(event)
            }
            Mode::Race => {
                let event = (self.packets_in_race > 0).then_some(RaceEvent::Left);
                self.packets_in_race = 0;
                Verdict::drop(event)
            }
        }
    }
}
