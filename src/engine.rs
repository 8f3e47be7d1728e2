use crate::grid::{Grid, SeatView};
use crate::roster::{Roster, Student, StudentStatus};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub roster: Roster,
    pub grid: Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropKind {
    Name,
    Seat,
}

/// What a drag gesture carried. For `Seat` drops `value` is informational and
/// `index` names the source seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    #[serde(rename = "type")]
    pub kind: DropKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub index: Option<usize>,
}

#[cfg(test)]
impl DropPayload {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            kind: DropKind::Name,
            value: value.into(),
            index: None,
        }
    }

    pub fn seat(from: usize) -> Self {
        Self {
            kind: DropKind::Seat,
            value: String::new(),
            index: Some(from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Randomize,
    Drop { payload: DropPayload, target: usize },
    Clear,
    ToggleLock { index: usize },
    ToggleEmpty { index: usize },
    ToggleStatus { name: String },
    Resize { rows: usize, cols: usize },
    MergeRoster { names: Vec<String> },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Randomize => "randomize",
            Command::Drop { .. } => "drop",
            Command::Clear => "clear",
            Command::ToggleLock { .. } => "toggle_lock",
            Command::ToggleEmpty { .. } => "toggle_empty",
            Command::ToggleStatus { .. } => "toggle_status",
            Command::Resize { .. } => "resize",
            Command::MergeRoster { .. } => "merge_roster",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: EngineState,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("seat {index} holds {name}, who is not on the roster")]
    UnknownOccupant { index: usize, name: String },
    #[error("seat {index} holds skipped student {name}")]
    SkippedSeated { index: usize, name: String },
    #[error("locked student {name} is not in a locked seat")]
    LockWithoutLockedSeat { name: String },
    #[error("locked seat {index} holds {name}, whose status is {status}")]
    LockedSeatWrongStatus {
        index: usize,
        name: String,
        status: &'static str,
    },
    #[error("empty seat {index} holds {name}")]
    EmptySeatOccupied { index: usize, name: String },
    #[error("{name} is placed in seats {first} and {second}")]
    DuplicatePlacement {
        name: String,
        first: usize,
        second: usize,
    },
    #[error("{name} has status {status} but placement implies {expected}")]
    StatusMismatch {
        name: String,
        status: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub rows: usize,
    pub cols: usize,
    pub students: &'a [Student],
    pub seats: Vec<SeatView<'a>>,
}

/// Runs one command against a snapshot and returns the replacement.
/// Ignored commands come back with `changed == false` and an identical state.
pub fn apply<R>(state: &EngineState, command: Command, rng: &mut R) -> Outcome
where
    R: Rng + ?Sized,
{
    let next = match command {
        Command::Randomize => Some(state.randomize(rng)),
        Command::Drop { payload, target } => state.handle_drop(&payload, target),
        Command::Clear => Some(state.clear_seats()),
        Command::ToggleLock { index } => state.toggle_seat_lock(index),
        Command::ToggleEmpty { index } => state.toggle_seat_empty(index),
        Command::ToggleStatus { name } => state.toggle_status(&name),
        Command::Resize { rows, cols } => Some(state.resize(rows, cols)),
        Command::MergeRoster { names } => Some(state.merge_roster(&names)),
    };
    match next {
        Some(next) => {
            let changed = next != *state;
            Outcome {
                state: next,
                changed,
            }
        }
        None => Outcome {
            state: state.clone(),
            changed: false,
        },
    }
}

impl EngineState {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            roster: Roster::default(),
            grid: Grid::new(rows, cols),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            students: self.roster.students(),
            seats: self.grid.views(),
        }
    }

    /// Status a non-skipped student should have given where the grid puts them.
    pub fn derive_status(&self, name: &str) -> Option<StudentStatus> {
        let current = self.roster.status_of(name)?;
        if current == StudentStatus::Skip {
            return Some(current);
        }
        let status = match self.grid.seat_of(name).and_then(|i| self.grid.seat(i)) {
            Some(seat) if seat.locked => StudentStatus::Lock,
            Some(_) => StudentStatus::Assigned,
            None => StudentStatus::Unassigned,
        };
        Some(status)
    }

    /// Shuffles every unassigned/assigned student over the open seats.
    /// Locked and skipped students are never moved.
    pub fn randomize<R>(&self, rng: &mut R) -> EngineState
    where
        R: Rng + ?Sized,
    {
        let open = self.grid.open_seats();
        let mut pool: Vec<String> = self
            .roster
            .students()
            .iter()
            .filter(|s| s.status.is_shuffleable())
            .map(|s| s.name.clone())
            .collect();
        pool.shuffle(rng);

        let mut grid = self.grid.clone();
        for (k, index) in open.into_iter().enumerate() {
            if let Some(seat) = grid.seat_mut(index) {
                seat.occupant = pool.get(k).cloned();
            }
        }

        let roster = self.roster.map_status(|s| match s.status {
            StudentStatus::Lock | StudentStatus::Skip => s.status,
            _ if grid.is_seated(&s.name) => StudentStatus::Assigned,
            _ => StudentStatus::Unassigned,
        });
        EngineState { roster, grid }
    }

    /// Returns `None` when the drop is ignored.
    pub fn handle_drop(&self, payload: &DropPayload, target: usize) -> Option<EngineState> {
        let target_seat = self.grid.seat(target)?;
        if target_seat.empty {
            return None;
        }
        match payload.kind {
            DropKind::Name => self.drop_name(&payload.value, target),
            DropKind::Seat => self.swap_seats(payload.index?, target),
        }
    }

    fn drop_name(&self, name: &str, target: usize) -> Option<EngineState> {
        let student = self.roster.get(name)?;
        if student.status == StudentStatus::Skip {
            return None;
        }

        let displaced = self.grid.seat(target)?.occupant.clone();
        // One seat per student: leave the previous seat first.
        let mut grid = self.grid.vacate(name);
        let seat = grid.seat_mut(target)?;
        seat.occupant = Some(name.to_string());
        let placed = if seat.locked {
            StudentStatus::Lock
        } else {
            StudentStatus::Assigned
        };

        let roster = self.roster.map_status(|s| {
            if s.name == name {
                placed
            } else if displaced.as_deref() == Some(s.name.as_str()) {
                StudentStatus::Unassigned
            } else {
                s.status
            }
        });
        Some(EngineState { roster, grid })
    }

    fn swap_seats(&self, from: usize, target: usize) -> Option<EngineState> {
        if from == target {
            return None;
        }
        let source = self.grid.seat(from)?;
        if source.empty {
            return None;
        }

        let mut grid = self.grid.clone();
        let moving = source.occupant.clone();
        let resident = grid.seat(target)?.occupant.clone();
        grid.seat_mut(target)?.occupant = moving;
        grid.seat_mut(from)?.occupant = resident;

        let mut placed: HashMap<String, StudentStatus> = HashMap::new();
        for index in [from, target] {
            let Some(seat) = grid.seat(index) else {
                continue;
            };
            if let Some(name) = seat.occupant.as_ref() {
                let status = if seat.locked {
                    StudentStatus::Lock
                } else {
                    StudentStatus::Assigned
                };
                placed.insert(name.clone(), status);
            }
        }

        let roster = self
            .roster
            .map_status(|s| placed.get(&s.name).copied().unwrap_or(s.status));
        Some(EngineState { roster, grid })
    }

    /// Empties every unlocked seat. Locked seats keep their occupant.
    pub fn clear_seats(&self) -> EngineState {
        let mut grid = self.grid.clone();
        for index in 0..grid.len() {
            if let Some(seat) = grid.seat_mut(index) {
                if !seat.locked {
                    seat.occupant = None;
                }
            }
        }
        let roster = self.roster.map_status(|s| {
            if s.status == StudentStatus::Assigned && !grid.is_seated(&s.name) {
                StudentStatus::Unassigned
            } else {
                s.status
            }
        });
        EngineState { roster, grid }
    }

    /// Status follow-up for a student whose seat just had its lock flipped.
    pub fn lock_toggle(&self, name: &str, locked: bool) -> EngineState {
        let status = if locked {
            StudentStatus::Lock
        } else {
            StudentStatus::Assigned
        };
        EngineState {
            roster: self.roster.set_status(name, status),
            grid: self.grid.clone(),
        }
    }

    pub fn toggle_seat_lock(&self, index: usize) -> Option<EngineState> {
        self.grid.seat(index)?;
        let grid = self.grid.toggle_lock(index);
        let seat = grid.seat(index)?;
        let next = EngineState {
            roster: self.roster.clone(),
            grid: grid.clone(),
        };
        Some(match seat.occupant.as_deref() {
            Some(name) => next.lock_toggle(name, seat.locked),
            None => next,
        })
    }

    pub fn toggle_seat_empty(&self, index: usize) -> Option<EngineState> {
        let displaced = self.grid.seat(index)?.occupant.clone();
        let grid = self.grid.toggle_empty(index);
        let roster = match displaced {
            Some(name) if !grid.is_seated(&name) => {
                self.roster.set_status(&name, StudentStatus::Unassigned)
            }
            _ => self.roster.clone(),
        };
        Some(EngineState { roster, grid })
    }

    /// unassigned <-> skip; seated students are forced to skip and unseated.
    pub fn toggle_status(&self, name: &str) -> Option<EngineState> {
        if !self.roster.contains(name) {
            return None;
        }
        let (roster, removed) = self.roster.toggle_status(name);
        let grid = if removed {
            self.grid.vacate(name)
        } else {
            self.grid.clone()
        };
        Some(EngineState { roster, grid })
    }

    /// Rebuilds the grid; nobody stays seated, skipped students stay skipped.
    pub fn resize(&self, rows: usize, cols: usize) -> EngineState {
        let roster = self.roster.map_status(|s| match s.status {
            StudentStatus::Skip => StudentStatus::Skip,
            _ => StudentStatus::Unassigned,
        });
        EngineState {
            roster,
            grid: Grid::new(rows, cols),
        }
    }

    /// Replace-merges the roster and vacates seats of students who left it.
    pub fn merge_roster<S>(&self, names: &[S]) -> EngineState
    where
        S: AsRef<str>,
    {
        let roster = self.roster.merge_names(names.iter().map(|n| n.as_ref()));
        let mut grid = self.grid.clone();
        for index in 0..grid.len() {
            if let Some(seat) = grid.seat_mut(index) {
                let gone = seat
                    .occupant
                    .as_deref()
                    .is_some_and(|name| !roster.contains(name));
                if gone {
                    seat.occupant = None;
                }
            }
        }
        let merged = EngineState { roster, grid };
        let roster = merged
            .roster
            .map_status(|s| merged.derive_status(&s.name).unwrap_or(s.status));
        EngineState {
            roster,
            grid: merged.grid,
        }
    }

    pub fn check_invariants(&self) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();

        for (index, seat) in self.grid.seats().iter().enumerate() {
            let Some(name) = seat.occupant.as_deref() else {
                continue;
            };
            if seat.empty {
                violations.push(InvariantViolation::EmptySeatOccupied {
                    index,
                    name: name.to_string(),
                });
            }
            if let Some(first) = first_seen.insert(name, index) {
                violations.push(InvariantViolation::DuplicatePlacement {
                    name: name.to_string(),
                    first,
                    second: index,
                });
            }
            match self.roster.status_of(name) {
                None => violations.push(InvariantViolation::UnknownOccupant {
                    index,
                    name: name.to_string(),
                }),
                Some(StudentStatus::Skip) => {
                    violations.push(InvariantViolation::SkippedSeated {
                        index,
                        name: name.to_string(),
                    })
                }
                Some(status) if seat.locked && status != StudentStatus::Lock => {
                    violations.push(InvariantViolation::LockedSeatWrongStatus {
                        index,
                        name: name.to_string(),
                        status: status.as_str(),
                    })
                }
                Some(_) => {}
            }
        }

        for student in self.roster.students() {
            if student.status == StudentStatus::Lock {
                let in_locked = self
                    .grid
                    .seat_of(&student.name)
                    .and_then(|i| self.grid.seat(i))
                    .is_some_and(|seat| seat.locked);
                if !in_locked {
                    violations.push(InvariantViolation::LockWithoutLockedSeat {
                        name: student.name.clone(),
                    });
                    continue;
                }
            }
            if let Some(expected) = self.derive_status(&student.name) {
                if expected != student.status {
                    violations.push(InvariantViolation::StatusMismatch {
                        name: student.name.clone(),
                        status: student.status.as_str(),
                        expected: expected.as_str(),
                    });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
