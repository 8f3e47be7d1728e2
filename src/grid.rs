use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seat {
    pub occupant: Option<String>,
    pub locked: bool,
    /// Unusable seat. Never holds an occupant.
    pub empty: bool,
}

impl Seat {
    pub fn holds(&self, name: &str) -> bool {
        self.occupant.as_deref() == Some(name)
    }
}

/// Display form of one seat; `row`/`col` are one-indexed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView<'a> {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub label: String,
    pub occupant: Option<&'a str>,
    pub locked: bool,
    pub empty: bool,
}

/// Row-major seats, `rows * cols` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    seats: Vec<Seat>,
}

impl Grid {
    /// Callers guarantee `rows >= 1` and `cols >= 1`; the IPC layer rejects anything else.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            seats: vec![Seat::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, index: usize) -> Option<&Seat> {
        self.seats.get(index)
    }

    pub(crate) fn seat_mut(&mut self, index: usize) -> Option<&mut Seat> {
        self.seats.get_mut(index)
    }

    /// Zero-based (row, col) of a linear index.
    pub fn position(&self, index: usize) -> (usize, usize) {
        let cols = self.cols.max(1);
        (index / cols, index % cols)
    }

    pub fn label(&self, index: usize) -> String {
        let (row, col) = self.position(index);
        format!("{} - {}", row + 1, col + 1)
    }

    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.holds(name))
    }

    pub fn is_seated(&self, name: &str) -> bool {
        self.seat_of(name).is_some()
    }

    /// Indexes usable by the randomizer: neither locked nor empty.
    pub fn open_seats(&self) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.locked && !s.empty)
            .map(|(i, _)| i)
            .collect()
    }

    /// Flips `empty`. Going empty drops the occupant; the caller unassigns them.
    pub fn toggle_empty(&self, index: usize) -> Grid {
        let mut next = self.clone();
        if let Some(seat) = next.seat_mut(index) {
            seat.empty = !seat.empty;
            if seat.empty {
                seat.occupant = None;
            }
        }
        next
    }

    /// Flips `locked` without touching the occupant.
    pub fn toggle_lock(&self, index: usize) -> Grid {
        let mut next = self.clone();
        if let Some(seat) = next.seat_mut(index) {
            seat.locked = !seat.locked;
        }
        next
    }

    /// Clears every seat holding `name`.
    pub fn vacate(&self, name: &str) -> Grid {
        let mut next = self.clone();
        for seat in next.seats.iter_mut().filter(|s| s.holds(name)) {
            seat.occupant = None;
        }
        next
    }

    pub fn views(&self) -> Vec<SeatView<'_>> {
        self.seats
            .iter()
            .enumerate()
            .map(|(index, seat)| {
                let (row, col) = self.position(index);
                SeatView {
                    index,
                    row: row + 1,
                    col: col + 1,
                    label: self.label(index),
                    occupant: seat.occupant.as_deref(),
                    locked: seat.locked,
                    empty: seat.empty,
                }
            })
            .collect()
    }
}
