use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Unassigned,
    Assigned,
    Lock,
    Skip,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Unassigned => "unassigned",
            StudentStatus::Assigned => "assigned",
            StudentStatus::Lock => "lock",
            StudentStatus::Skip => "skip",
        }
    }

    /// Students the randomizer is allowed to move.
    pub fn is_shuffleable(self) -> bool {
        matches!(self, StudentStatus::Unassigned | StudentStatus::Assigned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub name: String,
    pub status: StudentStatus,
}

impl Student {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StudentStatus::Unassigned,
        }
    }
}

/// Ordered, name-keyed set of students. Every mutation returns a new roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn get(&self, name: &str) -> Option<&Student> {
        // Names are unique after a merge; if that ever breaks, the last entry wins.
        self.students.iter().rev().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn status_of(&self, name: &str) -> Option<StudentStatus> {
        self.get(name).map(|s| s.status)
    }

    /// Replace-merge: the result holds exactly the input names, in input order.
    /// Students already present keep their status; new names start unassigned.
    pub fn merge_names<I, S>(&self, names: I) -> Roster
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut students: Vec<Student> = Vec::new();
        for raw in names {
            let name = raw.as_ref();
            if name.is_empty() || !seen.insert(name.to_string()) {
                continue;
            }
            let student = match self.get(name) {
                Some(existing) => existing.clone(),
                None => Student::new(name),
            };
            students.push(student);
        }
        Roster { students }
    }

    pub fn set_status(&self, name: &str, status: StudentStatus) -> Roster {
        self.map_status(|s| if s.name == name { status } else { s.status })
    }

    /// Flips unassigned <-> skip. Seated students (assigned or lock) are forced
    /// to skip and the returned flag tells the caller to vacate their seat.
    pub fn toggle_status(&self, name: &str) -> (Roster, bool) {
        let Some(current) = self.status_of(name) else {
            return (self.clone(), false);
        };
        let (next, removed) = match current {
            StudentStatus::Unassigned => (StudentStatus::Skip, false),
            StudentStatus::Skip => (StudentStatus::Unassigned, false),
            StudentStatus::Assigned | StudentStatus::Lock => (StudentStatus::Skip, true),
        };
        (self.set_status(name, next), removed)
    }

    pub fn map_status<F>(&self, mut f: F) -> Roster
    where
        F: FnMut(&Student) -> StudentStatus,
    {
        let students = self
            .students
            .iter()
            .map(|s| Student {
                name: s.name.clone(),
                status: f(s),
            })
            .collect();
        Roster { students }
    }
}
