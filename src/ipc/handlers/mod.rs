pub mod core;
pub mod roster;
pub mod seating;
