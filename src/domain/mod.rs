//! Gateway business logic: sessions, generation and local tools

pub mod calculator;
pub mod generation;
pub mod sessions;
pub mod tools;
