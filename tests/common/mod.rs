//! Shared test fixtures (used by unit and proptest).
#![allow(dead_code)]

pub mod fixtures;
