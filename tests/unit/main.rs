// tests/unit/main.rs
//! Integration tests for the Plasma root chain


mod exit_test;
mod finalization_test;
