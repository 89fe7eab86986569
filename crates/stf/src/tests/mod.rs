//! Scenario tests for transitions, batch execution and disputes.

mod burn;
mod executor;
