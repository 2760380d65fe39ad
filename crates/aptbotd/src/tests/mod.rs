//! Behavioural suites for the relay daemon.

mod bootstrap_behaviour;
mod reload_behaviour;
mod support;
