//! Behavioural suites for the bridge.

mod support;
