//! Integration tests for picsync-engine
//!
//! Drives the real reconciler, builder, queue, executor, and coordinator
//! against a temporary directory tree and an in-memory album service;
//! verifies full reconcile / select / run / stop cycles end to end.

mod common;

mod test_cancellation;
mod test_executor;
mod test_sync_cycle;
