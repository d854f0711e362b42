//! Remote persistence for a node-graph/map dataset editor: asynchronous
//! remote operations over a bounded worker pool, a remote-store adapter that
//! classifies failures, and the snapshot manifest + version ledger protocol
//! that publishes a dataset as a coherent, nameable, retrievable unit.

pub mod credentials;
pub mod dataset;
pub mod error;
pub mod exec;
pub mod ledger;
pub mod manifest;
pub mod model;
pub mod remote;
