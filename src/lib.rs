//! AbuSim Agent
//!
//! A simulation agent that holds a typed resource memory, runs a rule
//! executer on a fixed tick and answers a single coordinator over a TCP
//! control channel for inspection and debugging.

pub mod agent;
pub mod cli;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod execution;
pub mod logging;
pub mod memory;
pub mod protocol;
