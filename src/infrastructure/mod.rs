//! Infrastructure layer - chain node access

pub mod chain;
