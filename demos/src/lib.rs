//! Shared setup for the runnable votewatch demos.

pub mod common;
