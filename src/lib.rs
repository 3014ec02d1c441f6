//! Job Tracker — personal job-application records in a single JSON file.

pub mod config;
pub mod error;
pub mod jobs;
pub mod menu;
