//! Transcode command planning
//!
//! Turns a container's final selection and subtitle list into the exact
//! ffmpeg argument vector for one job.

pub mod command;

pub use command::CommandBuilder;
