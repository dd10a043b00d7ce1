// Library surface: the session engine and everything it needs, free of terminal I/O
// apart from the event plumbing in `runtime`. The binary adds rendering on top.
pub mod app_dirs;
pub mod challenge;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod results;
pub mod runtime;
pub mod scheduler;
