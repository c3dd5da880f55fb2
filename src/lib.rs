pub mod backend;
pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod masking;
pub mod output;
pub mod render;
pub mod report;
pub mod settings;
pub mod verbose;
