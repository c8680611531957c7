pub mod cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod paths;
pub mod presentation;
pub mod repo_status;
pub mod scan;
pub mod workspace;
