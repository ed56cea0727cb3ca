pub mod app;
pub mod cache;
pub mod cmr;
pub mod config;
pub mod curl;
pub mod domain;
pub mod error;
pub mod events;
pub mod naming;
pub mod output;
pub mod retrieval;
pub mod search;
pub mod store;
pub mod walker;
