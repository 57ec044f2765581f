pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod layout;
pub mod mirror;
pub mod output;
pub mod transfer;
