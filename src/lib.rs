//! Headless clients for the bike finder pages: debounced search suggestions
//! and the wishlist toggle button.

pub mod backend;
pub mod config;
pub mod data_models;
pub mod debounce;
pub mod error;
pub mod page;
pub mod suggestions;
pub mod wishlist;
