//! Match highlighting and navigation for paginated documents.
//!
//! Given a document's page texts and a search result set, pagemark locates
//! query matches on each page, renders them as safe markup with an active
//! marker, and lets the user walk matches within a page and across pages.

pub mod cli;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod export;
pub mod keyboard;
pub mod locate;
pub mod logging;
pub mod markup;
pub mod navigation;
pub mod normalize;
pub mod pattern;
pub mod render;
pub mod results;
pub mod search;
pub mod span;
pub mod theme;
pub mod tui;
pub mod watcher;
