//! Page Assistant - in-page documentation chat widget
//!
//! A chat panel mounted on a documentation page. It submits the page URL to
//! the assistant backend for indexing, then lets the user question the page
//! in a running conversation inside a movable, collapsible panel.

pub mod config;
pub mod conversation;
pub mod host;
pub mod render;
pub mod transport;
pub mod widget;
