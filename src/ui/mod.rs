//! Console presentation: menu decoding and text panels.

pub mod menu;
pub mod panels;
