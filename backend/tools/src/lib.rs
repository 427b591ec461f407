//! Tool library for Parley.
//!
//! One tool is defined: `search_web`, a web search the model may request
//! mid-turn. Tool execution failures degrade to a readable placeholder so
//! the conversation keeps going.

pub mod search;

pub use search::SearchWebTool;
