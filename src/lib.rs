//! Roll-call vote extraction from city council meeting minutes.
//!
//! Page text comes in through [`pages::PageSource`]; [`parser::extract`]
//! picks the layout and turns the pages into [`model::VoteRecord`]s;
//! [`pipeline::process_document`] adds the CSV and SQLite outputs.

pub mod db;
pub mod error;
pub mod export;
pub mod model;
pub mod pages;
pub mod parser;
pub mod pipeline;
pub mod settings;
pub mod validate;
