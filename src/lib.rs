#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod config;
pub mod export_data;
pub mod geo;
pub mod journey;
pub mod logs;
pub mod place_search;
pub mod query_refine;
pub mod route_planner;
pub mod route_store;
pub mod session;
pub mod source;
pub mod tracker;
mod utils;
