#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate lazy_static;

pub mod browser_controller;
pub mod crawler;
pub mod extractor;
pub mod runner;
pub mod scroll;
pub mod sink;
pub mod types;
pub mod utils;
