pub mod calendar;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod logging;
pub mod pantry;
pub mod planner;
pub mod quantity;
pub mod recipe;
pub mod shopping;
pub mod storage;
