#![forbid(unsafe_code)]

pub mod content;
pub mod repository;
pub mod sqlite;
