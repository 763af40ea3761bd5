#![forbid(unused_variables)]

pub mod commands;
pub mod config;
pub mod error;
pub mod frame;
pub mod packet;
pub mod server;
pub mod session;
pub mod types;
pub mod world;
