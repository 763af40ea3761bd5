//! `mcplus_server` entry point: load configuration, start the server loop,
//! and read admin commands from stdin until `stop` (or EOF) shuts it down.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use mcplus_server::commands::{CommandTable, run_stdin_loop};
use mcplus_server::config::ServerConfig;
use mcplus_server::server::Server;

fn main() -> ExitCode {
    env_logger::init();

    let config = match ServerConfig::load_or_default(Path::new("minicraft.properties")) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load minicraft.properties: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = Arc::new(Server::new(config));
    let table = CommandTable::default_table();

    let stdin_server = Arc::clone(&server);
    thread::spawn(move || run_stdin_loop(&stdin_server, &table));

    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
