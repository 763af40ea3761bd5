//! Admin command channel (§4.6).
//!
//! The source keys a `std::unordered_map<std::string, shared_ptr<CommandExecutor>>`
//! built once by `defaultCommandMap()` (`Server.cpp`) and dispatches by
//! lowercasing the first whitespace-separated token. The crate keeps the same
//! shape as a `HashMap<String, Box<dyn Fn(...)>>` of boxed closures instead of
//! a trait-object command hierarchy (see design notes).

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crate::server::Server;

/// Receives one-line responses from a dispatched command.
///
/// The source's `Sender` interface has a single `sendMessage` method
/// implemented by `CommandSender`, which writes to stdout; this is that same
/// seam, generalized so tests can capture output instead of printing it.
pub trait Sender {
    fn send_message(&self, message: &str);
}

/// The CLI's sender: writes each response line to stdout, matching
/// `CommandSender::sendMessage` in the source.
pub struct StdoutSender;

impl Sender for StdoutSender {
    fn send_message(&self, message: &str) {
        println!("{}", message);
    }
}

type CommandFn = Box<dyn Fn(&Server, &dyn Sender, &[String]) + Send + Sync>;

/// `command name (lowercase) -> executor`, mirroring `defaultCommandMap()`.
pub struct CommandTable {
    commands: HashMap<String, CommandFn>,
}

impl CommandTable {
    /// Builds the built-in table: `stop` initiates shutdown, `ping` is a
    /// documented placeholder, matching the source's `StopCommand` and
    /// `PingCommand`.
    pub fn default_table() -> CommandTable {
        let mut commands: HashMap<String, CommandFn> = HashMap::new();
        commands.insert(
            "stop".to_string(),
            Box::new(|server: &Server, sender: &dyn Sender, _args: &[String]| {
                sender.send_message("Stopping server");
                server.shutdown();
            }),
        );
        commands.insert(
            "ping".to_string(),
            Box::new(|_server: &Server, sender: &dyn Sender, _args: &[String]| {
                sender.send_message("Not implemented yet :(");
            }),
        );
        CommandTable { commands }
    }

    /// Splits `line` on spaces, lowercases the first token, looks it up, and
    /// invokes the executor with the remaining arguments. Unknown commands
    /// produce one line back to `sender` rather than being silently dropped.
    pub fn dispatch(&self, server: &Server, sender: &dyn Sender, line: &str) {
        let mut parts = line.split(' ').filter(|s| !s.is_empty());
        let Some(name) = parts.next() else { return };
        let args: Vec<String> = parts.map(|s| s.to_string()).collect();

        match self.commands.get(&name.to_lowercase()) {
            Some(executor) => executor(server, sender, &args),
            None => sender.send_message(&format!("Unknown command: {}", name)),
        }
    }
}

impl Default for CommandTable {
    fn default() -> CommandTable {
        CommandTable::default_table()
    }
}

/// Reads stdin line-by-line, dispatching each non-empty line to `table`.
/// Intended to run on its own thread; returns once stdin is closed or the
/// server is no longer running.
pub fn run_stdin_loop(server: &Server, table: &CommandTable) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if !server.running.load(Ordering::SeqCst) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        table.dispatch(server, &StdoutSender, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingSender {
        lines: Mutex<Vec<String>>,
    }

    impl CapturingSender {
        fn new() -> CapturingSender {
            CapturingSender { lines: Mutex::new(Vec::new()) }
        }
    }

    impl Sender for CapturingSender {
        fn send_message(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn stop_flips_running_flag_and_replies() {
        let server = Server::for_tests();
        let table = CommandTable::default_table();
        let sender = CapturingSender::new();

        assert!(server.running.load(Ordering::SeqCst));
        table.dispatch(&server, &sender, "stop");
        assert!(!server.running.load(Ordering::SeqCst));
        assert_eq!(sender.lines.lock().unwrap().as_slice(), ["Stopping server"]);
    }

    #[test]
    fn command_lookup_is_case_insensitive() {
        let server = Server::for_tests();
        let table = CommandTable::default_table();
        let sender = CapturingSender::new();

        table.dispatch(&server, &sender, "STOP");
        assert!(!server.running.load(Ordering::SeqCst));
    }

    #[test]
    fn ping_is_a_documented_placeholder() {
        let server = Server::for_tests();
        let table = CommandTable::default_table();
        let sender = CapturingSender::new();

        table.dispatch(&server, &sender, "ping");
        assert_eq!(sender.lines.lock().unwrap().as_slice(), ["Not implemented yet :("]);
    }

    #[test]
    fn unknown_command_produces_one_line_and_does_not_panic() {
        let server = Server::for_tests();
        let table = CommandTable::default_table();
        let sender = CapturingSender::new();

        table.dispatch(&server, &sender, "frobnicate");
        assert_eq!(sender.lines.lock().unwrap().as_slice(), ["Unknown command: frobnicate"]);
    }

    #[test]
    fn empty_line_dispatches_nothing() {
        let server = Server::for_tests();
        let table = CommandTable::default_table();
        let sender = CapturingSender::new();

        table.dispatch(&server, &sender, "");
        assert!(sender.lines.lock().unwrap().is_empty());
    }
}
