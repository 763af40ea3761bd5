//! Parse `minicraft.properties` files.

use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader};
use std::num::ParseIntError;
use std::path::Path;

macro_rules! parse {
    ($value:ident, String) => {
        $value.to_string()
    };
    ($value:ident, u16) => {
        $value.parse().map_err(|_: ParseIntError| io::Error::new(io::ErrorKind::InvalidInput, "invalid u16 value"))?
    };
    ($value:ident, u32) => {
        $value.parse().map_err(|_: ParseIntError| io::Error::new(io::ErrorKind::InvalidInput, "invalid u32 value"))?
    };
    ($value:ident, i32) => {
        $value.parse().map_err(|_: ParseIntError| io::Error::new(io::ErrorKind::InvalidInput, "invalid i32 value"))?
    };
}

macro_rules! server_properties_impl {
    ($({ $field:ident, $key:expr, $fty:ident, $default:expr })+) => {
        /// Runtime configuration for a `mcplus_server` instance.
        ///
        /// Documented defaults live next to each field below; an absent
        /// `minicraft.properties` file is not an error, only an unrecognized
        /// key inside one that does exist is.
        #[derive(Debug, Clone, PartialEq)]
        pub struct ServerConfig {
            $(pub $field: $fty),*
        }

        impl ServerConfig {
            pub fn default() -> ServerConfig {
                ServerConfig {
                    $($field: $default),*
                }
            }

            /// Load and parse a `minicraft.properties` file from `path`.
            pub fn load(path: &Path) -> io::Result<ServerConfig> {
                let mut cfg = ServerConfig::default();
                let file = File::open(path)?;
                let file = BufReader::new(file);
                for line in file.lines() {
                    let line = line?;
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let mut parts = line.splitn(2, '=');
                    let key = parts.next().unwrap_or("").trim();
                    let value = parts.next().unwrap_or("").trim();
                    match key {
                        $($key => cfg.$field = parse!(value, $fty),)*
                        other => log::warn!("ignoring unknown config key {:?}", other),
                    }
                }
                Ok(cfg)
            }

            /// Load `path` if it exists, otherwise fall back to [`ServerConfig::default`].
            pub fn load_or_default(path: &Path) -> io::Result<ServerConfig> {
                if path.exists() {
                    ServerConfig::load(path)
                } else {
                    Ok(ServerConfig::default())
                }
            }
        }

    }
}

server_properties_impl! {
    { listen_address, "server-ip", String, "127.0.0.1".to_string() }
    { listen_port, "server-port", u16, 4225 }
    { bad_packet_limit, "bad-packet-limit", u32, 15 }
    { tick_rate_hz, "tick-rate", u32, 60 }
    { accept_backlog, "accept-backlog", i32, 100 }
}
