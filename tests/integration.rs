//! End-to-end scenarios (§8) exercised against a real loopback `TcpListener`,
//! plus the framing law and bad-packet threshold at the socket level.
//! Packet-level round-trip and tag-stability tests live next to each packet
//! variant in `src/packet/mod.rs`; this file is the only place a `Session`
//! is driven over an actual socket rather than an in-memory duplex.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mcplus_server::config::ServerConfig;
use mcplus_server::frame::{read_frame, write_frame, RawPacket};
use mcplus_server::server::Server;

/// Starts a server on an OS-assigned loopback port and returns it already
/// running in the background, together with that port. Dropping the
/// returned `Arc<Server>` does not stop it; call `shutdown()` explicitly.
fn spawn_server() -> (Arc<Server>, u16) {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let config = ServerConfig { listen_address: "127.0.0.1".to_string(), listen_port: port, ..ServerConfig::default() };
    let server = Arc::new(Server::new(config));
    let run_server = Arc::clone(&server);
    thread::spawn(move || run_server.run());

    // Wait for the accept thread to actually be listening.
    for _ in 0..200 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return (server, port);
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("server never started listening on port {}", port);
}

fn connect(port: u16) -> TcpStream {
    let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream
}

#[test]
fn handshake_scenario_over_a_real_socket() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x04, "alice;2.0.6")).unwrap();

    let player = read_frame(&mut stream).unwrap();
    assert_eq!(player.tag, 0x0C);
    assert!(player.payload.starts_with("2.0.6\n0,0,0,0,10,10,0,0,NULL,0,0"));

    let init = read_frame(&mut stream).unwrap();
    assert_eq!(init.tag, 0x06);
    assert_eq!(init.payload, "12,128,128,0,0,0");

    server.shutdown();
}

#[test]
fn load_scenario_over_a_real_socket() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x04, "bob;2.0.6")).unwrap();
    read_frame(&mut stream).unwrap(); // Player
    read_frame(&mut stream).unwrap(); // Init

    write_frame(&mut stream, &RawPacket::new(0x07, "0")).unwrap();

    let tiles = read_frame(&mut stream).unwrap();
    assert_eq!(tiles.tag, 0x08);
    assert_eq!(tiles.payload.split(',').count(), 128 * 128 * 2);

    let entities = read_frame(&mut stream).unwrap();
    assert_eq!(entities.tag, 0x09);
    assert_eq!(entities.payload, "");

    let game = read_frame(&mut stream).unwrap();
    assert_eq!(game.tag, 0x05);
    assert_eq!(game.payload, "survival;6000;1;true;10;1;1");

    server.shutdown();
}

#[test]
fn move_after_load_is_accepted_without_a_reply() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x04, "carol;2.0.6")).unwrap();
    read_frame(&mut stream).unwrap();
    read_frame(&mut stream).unwrap();
    write_frame(&mut stream, &RawPacket::new(0x07, "0")).unwrap();
    read_frame(&mut stream).unwrap();
    read_frame(&mut stream).unwrap();
    read_frame(&mut stream).unwrap();

    write_frame(&mut stream, &RawPacket::new(0x0D, "16;32;4;0")).unwrap();

    // Follow it with a Ping, which also draws no reply; a Disconnect closes
    // the connection cleanly, proving the Move above didn't wedge the
    // session or trip the bad-packet counter.
    write_frame(&mut stream, &RawPacket::new(0x02, "auto")).unwrap();
    write_frame(&mut stream, &RawPacket::new(0x10, "")).unwrap();

    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).unwrap(), 0, "session should close with no further bytes");

    server.shutdown();
}

#[test]
fn invalid_flood_scenario_over_a_real_socket() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    for _ in 0..16 {
        write_frame(&mut stream, &RawPacket::new(0x03, "")).unwrap();
    }

    let invalid = read_frame(&mut stream).unwrap();
    assert_eq!(invalid.tag, 0x01);
    assert_eq!(invalid.payload, "Many bad packets");

    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).unwrap(), 0, "connection should be closed after the flood");

    server.shutdown();
}

#[test]
fn ping_scenario_draws_no_reply_and_does_not_count_as_bad() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x02, "auto")).unwrap();

    // No response is expected; confirm the connection is still alive by
    // immediately following up with a clean Disconnect.
    write_frame(&mut stream, &RawPacket::new(0x10, "")).unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).unwrap(), 0);

    server.shutdown();
}

#[test]
fn disconnect_scenario_closes_without_further_packets() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x10, "")).unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    assert!(buf.is_empty());

    server.shutdown();
}

#[test]
fn framing_law_holds_for_a_mixed_sequence_written_in_one_go() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    write_frame(&mut stream, &RawPacket::new(0x04, "dana;2.0.6")).unwrap();
    write_frame(&mut stream, &RawPacket::new(0x07, "0")).unwrap();

    let frames = [
        read_frame(&mut stream).unwrap(), // Player
        read_frame(&mut stream).unwrap(), // Init
        read_frame(&mut stream).unwrap(), // Tiles
        read_frame(&mut stream).unwrap(), // Entities
        read_frame(&mut stream).unwrap(), // Game
    ];
    assert_eq!(frames.iter().map(|f| f.tag).collect::<Vec<_>>(), vec![0x0C, 0x06, 0x08, 0x09, 0x05]);

    server.shutdown();
}

#[test]
fn unauthenticated_connection_rejects_gameplay_packets_as_bad() {
    let (server, port) = spawn_server();
    let mut stream = connect(port);

    // Move before Login/Load: 15 of these must not trip the threshold, the
    // 16th does.
    for _ in 0..15 {
        write_frame(&mut stream, &RawPacket::new(0x0D, "0;0;0;0")).unwrap();
    }
    write_frame(&mut stream, &RawPacket::new(0x02, "auto")).unwrap();
    write_frame(&mut stream, &RawPacket::new(0x0D, "0;0;0;0")).unwrap();

    let mut buf = [0u8; 1];
    stream.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    assert!(stream.read(&mut buf).is_err(), "no reply expected yet; counter should have reset on the Ping");

    server.shutdown();
}
