//! Server loop: accept thread, tick thread, and a broadcast registry (§4.5).
//!
//! The source's `Server::run` (`Server.cpp`) spawns one `joinerThread` that
//! blocks on `acceptSock()` and starts a `PlayerSocket` per connection, and
//! drives a tick accumulator on the calling thread at a fixed 60Hz cadence
//! with a 2ms sleep between iterations. This reimplementation keeps that
//! exact shape: an accept thread, a tick thread, and a shared `running`
//! flag, built on `std::net`/`std::thread` rather than an async runtime (see
//! SPEC_FULL.md §5). Sessions are spawned as detached, `'static` threads
//! sharing an `Arc<Server>`, matching the source's one-thread-per-connection
//! model without requiring scoped-thread lifetimes.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ServerConfig;
use crate::packet::{self, Packet};
use crate::session::Session;
use crate::world::WorldStore;

/// A registered client's outbound half, kept around purely so the server can
/// broadcast to every connected client "in registration order" (§5); reads
/// happen exclusively on that client's own session thread.
struct RegisteredSession {
    id: u64,
    writer: Mutex<TcpStream>,
}

#[derive(Default)]
struct SessionRegistry {
    next_id: AtomicU64,
    sessions: Mutex<Vec<Arc<RegisteredSession>>>,
}

impl SessionRegistry {
    fn register(&self, stream: &TcpStream) -> io::Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let writer = stream.try_clone()?;
        self.sessions.lock().unwrap().push(Arc::new(RegisteredSession { id, writer: Mutex::new(writer) }));
        Ok(id)
    }

    fn unregister(&self, id: u64) {
        self.sessions.lock().unwrap().retain(|s| s.id != id);
    }

    /// Writes `packet` to every registered client in registration order. A
    /// write failure on one client is logged and does not prevent the others
    /// from receiving the broadcast.
    fn broadcast(&self, packet: &Packet) {
        let raw = packet::encode(packet);
        for registered in self.sessions.lock().unwrap().iter() {
            let mut stream = registered.writer.lock().unwrap();
            if let Err(e) = crate::frame::write_frame(&mut *stream, &raw) {
                log::warn!("broadcast to session {} failed: {}", registered.id, e);
            }
        }
    }
}

/// Top-level server state: configuration, the shared world store, the
/// running flag every thread watches, and the session registry.
pub struct Server {
    pub config: ServerConfig,
    pub running: AtomicBool,
    pub world_store: Arc<RwLock<WorldStore>>,
    sessions: SessionRegistry,
}

impl Server {
    pub fn new(config: ServerConfig) -> Server {
        Server {
            config,
            running: AtomicBool::new(false),
            world_store: Arc::new(RwLock::new(WorldStore::new())),
            sessions: SessionRegistry::default(),
        }
    }

    /// A server with the default configuration, already marked running, for
    /// use by command-table and other unit tests that never bind a socket.
    #[cfg(test)]
    pub fn for_tests() -> Server {
        let server = Server::new(ServerConfig::default());
        server.running.store(true, Ordering::SeqCst);
        server
    }

    pub fn addr(&self) -> &str {
        &self.config.listen_address
    }

    pub fn port(&self) -> u16 {
        self.config.listen_port
    }

    /// Broadcasts `packet` to every currently registered client.
    pub fn broadcast(&self, packet: &Packet) {
        self.sessions.broadcast(packet);
    }

    /// Binds the listener, spawns the accept and tick threads, and blocks on
    /// both until `shutdown()` unwinds them. Mirrors `Server::run` in the
    /// source, which detaches its accept thread and returns once the tick
    /// loop observes `running == false`.
    pub fn run(self: &Arc<Server>) -> io::Result<()> {
        let listener = TcpListener::bind((self.config.listen_address.as_str(), self.config.listen_port))?;
        log::info!("listening on {}:{}", self.config.listen_address, self.config.listen_port);
        self.running.store(true, Ordering::SeqCst);

        let accept_server = Arc::clone(self);
        let accept_handle = thread::spawn(move || accept_server.accept_loop(listener));

        let tick_server = Arc::clone(self);
        let tick_handle = thread::spawn(move || tick_server.tick_loop());

        let _ = accept_handle.join();
        let _ = tick_handle.join();
        Ok(())
    }

    fn accept_loop(self: Arc<Server>, listener: TcpListener) {
        log::info!("connection thread started");
        for incoming in listener.incoming() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            match incoming {
                Ok(stream) => Arc::clone(&self).spawn_session(stream),
                Err(e) => {
                    if self.running.load(Ordering::SeqCst) {
                        log::error!("accept error: {}", e);
                    } else {
                        break;
                    }
                }
            }
        }
    }

    fn spawn_session(self: Arc<Server>, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        log::info!("connected socket! {:?}", peer);

        let id = match self.sessions.register(&stream) {
            Ok(id) => id,
            Err(e) => {
                log::error!("failed to register session for {:?}: {}", peer, e);
                return;
            }
        };

        let world_store = Arc::clone(&self.world_store);
        let config = self.config.clone();
        thread::spawn(move || {
            let mut session = Session::new(stream, world_store, &config);
            if let Err(e) = session.run() {
                log::warn!("{:?} got disconnected: {}", peer, e);
            }
            self.sessions.unregister(id);
        });
    }

    fn tick_loop(self: Arc<Server>) {
        log::info!("main thread started");
        let tick_period_nanos = 1_000_000_000.0 / self.config.tick_rate_hz as f64;
        let mut last = Instant::now();
        let mut delta = 0.0f64;
        let mut ticks: u64 = 0;
        let mut window_start = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            delta += now.duration_since(last).as_nanos() as f64 / tick_period_nanos;
            last = now;

            while delta >= 1.0 {
                self.tick();
                ticks += 1;
                delta -= 1.0;
            }

            thread::sleep(Duration::from_millis(2));

            if now.duration_since(window_start) >= Duration::from_secs(1) {
                log::trace!("{} ticks/s", ticks);
                ticks = 0;
                window_start = now;
            }
        }
    }

    /// One simulation tick: the single point where entity lifecycle is
    /// reconciled. Entity AI and world generation are external collaborators
    /// (§1 Non-goals) invoked through this seam, not implemented here.
    fn tick(&self) {
        let mut store = self.world_store.write().unwrap();
        let world_ids: Vec<_> = store.world_ids().collect();
        for id in world_ids {
            if let Some(world) = store.world_mut(id) {
                for removed in world.drain_removed() {
                    self.sessions.broadcast(&Packet::Remove { entity: removed, world: Some(id) });
                }
            }
        }
    }

    /// Sets `running` to false and unblocks the accept thread's pending
    /// `accept()` call. The source closes the underlying listening socket to
    /// the same effect; `std::net::TcpListener` exposes no non-blocking
    /// close, so this connects a throwaway loopback socket instead, which is
    /// enough to make `accept()` return and observe `running == false`.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        log::info!("Shutdown!");
        let addr = format!("{}:{}", self.config.listen_address, self.config.listen_port);
        if let Ok(mut addrs) = std::net::ToSocketAddrs::to_socket_addrs(addr.as_str()) {
            if let Some(addr) = addrs.next() {
                let _ = TcpStream::connect_timeout(&addr, Duration::from_millis(200));
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}
