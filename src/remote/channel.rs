//! SSH hop chain and SFTP file access.
//!
//! [`SecureChannel`] owns an ordered chain of authenticated SSH sessions.
//! Hop *i+1* authenticates over a forwarded stream opened through the already
//! authenticated hop *i* — it never opens a direct socket of its own — so a
//! single-hop and a double-hop deployment differ only in the length of the
//! hop list. The chain is modeled as uniform layers with three operations:
//! open (dial + handshake + authenticate), close, and derive the SFTP
//! transfer subsystem on the innermost layer.
//!
//! libssh2 sessions speak to a socket, not to an arbitrary byte stream, so a
//! nested hop is carried by a loopback relay: a `direct-tcpip` channel is
//! opened through the outer session and a small pump thread shuttles bytes
//! between that channel and a localhost socket the inner session dials. The
//! relay is transport plumbing only; it holds no session state.
//!
//! There is no automatic reconnection. Once a session breaks, every call
//! reports `Connect` until the caller rebuilds the channel.

use crate::error::{PickError, PickResult};
use crate::remote::RemoteStore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssh2::{ErrorCode, Session, Sftp};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// An opaque credential handle. The secret value never appears in `Debug`
/// output, logs, or serialized configuration.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

/// One hop of the chain: where to dial and how to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub secret: Secret,
}

impl RemoteEndpoint {
    fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One established transport segment. For nested hops the layer also owns the
/// relay that carries it.
struct HopLayer {
    session: Session,
    relay: Option<RelayGuard>,
    label: String,
}

impl HopLayer {
    /// Best-effort close. Disconnect the session first so the goodbye travels
    /// over a still-running relay, then stop the relay itself.
    fn close(mut self) {
        if let Err(e) = self.session.disconnect(None, "closing", None) {
            debug!(hop = %self.label, error = %e, "session disconnect failed");
        }
        if let Some(relay) = self.relay.take() {
            relay.stop();
        }
    }
}

/// Opens hop layers. The production opener dials real sockets; tests swap in
/// a recording opener to pin down failure ordering without a network.
pub(crate) trait HopOpener {
    type Layer;

    /// Opens the first hop with a direct socket.
    fn open_root(&self, endpoint: &RemoteEndpoint) -> PickResult<Self::Layer>;

    /// Opens a hop through the layer below it, never via a direct socket.
    fn open_via(&self, below: &mut Self::Layer, endpoint: &RemoteEndpoint)
        -> PickResult<Self::Layer>;
}

/// Walks the hop list in order, threading each new hop through the previous
/// layer. Establishment stops at the first failure, so a failed hop *i*
/// produces no hop *i+1* side effects.
pub(crate) fn open_chain<O: HopOpener>(
    opener: &O,
    hops: &[RemoteEndpoint],
) -> PickResult<Vec<O::Layer>> {
    let mut layers: Vec<O::Layer> = Vec::with_capacity(hops.len());
    for endpoint in hops {
        let layer = match layers.last_mut() {
            None => opener.open_root(endpoint)?,
            Some(below) => opener.open_via(below, endpoint)?,
        };
        layers.push(layer);
    }
    Ok(layers)
}

struct Ssh2Opener;

impl Ssh2Opener {
    fn authenticate(
        &self,
        tcp: TcpStream,
        endpoint: &RemoteEndpoint,
        relay: Option<RelayGuard>,
    ) -> PickResult<HopLayer> {
        let label = endpoint.label();
        let mut session = Session::new()
            .map_err(|e| PickError::Connect(format!("{label}: session init: {e}")))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| PickError::Connect(format!("{label}: handshake: {e}")))?;
        session
            .userauth_password(&endpoint.user, endpoint.secret.expose())
            .map_err(|e| PickError::Connect(format!("{label}: authentication: {e}")))?;
        if !session.authenticated() {
            return Err(PickError::Connect(format!(
                "{label}: authentication incomplete"
            )));
        }
        info!(hop = %label, user = %endpoint.user, "hop authenticated");
        Ok(HopLayer {
            session,
            relay,
            label,
        })
    }
}

impl HopOpener for Ssh2Opener {
    type Layer = HopLayer;

    fn open_root(&self, endpoint: &RemoteEndpoint) -> PickResult<HopLayer> {
        let label = endpoint.label();
        info!(hop = %label, "dialing first hop");
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|e| PickError::Connect(format!("{label}: dial: {e}")))?;
        self.authenticate(tcp, endpoint, None)
    }

    fn open_via(&self, below: &mut HopLayer, endpoint: &RemoteEndpoint) -> PickResult<HopLayer> {
        let label = endpoint.label();
        info!(hop = %label, via = %below.label, "opening forwarded stream");
        let channel = below
            .session
            .channel_direct_tcpip(&endpoint.host, endpoint.port, None)
            .map_err(|e| {
                PickError::Connect(format!("{label}: forward via {}: {e}", below.label))
            })?;
        // The carrier session now only serves the relay loop, which must not
        // block on an idle channel.
        below.session.set_blocking(false);
        let (relay, relay_addr) = RelayGuard::spawn(channel)
            .map_err(|e| PickError::Connect(format!("{label}: relay: {e}")))?;
        let tcp = TcpStream::connect(relay_addr)
            .map_err(|e| PickError::Connect(format!("{label}: relay dial: {e}")))?;
        self.authenticate(tcp, endpoint, Some(relay))
    }
}

/// Pump thread shuttling bytes between a forwarded channel and a loopback
/// socket.
struct RelayGuard {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RelayGuard {
    fn spawn(channel: ssh2::Channel) -> io::Result<(Self, SocketAddr)> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || relay_main(listener, channel, &stop_flag));
        Ok((
            Self {
                stop,
                handle: Some(handle),
            },
            addr,
        ))
    }

    fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("relay thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn relay_main(listener: TcpListener, mut channel: ssh2::Channel, stop: &AtomicBool) {
    // The inner session dials immediately after spawn; poll until it does.
    let sock = loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        match listener.accept() {
            Ok((sock, _)) => break sock,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(2));
            }
            Err(e) => {
                warn!(error = %e, "relay accept failed");
                return;
            }
        }
    };
    if sock.set_nonblocking(true).is_err() {
        return;
    }

    let mut buf = [0u8; 32 * 1024];
    while !stop.load(Ordering::Relaxed) {
        let mut moved = false;

        match (&sock).read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if write_full(&mut channel, &buf[..n], stop).is_err() {
                    break;
                }
                moved = true;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(_) => break,
        }

        match channel.read(&mut buf) {
            Ok(0) => {
                if channel.eof() {
                    break;
                }
            }
            Ok(n) => {
                if write_full(&mut (&sock), &buf[..n], stop).is_err() {
                    break;
                }
                moved = true;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(_) => break,
        }

        if !moved {
            thread::sleep(Duration::from_millis(2));
        }
    }
    let _ = channel.close();
}

/// Writes the whole buffer, riding out `WouldBlock` from the non-blocking
/// endpoints.
fn write_full<W: Write>(writer: &mut W, mut data: &[u8], stop: &AtomicBool) -> io::Result<()> {
    while !data.is_empty() {
        if stop.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "relay stopped"));
        }
        match writer.write(data) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "relay endpoint closed",
                ))
            }
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(1));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Classifies an SFTP-path failure against a session-level one. SFTP status
/// codes (missing path, permission) are the caller's problem; anything else
/// means the transport itself is unhealthy.
fn classify_sftp_error(err: &ssh2::Error, path: &str) -> PickError {
    match err.code() {
        ErrorCode::SFTP(_) => PickError::Access(format!("{path}: {err}")),
        ErrorCode::Session(_) => PickError::Connect(format!("{path}: {err}")),
    }
}

/// An established hop chain with the SFTP subsystem derived on its innermost
/// layer.
pub struct SecureChannel {
    layers: Vec<HopLayer>,
    sftp: Option<Sftp>,
}

impl SecureChannel {
    /// Establishes every hop in order, then derives the file-transfer
    /// subsystem on the innermost hop. Fails with `Connect` at the first hop
    /// whose network, handshake, or authentication step fails; hops after the
    /// failing one are never attempted.
    pub fn establish(hops: &[RemoteEndpoint]) -> PickResult<Self> {
        if hops.is_empty() {
            return Err(PickError::Connect("hop list is empty".into()));
        }
        let layers = open_chain(&Ssh2Opener, hops)?;
        let sftp = match layers.last() {
            Some(inner) => inner
                .session
                .sftp()
                .map_err(|e| PickError::Connect(format!("{}: sftp subsystem: {e}", inner.label)))?,
            None => return Err(PickError::Connect("hop list is empty".into())),
        };
        info!(hops = layers.len(), "secure channel established");
        Ok(Self {
            layers,
            sftp: Some(sftp),
        })
    }

    fn sftp(&self) -> PickResult<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| PickError::Connect("channel is torn down".into()))
    }

    /// Releases the file-transfer handle, then each hop from innermost to
    /// outermost. Every release is independent and best-effort: one resource
    /// failing to close never blocks an attempt on the rest. Idempotent.
    pub fn teardown(&mut self) {
        if self.sftp.take().is_some() {
            debug!("sftp handle released");
        }
        while let Some(layer) = self.layers.pop() {
            debug!(hop = %layer.label, "closing hop");
            layer.close();
        }
    }
}

impl Drop for SecureChannel {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl RemoteStore for SecureChannel {
    fn list(&self, path: &str) -> PickResult<Vec<String>> {
        let sftp = self.sftp()?;
        debug!(%path, "sftp listdir");
        let entries = sftp
            .readdir(Path::new(path))
            .map_err(|e| classify_sftp_error(&e, path))?;
        let mut names: Vec<String> = entries
            .iter()
            .filter_map(|(entry_path, _)| {
                entry_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn read_all(&self, path: &str) -> PickResult<Vec<u8>> {
        let sftp = self.sftp()?;
        debug!(%path, "sftp read");
        let mut file = sftp
            .open(Path::new(path))
            .map_err(|e| classify_sftp_error(&e, path))?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)
            .map_err(|e| PickError::Read(format!("{path}: {e}")))?;
        debug!(%path, bytes = raw.len(), "sftp read complete");
        Ok(raw)
    }
}
