//! Connection - a single outbound link to one IRC network.
//!
//! ```text
//!   dial (TCP, optional TLS)
//!      ↓
//!   greeting delay, optional USER/NICK burst
//!      ↓
//!   read task ──▶ auto replies (PONG, VERSION) ──▶ writer ◀── send_* callers
//!      │
//!      └──▶ shared line channel
//! ```
//!
//! The read task owns the read half. Every outbound write goes through the
//! writer mutex, so concurrent senders never interleave partial lines.

pub(crate) mod commands;
mod error_handling;
mod read_loop;

use crate::config::GatewayConfig;
use crate::error::ConnectionError;
use crate::network::address::NetworkAddress;
use crate::network::stream::IrcStream;
use crate::network::tls::{TlsMode, upgrade_to_tls};
use crate::raw_log::{Direction, RawLog};
use crate::telemetry::spans;
use hatcog_proto::Line;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

/// Upper bound on releasing the write half while closing.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Gateway-wide connection behaviour, shared by every connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Sent in CTCP VERSION replies.
    pub client_version: String,
    /// Token sent in `PONG` replies.
    pub pong_token: String,
    /// Bound on each read; an idle read is not an error.
    pub read_timeout: Duration,
    /// Pause after dialing and after the registration burst.
    pub greeting_delay: Duration,
    /// Deadline for TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
    /// Deadline for writing one line.
    pub write_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        GatewayConfig::default().settings()
    }
}

/// Identity sent as `USER`/`NICK` right after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub nick: String,
    pub name: String,
}

/// Per-dial options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Register on connect. `None` leaves registration to the caller.
    pub registration: Option<Registration>,
    pub tls: TlsMode,
    /// Verify the server certificate against the native roots.
    pub verify_cert: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            registration: None,
            tls: TlsMode::Auto,
            verify_cert: true,
        }
    }
}

/// Lifecycle of a connection. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Running,
    Closing,
    Closed,
}

/// A live connection to one IRC network.
pub struct Connection {
    address: NetworkAddress,
    tls: bool,
    writer: Mutex<WriteHalf<IrcStream>>,
    raw_log: Arc<dyn RawLog>,
    settings: Arc<ConnectionSettings>,
    identified: AtomicBool,
    state: parking_lot::Mutex<ConnectionState>,
    shutdown: CancellationToken,
    read_task: parking_lot::Mutex<Option<JoinHandle<Result<(), ConnectionError>>>>,
}

impl Connection {
    /// Dial `address`, register if asked to, and start the read task.
    ///
    /// Parsed lines go to `lines`. Returns once the connection is ready for
    /// outbound traffic.
    pub async fn connect(
        address: &str,
        options: ConnectOptions,
        settings: Arc<ConnectionSettings>,
        raw_log: Arc<dyn RawLog>,
        lines: mpsc::Sender<Line>,
    ) -> Result<Arc<Self>, ConnectionError> {
        let address = NetworkAddress::parse(address)?;
        let stream = dial(&address, &options, settings.connect_timeout).await?;
        let tls = stream.is_tls();
        info!(address = %address, tls, "Connected to IRC network");

        tokio::time::sleep(settings.greeting_delay).await;

        let (reader, writer) = tokio::io::split(stream);
        let conn = Arc::new(Self {
            address,
            tls,
            writer: Mutex::new(writer),
            raw_log,
            settings,
            identified: AtomicBool::new(false),
            state: parking_lot::Mutex::new(ConnectionState::Running),
            shutdown: CancellationToken::new(),
            read_task: parking_lot::Mutex::new(None),
        });

        if let Some(registration) = &options.registration
            && let Err(e) = conn.register(registration).await
        {
            // No read task yet, so close has nothing to report.
            let _ = conn.close().await;
            return Err(e);
        }

        let span = spans::connection(conn.address.as_str(), tls);
        let handle = tokio::spawn(read_loop::run(Arc::clone(&conn), reader, lines).instrument(span));
        *conn.read_task.lock() = Some(handle);

        Ok(conn)
    }

    async fn register(&self, registration: &Registration) -> Result<(), ConnectionError> {
        info!(address = %self.address, nick = %registration.nick, "Registering");
        for line in commands::registration(&registration.nick, &registration.name)? {
            self.send_raw(&line).await?;
        }
        tokio::time::sleep(self.settings.greeting_delay).await;
        Ok(())
    }

    /// Address this connection was dialed with.
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_identified(&self) -> bool {
        self.identified.load(Ordering::SeqCst)
    }

    /// Resolves once the connection has started closing, for any reason.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }

    /// Write one line followed by `\n`, byte for byte.
    ///
    /// The line is mirrored to the raw log before it hits the socket.
    /// A write failure or a write that outlasts the write timeout closes
    /// the connection. Closing the connection abandons a pending write with
    /// [`ConnectionError::Closed`].
    pub async fn send_raw(&self, text: &str) -> Result<(), ConnectionError> {
        if self.state() != ConnectionState::Running {
            return Err(ConnectionError::Closed);
        }

        let mut data = String::with_capacity(text.len() + 1);
        data.push_str(text);
        data.push('\n');

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(ConnectionError::Closed),
            result = self.write_line(text, data.as_bytes()) => result,
        };

        if let Err(e) = result {
            error!(address = %self.address, error = %e, "Write failed, closing connection");
            self.begin_close();
            return Err(ConnectionError::Write(e));
        }
        Ok(())
    }

    async fn write_line(&self, text: &str, data: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        self.raw_log
            .record(self.address.as_str(), Direction::Outbound, text);

        let write = async {
            writer.write_all(data).await?;
            writer.flush().await
        };
        match timeout(self.settings.write_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write stalled for {:?}", self.settings.write_timeout),
            )),
        }
    }

    /// `PRIVMSG <target> :<text>`. CR or LF in either part is rejected.
    pub async fn send_message(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_raw(&commands::privmsg(target, text)?).await
    }

    /// CTCP ACTION (`/me`) to `target`. CR or LF is rejected.
    pub async fn send_action(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_raw(&commands::action(target, text)?).await
    }

    /// Identify with NickServ. Only the first call on a connection sends.
    pub async fn identify(&self, password: &str) -> Result<(), ConnectionError> {
        if self.identified.swap(true, Ordering::SeqCst) {
            debug!(address = %self.address, "Already identified");
            return Ok(());
        }
        info!(address = %self.address, "Identifying with NickServ");
        self.send_message("NickServ", &format!("identify {password}"))
            .await
    }

    /// Send user-typed command text, see [`commands::rewrite_command`].
    ///
    /// This is the one raw path to the wire: anything after the alias
    /// rewrite is sent verbatim, line breaks included. Do not feed it
    /// untrusted input without an allow-list in front of it.
    pub async fn run_command(&self, text: &str) -> Result<(), ConnectionError> {
        let line = commands::rewrite_command(text).ok_or(ConnectionError::EmptyCommand)?;
        self.send_raw(&line).await
    }

    /// Move Running to Closing and wake the read task.
    fn begin_close(&self) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Running {
                *state = ConnectionState::Closing;
            }
        }
        self.shutdown.cancel();
    }

    /// Stop the read task, wait for it and release the socket.
    ///
    /// Returns how the read task ended: `Ok` for shutdown or EOF, the
    /// transport error otherwise. Only the first call sees that result;
    /// later calls return `Ok`. Safe to call after the server hung up.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.begin_close();

        let handle = self.read_task.lock().take();
        let result = match handle {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(address = %self.address, error = %e, "Read task panicked");
                    Ok(())
                }
            },
            None => Ok(()),
        };

        self.finish().await;
        result
    }

    /// Final transition to Closed. Shuts the write half down once.
    async fn finish(&self) {
        let first = {
            let mut state = self.state.lock();
            let first = *state != ConnectionState::Closed;
            *state = ConnectionState::Closed;
            first
        };
        self.shutdown.cancel();

        if first {
            let release = async {
                let mut writer = self.writer.lock().await;
                writer.shutdown().await
            };
            match timeout(self.settings.write_timeout.min(CLOSE_GRACE), release).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(address = %self.address, error = %e, "Write half shutdown failed");
                }
                Err(_) => {
                    debug!(address = %self.address, "Write half still busy, socket closes on drop");
                }
            }
        }
    }
}

/// TCP connect, then the TLS handshake when selected. Both share one
/// deadline of `connect_timeout`.
async fn dial(
    address: &NetworkAddress,
    options: &ConnectOptions,
    connect_timeout: Duration,
) -> Result<IrcStream, ConnectionError> {
    let deadline = Instant::now() + connect_timeout;
    let timed_out = || {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no answer within {connect_timeout:?}"),
        )
    };
    let dial_error = |source: io::Error| ConnectionError::Dial {
        address: address.to_string(),
        source,
    };

    let tcp = match timeout_at(deadline, TcpStream::connect((address.host(), address.port()))).await {
        Ok(result) => result.map_err(dial_error)?,
        Err(_) => return Err(dial_error(timed_out())),
    };
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(address = %address, error = %e, "Failed to set TCP_NODELAY");
    }

    if !options.tls.use_tls(address) {
        return Ok(IrcStream::Plain(tcp));
    }

    match timeout_at(deadline, upgrade_to_tls(tcp, address, options.verify_cert)).await {
        Ok(result) => Ok(IrcStream::Tls(Box::new(result?))),
        Err(_) => Err(ConnectionError::Tls {
            address: address.to_string(),
            source: timed_out(),
        }),
    }
}
