//! Scripted IRC network.
//!
//! Binds to an ephemeral port, plaintext or TLS. Each accepted connection
//! is a FakeSession the test drives line by line.

use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;

use super::tls::self_signed_acceptor;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Either side of a plain or TLS session.
trait SessionIo: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> SessionIo for T {}

type BoxedIo = Box<dyn SessionIo>;

/// A listening fake network.
pub struct FakeNetwork {
    listener: TcpListener,
    address: String,
    acceptor: Option<TlsAcceptor>,
}

impl FakeNetwork {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        Ok(Self {
            listener,
            address,
            acceptor: None,
        })
    }

    /// A network that speaks TLS with a self-signed certificate.
    pub async fn bind_tls() -> anyhow::Result<Self> {
        let mut network = Self::bind().await?;
        network.acceptor = Some(self_signed_acceptor()?);
        Ok(network)
    }

    /// `127.0.0.1:<port>`, the key the gateway uses for this network.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Accept the next gateway connection, running the TLS handshake on
    /// TLS networks.
    pub async fn accept(&self) -> anyhow::Result<FakeSession> {
        let stream = self.accept_tcp().await?;
        let io: BoxedIo = match &self.acceptor {
            Some(acceptor) => Box::new(timeout(RECV_TIMEOUT, acceptor.accept(stream)).await??),
            None => Box::new(stream),
        };
        let (read_half, write_half) = tokio::io::split(io);
        Ok(FakeSession {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Accept the next connection without any session handling.
    pub async fn accept_tcp(&self) -> anyhow::Result<TcpStream> {
        let (stream, _) = timeout(RECV_TIMEOUT, self.listener.accept()).await??;
        Ok(stream)
    }

    /// Assert nobody dials this network within `dur`.
    pub async fn expect_no_dial(&self, dur: Duration) -> anyhow::Result<()> {
        match timeout(dur, self.listener.accept()).await {
            Err(_) => Ok(()),
            Ok(_) => anyhow::bail!("unexpected second connection to {}", self.address),
        }
    }
}

/// The server side of one gateway connection.
pub struct FakeSession {
    reader: BufReader<ReadHalf<BoxedIo>>,
    writer: WriteHalf<BoxedIo>,
}

impl FakeSession {
    /// Send one line, CRLF-terminated.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.send_bytes(line.as_bytes()).await?;
        self.send_bytes(b"\r\n").await
    }

    /// Send raw bytes as-is.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line from the gateway, terminator stripped.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("gateway closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Assert the gateway sends nothing within `dur`.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await {
            Err(_) => Ok(()),
            Ok(Ok(0)) => anyhow::bail!("gateway closed the connection"),
            Ok(Ok(_)) => anyhow::bail!("unexpected line from gateway: {:?}", line.trim_end()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Wait for the gateway to close its side.
    pub async fn expect_eof(&mut self) -> anyhow::Result<()> {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n == 0, "expected EOF, got {:?}", line.trim_end());
        Ok(())
    }

    /// Hang up.
    pub async fn close(mut self) {
        let _ = self.writer.shutdown().await;
    }
}
