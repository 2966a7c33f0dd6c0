//! TLS for outbound connections.

use crate::error::ConnectionError;
use crate::network::address::NetworkAddress;
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{
    CryptoProvider, aws_lc_rs, verify_tls12_signature, verify_tls13_signature,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{info, warn};

/// When to wrap a connection in TLS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS on port 6697, plaintext otherwise.
    #[default]
    Auto,
    Always,
    Never,
}

impl TlsMode {
    pub fn use_tls(self, address: &NetworkAddress) -> bool {
        match self {
            TlsMode::Auto => address.is_tls_port(),
            TlsMode::Always => true,
            TlsMode::Never => false,
        }
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(aws_lc_rs::default_provider()))
}

fn client_config(verify_cert: bool) -> Result<ClientConfig, tokio_rustls::rustls::Error> {
    let provider = crypto_provider();
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    if !verify_cert {
        // Dangerous: Skip certificate verification (for testing/self-signed certs only)
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth());
    }

    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!("Failed to add root cert: {}", e);
        }
    }
    for e in &certs.errors {
        warn!("Error loading native certs: {}", e);
    }

    Ok(builder
        .with_root_certificates(roots)
        .with_no_client_auth())
}

/// Run the TLS handshake over an established TCP connection.
///
/// The host part of `address` is used for SNI and certificate checks.
pub async fn upgrade_to_tls(
    tcp_stream: TcpStream,
    address: &NetworkAddress,
    verify_cert: bool,
) -> Result<TlsStream<TcpStream>, ConnectionError> {
    let tls_error = |source: io::Error| ConnectionError::Tls {
        address: address.to_string(),
        source,
    };

    let config = client_config(verify_cert).map_err(|e| tls_error(io::Error::other(e)))?;
    let server_name = ServerName::try_from(address.host().to_string())
        .map_err(|_| ConnectionError::InvalidServerName(address.host().to_string()))?;

    let connector = TlsConnector::from(Arc::new(config));
    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(tls_error)?;

    info!(address = %address, verify = verify_cert, "TLS handshake completed");
    Ok(tls_stream)
}

/// Certificate verifier that accepts any server certificate.
///
/// Signatures are still checked, so the peer must hold the key for the
/// certificate it presents.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_mode_selection() {
        let tls_port = NetworkAddress::parse("irc.libera.chat:6697").unwrap();
        let plain_port = NetworkAddress::parse("irc.libera.chat:6667").unwrap();

        assert!(TlsMode::Auto.use_tls(&tls_port));
        assert!(!TlsMode::Auto.use_tls(&plain_port));
        assert!(TlsMode::Always.use_tls(&plain_port));
        assert!(!TlsMode::Never.use_tls(&tls_port));
    }

    #[test]
    fn test_client_config_without_verification() {
        assert!(client_config(false).is_ok());
    }
}
