//! TLS upgrade for the outbound connection.

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
use tokio_rustls::rustls::{
    ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme,
};
use tracing::{info, warn};

use crate::error::ConnectionError;

/// Accepts any server certificate. Signatures are still checked.
#[derive(Debug)]
pub struct NoCertificateVerification(Arc<CryptoProvider>);

impl NoCertificateVerification {
    pub fn new() -> Self {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(aws_lc_rs::default_provider()));
        Self(provider)
    }
}

impl Default for NoCertificateVerification {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn client_config(verify_cert: bool) -> ClientConfig {
    if verify_cert {
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
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    } else {
        // Self-signed or test servers only
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification::new()))
            .with_no_client_auth()
    }
}

/// Upgrade a connected TCP stream to TLS.
pub async fn upgrade(
    tcp: TcpStream,
    hostname: &str,
    verify_cert: bool,
) -> Result<TlsStream<TcpStream>, ConnectionError> {
    let connector = TlsConnector::from(Arc::new(client_config(verify_cert)));
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| ConnectionError::InvalidServerName(hostname.to_string()))?;

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| ConnectionError::Tls(e.to_string()))?;

    info!(hostname = %hostname, verify = verify_cert, "TLS handshake completed");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_configs() {
        let _ = client_config(true);
        let _ = client_config(false);
    }

    #[test]
    fn no_verify_lists_schemes() {
        assert!(!NoCertificateVerification::new().supported_verify_schemes().is_empty());
    }
}
