//! TLS support (§6 `secure(key, cert)`): loads a certificate chain and
//! private key with rustls' `pemfile` helpers (teacher's own `load_certs`/
//! `load_private_key`, kept verbatim) and wraps an accepted `TcpStream` in a
//! blocking `rustls::StreamOwned` that implements `connection::Socket`,
//! replacing the teacher's non-blocking `rustls::ServerSession` usage inside
//! its mio reactor.

use crate::connection::Socket;
use crate::error::ServerError;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

pub fn load_certs(filename: &std::path::Path) -> Result<Vec<rustls::Certificate>, LoadCertificateError> {
    let cert_file = fs::File::open(filename)?;
    let mut reader = BufReader::new(cert_file);
    let certs = rustls::internal::pemfile::certs(&mut reader)?;
    Ok(certs)
}

pub fn load_private_key(filename: &std::path::Path) -> Result<rustls::PrivateKey, LoadPrivateKeyError> {
    let pkcs8_keys = {
        let keyfile = fs::File::open(filename)?;
        let mut reader = BufReader::new(keyfile);
        rustls::internal::pemfile::pkcs8_private_keys(&mut reader)?
    };

    if !pkcs8_keys.is_empty() {
        return Ok(pkcs8_keys[0].clone());
    }

    let rsa_keys = {
        let key_file = fs::File::open(filename)?;
        let mut reader = BufReader::new(key_file);
        rustls::internal::pemfile::rsa_private_keys(&mut reader)?
    };

    if rsa_keys.is_empty() {
        return Err(LoadPrivateKeyError::RsaKeyIsEmpty);
    }
    Ok(rsa_keys[0].clone())
}

/// Builds the shared `rustls::ServerConfig` from `ServerBuilder::secure`'s
/// paths (§6). Client certificate authentication is out of scope.
pub fn build_server_config(cert_path: &std::path::Path, key_path: &std::path::Path) -> Result<Arc<rustls::ServerConfig>, ServerError> {
    let certs = load_certs(cert_path).map_err(|err| ServerError::Tls(err.to_string()))?;
    let key = load_private_key(key_path).map_err(|err| ServerError::Tls(err.to_string()))?;

    let mut config = rustls::ServerConfig::new(rustls::NoClientAuth::new());
    config.set_single_cert(certs, key).map_err(|err| ServerError::Tls(err.to_string()))?;
    Ok(Arc::new(config))
}

/// A blocking TLS connection, `connection::serve_connection`'s `Socket` over
/// an accepted plaintext `TcpStream` wrapped by rustls' owning stream.
pub struct TlsStream {
    inner: rustls::StreamOwned<rustls::ServerSession, TcpStream>,
}

impl TlsStream {
    pub fn accept(tcp: TcpStream, config: Arc<rustls::ServerConfig>) -> Self {
        let session = rustls::ServerSession::new(&config);
        TlsStream { inner: rustls::StreamOwned::new(session, tcp) }
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl Socket for TlsStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.inner.sock.set_read_timeout(timeout)
    }
}

#[derive(Debug)]
pub enum LoadCertificateError {
    CannotOpenFile(std::io::Error),
    CannotExtractCertificates,
}

impl From<std::io::Error> for LoadCertificateError {
    fn from(err: std::io::Error) -> Self {
        LoadCertificateError::CannotOpenFile(err)
    }
}

impl From<()> for LoadCertificateError {
    fn from(_err: ()) -> Self {
        LoadCertificateError::CannotExtractCertificates
    }
}

impl std::fmt::Display for LoadCertificateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadCertificateError::CannotOpenFile(err) => write!(f, "cannot open certificate file: {}", err),
            LoadCertificateError::CannotExtractCertificates => write!(f, "cannot parse certificates from file"),
        }
    }
}

impl std::error::Error for LoadCertificateError {}

#[derive(Debug)]
pub enum LoadPrivateKeyError {
    CannotOpenFile(std::io::Error),
    RsaPrivateKeys,
    RsaKeyIsEmpty,
}

impl From<std::io::Error> for LoadPrivateKeyError {
    fn from(err: std::io::Error) -> Self {
        LoadPrivateKeyError::CannotOpenFile(err)
    }
}

impl From<()> for LoadPrivateKeyError {
    fn from(_err: ()) -> Self {
        LoadPrivateKeyError::RsaPrivateKeys
    }
}

impl std::fmt::Display for LoadPrivateKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPrivateKeyError::CannotOpenFile(err) => write!(f, "cannot open private key file: {}", err),
            LoadPrivateKeyError::RsaPrivateKeys => write!(f, "cannot parse rsa private keys"),
            LoadPrivateKeyError::RsaKeyIsEmpty => write!(f, "no private key found in file"),
        }
    }
}

impl std::error::Error for LoadPrivateKeyError {}
