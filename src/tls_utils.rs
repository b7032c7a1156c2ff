use crate::config::Config;
use rustls::{
    RootCertStore,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use rustls_pemfile::{Item, certs, read_one};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};

pub const RELAY_CERT_PATH: &str = "certs/relay/cert.pem";
pub const RELAY_KEY_PATH: &str = "certs/relay/key.pem";
pub const RELAY_CA_PATH: &str = "certs/relay/rootCA.pem";
pub const RELAY_DOMAIN: &str = "relay.internal";

/// Builds a `RootCertStore` that trusts ONLY the CA found in `ca_path`.
///
/// # Errors
///
/// Returns an `io::Error` if the file is unreadable, the PEM is invalid or it
/// contains no certificates.
pub fn build_pinned_root_store(ca_path: &str) -> io::Result<RootCertStore> {
    let mut root_store = RootCertStore::empty();

    for cert in load_certs(ca_path)? {
        root_store
            .add(cert)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("bad CA cert: {e}")))?;
    }

    Ok(root_store)
}

/// Loads a certificate chain from a PEM file.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened or if the PEM content is invalid.
pub fn load_certs(path: &str) -> io::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("opening cert {path}: {e}")))?;
    certs_from_reader(&mut BufReader::new(file))
}

fn certs_from_reader(reader: &mut dyn BufRead) -> io::Result<Vec<CertificateDer<'static>>> {
    let certs: Vec<CertificateDer<'static>> = certs(reader)
        .collect::<Result<_, _>>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid certs: {e}")))?;

    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "cert file did not contain any certificates",
        ));
    }

    Ok(certs)
}

/// Loads a private key from a PEM file (PKCS1, PKCS8 or SEC1).
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened, is malformed,
/// or does not contain a private key.
pub fn load_private_key(path: &str) -> io::Result<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("opening key {path}: {e}")))?;
    private_key_from_reader(&mut BufReader::new(file))?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no private key found in {path}"),
        )
    })
}

fn private_key_from_reader(reader: &mut dyn BufRead) -> io::Result<Option<PrivateKeyDer<'static>>> {
    loop {
        match read_one(reader) {
            Ok(Some(Item::Pkcs1Key(key))) => return Ok(Some(key.into())),
            Ok(Some(Item::Pkcs8Key(key))) => return Ok(Some(key.into())),
            Ok(Some(Item::Sec1Key(key))) => return Ok(Some(key.into())),
            Ok(None) => return Ok(None),
            Ok(Some(_)) => {}
            Err(e) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("key parse error: {e}"),
                ));
            }
        }
    }
}

/// # Errors
///
/// Returns `io::Error` if the configured certificate file cannot be read.
pub fn load_relay_certs(config: &Config) -> io::Result<Vec<CertificateDer<'static>>> {
    load_certs(config.get_non_empty_or_default("TLS", "relay_cert", RELAY_CERT_PATH))
}

/// # Errors
///
/// Returns `io::Error` if the configured key file cannot be read.
pub fn load_relay_private_key(config: &Config) -> io::Result<PrivateKeyDer<'static>> {
    load_private_key(config.get_non_empty_or_default("TLS", "relay_key", RELAY_KEY_PATH))
}

/// Path of the CA clients should pin when dialing the relay over TLS.
pub fn relay_ca_path(config: &Config) -> &str {
    config.get_non_empty_or_default("TLS", "relay_ca", RELAY_CA_PATH)
}

/// Server name clients expect in the relay certificate.
pub fn relay_domain(config: &Config) -> &str {
    config.get_non_empty_or_default("TLS", "relay_domain", RELAY_DOMAIN)
}
