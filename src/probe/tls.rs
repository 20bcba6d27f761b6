// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Certificate Fingerprinting
 * Handshake-based capture of SANs, issuer, subject, and validity window
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::probe::TlsInfo;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tracing::debug;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

/// Perform a TLS handshake against `host:port` and extract certificate
/// metadata from the presented leaf certificate.
///
/// Validation is deliberately disabled: expired, self-signed, and
/// wrong-host certificates are exactly the assets a discovery scan needs
/// to observe.
pub async fn fingerprint(host: &str, port: u16, timeout: Duration) -> DiscoveryResult<TlsInfo> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| DiscoveryError::Network(format!("connect timeout for {}:{}", host, port)))?
        .map_err(|e| DiscoveryError::Network(format!("connect failed for {}:{}: {}", host, port, e)))?;

    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| DiscoveryError::Network(format!("tls connector init failed: {}", e)))?;
    let connector = TlsConnector::from(connector);

    let tls_stream = tokio::time::timeout(timeout, connector.connect(host, stream))
        .await
        .map_err(|_| DiscoveryError::Network(format!("handshake timeout for {}:{}", host, port)))?
        .map_err(|e| DiscoveryError::Network(format!("handshake failed for {}: {}", host, e)))?;

    let cert = tls_stream
        .get_ref()
        .peer_certificate()
        .map_err(|e| DiscoveryError::Network(format!("peer certificate unavailable: {}", e)))?
        .ok_or_else(|| {
            DiscoveryError::Network(format!("no peer certificate presented by {}", host))
        })?;

    let der = cert
        .to_der()
        .map_err(|e| DiscoveryError::Network(format!("certificate encoding failed: {}", e)))?;

    parse_certificate(&der, host)
}

/// Decode the leaf certificate DER into the metadata the scan records
fn parse_certificate(der: &[u8], host: &str) -> DiscoveryResult<TlsInfo> {
    let (_, cert) = x509_parser::certificate::X509Certificate::from_der(der)
        .map_err(|e| DiscoveryError::Network(format!("certificate parse failed for {}: {}", host, e)))?;

    let mut subject_alt_names = Vec::new();
    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for name in &san_ext.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                subject_alt_names.push(dns.to_lowercase());
            }
        }
    }

    let issuer_common_name = cert
        .issuer()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    let subject_common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    let validity = cert.validity();
    let not_before = timestamp_to_utc(validity.not_before.timestamp());
    let not_after = timestamp_to_utc(validity.not_after.timestamp());

    debug!(
        "tls fingerprint for {}: {} SANs, issuer '{}'",
        host,
        subject_alt_names.len(),
        issuer_common_name
    );

    Ok(TlsInfo {
        subject_alt_names,
        issuer_common_name,
        subject_common_name,
        not_before,
        not_after,
    })
}

fn timestamp_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}
