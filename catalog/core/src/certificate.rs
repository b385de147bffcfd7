use ahash::AHashMap as HashMap;
use chrono::{offset::Utc, DateTime};
use parking_lot::RwLock;
use std::{fmt, sync::Arc};

/// The common name of a certificate, derived from a [`crate::ServiceIdentity`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommonName(pub String);

/// Certificate material issued to a workload identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    pub common_name: CommonName,

    /// PEM-encoded certificate chain.
    pub cert_chain: Vec<u8>,

    pub expiration: DateTime<Utc>,
}

/// Looks up the certificate issued for a common name.
pub trait CertificateLookup: Send + Sync {
    fn get_certificate(&self, cn: &CommonName) -> Option<Arc<Certificate>>;
}

/// An in-memory certificate store, written by the certificate issuer and read by the catalog.
#[derive(Debug, Default)]
pub struct CertificateCache {
    certs: RwLock<HashMap<CommonName, Arc<Certificate>>>,
}

// === impl CommonName ===

impl fmt::Display for CommonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl Certificate ===

impl Certificate {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }
}

// === impl CertificateCache ===

impl CertificateCache {
    /// Stores a certificate, replacing any certificate previously issued for the same common name.
    pub fn insert(&self, cert: Certificate) -> Option<Arc<Certificate>> {
        self.certs
            .write()
            .insert(cert.common_name.clone(), Arc::new(cert))
    }

    pub fn remove(&self, cn: &CommonName) -> Option<Arc<Certificate>> {
        self.certs.write().remove(cn)
    }

    pub fn len(&self) -> usize {
        self.certs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.read().is_empty()
    }
}

impl CertificateLookup for CertificateCache {
    /// Expired certificates are treated as missing.
    fn get_certificate(&self, cn: &CommonName) -> Option<Arc<Certificate>> {
        let cert = self.certs.read().get(cn).cloned()?;
        if cert.is_expired(Utc::now()) {
            return None;
        }
        Some(cert)
    }
}
