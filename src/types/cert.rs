use crate::error::AppResult;
use chrono::{DateTime, Utc};
use std::ops::Deref;
use x509_certificate::{asn1time::Time, X509Certificate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCertificate(pub X509Certificate);

impl ParsedCertificate {
    /// Decodes the PEM envelope and parses the DER certificate inside it.
    ///
    /// The two steps fail with different reasons so callers can tell a
    /// broken envelope from a broken certificate.
    pub fn from_pem(blob: &str) -> AppResult<Self> {
        let pem = pem::parse(blob)?;
        let cert = X509Certificate::from_der(pem.contents())?;
        Ok(Self(cert))
    }

    pub fn not_after(&self) -> i64 {
        match &self.0.as_ref().tbs_certificate.validity.not_after {
            Time::UtcTime(t) => t.timestamp(),
            Time::GeneralTime(t) => DateTime::<Utc>::from(t.clone()).timestamp(),
        }
    }
}

impl Deref for ParsedCertificate {
    type Target = X509Certificate;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
