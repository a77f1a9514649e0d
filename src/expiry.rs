use crate::{error::AppResult, types::ParsedCertificate};
use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Whole days left before the certificate in `blob` expires, measured
/// against the current wall clock.
///
/// Negative values mean the certificate has already expired.
pub fn days_until_expiry(blob: &str) -> AppResult<i64> {
    days_until_expiry_at(blob, Utc::now())
}

pub fn days_until_expiry_at(blob: &str, now: DateTime<Utc>) -> AppResult<i64> {
    let cert = ParsedCertificate::from_pem(blob)?;
    let remaining = cert.not_after() - now.timestamp();
    trace!(
        "not_after={} remaining={}s subject={:?}",
        cert.not_after(),
        remaining,
        cert.subject_common_name()
    );

    Ok(remaining.div_euclid(SECONDS_PER_DAY))
}
