use rcgen::{CertificateParams, KeyPair};
use time::{Duration, OffsetDateTime};

/// Self-signed certificate and PKCS#8 key for `name`, both PEM encoded
/// with LF line endings.
pub fn self_signed_pair(name: &str, not_after: OffsetDateTime) -> (String, String) {
    let mut params = CertificateParams::new(vec![name.to_owned()]).unwrap();
    params.not_before = not_after - Duration::days(90);
    params.not_after = not_after;

    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();

    (
        cert.pem().replace("\r\n", "\n"),
        key.serialize_pem().replace("\r\n", "\n"),
    )
}

/// Writes an executable stand-in for the tailscale CLI that never answers
/// within `seconds`.
#[cfg(unix)]
pub fn sleeping_command(dir: &std::path::Path, seconds: u32) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("tailscale");
    std::fs::write(&path, format!("#!/bin/sh\nsleep {seconds}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
