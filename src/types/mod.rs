mod cert;
mod identity;
mod slot;

pub use cert::ParsedCertificate;
pub use identity::NodeIdentity;
pub use slot::Slot;
