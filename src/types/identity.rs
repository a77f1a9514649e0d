use crate::error::{AppResult, ErrorReason};
use std::fmt::{Display, Formatter};

/// Verified name of the node on the other end of a connection.
///
/// Only an identity resolver produces these. The overlay reports names as
/// fully qualified (`m3.tailnet.net.`), so a single trailing dot is dropped
/// here and the remaining name is used verbatim as the storage key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    pub fn new(raw: &str) -> AppResult<Self> {
        let name = raw.strip_suffix('.').unwrap_or(raw);

        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(ErrorReason::InvalidIdentity(raw.to_owned()).into());
        }

        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
