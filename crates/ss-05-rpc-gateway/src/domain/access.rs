//! Category access rules.

use shared_types::{AuthLevel, ConnectionInfo};

/// Peer-to-peer commands.
pub const CATEGORY_SN: &str = "sn";
/// Client storage commands.
pub const CATEGORY_STORAGE: &str = "storage";
/// Subscription commands.
pub const CATEGORY_MONITOR: &str = "monitor";
/// Operator introspection.
pub const CATEGORY_SERVICE: &str = "service";
/// Pushes from the local blockchain daemon.
pub const CATEGORY_NOTIFY: &str = "notify";

/// Who may call into a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Minimum connection authorization.
    pub auth: AuthLevel,
    /// Only connections authenticated as active service nodes.
    pub remote_sn: bool,
}

impl Access {
    pub const PUBLIC: Access = Access {
        auth: AuthLevel::None,
        remote_sn: false,
    };

    pub const PEER: Access = Access {
        auth: AuthLevel::None,
        remote_sn: true,
    };

    pub const ADMIN: Access = Access {
        auth: AuthLevel::Admin,
        remote_sn: false,
    };

    /// `Err` carries the reason the connection is refused.
    pub fn check(&self, conn: &ConnectionInfo) -> Result<(), &'static str> {
        if conn.auth < self.auth {
            return Err("insufficient authorization");
        }
        if self.remote_sn && !conn.remote_sn {
            return Err("service node connections only");
        }
        Ok(())
    }
}
