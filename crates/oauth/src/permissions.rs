//! Static permission catalogs
//!
//! Every permission is a distinct power of two so a set of permissions is the
//! bitwise OR of its members.

/// Scope bitmask as sent in the `scope` query parameter
pub type ScopeMask = u32;

/// User token permissions
const USER_PERMISSIONS: &[(&str, ScopeMask)] = &[
    ("notify", 1),
    ("friends", 2),
    ("photos", 4),
    ("audio", 8),
    ("video", 16),
    ("pages", 128),
    ("link", 256),
    ("status", 1024),
    ("notes", 2048),
    ("messages", 4096),
    ("wall", 8192),
    ("ads", 32768),
    ("offline", 65536),
    ("docs", 131072),
    ("groups", 262144),
    ("notifications", 524288),
    ("stats", 1048576),
    ("email", 4194304),
    ("market", 134217728),
];

/// Community token permissions
const GROUP_PERMISSIONS: &[(&str, ScopeMask)] = &[
    ("stories", 1),
    ("photos", 4),
    ("app_widget", 64),
    ("messages", 4096),
    ("docs", 131072),
    ("manage", 262144),
];

const fn aggregate(entries: &[(&str, ScopeMask)]) -> ScopeMask {
    let mut mask = 0;
    let mut i = 0;
    while i < entries.len() {
        mask |= entries[i].1;
        i += 1;
    }
    mask
}

/// An immutable name → bit table with its precomputed "all" aggregate
#[derive(Debug)]
pub struct PermissionCatalog {
    entries: &'static [(&'static str, ScopeMask)],
    all: ScopeMask,
}

impl PermissionCatalog {
    /// Permissions a user access token can request
    pub const USER: PermissionCatalog = PermissionCatalog {
        entries: USER_PERMISSIONS,
        all: aggregate(USER_PERMISSIONS),
    };

    /// Permissions a community access token can request
    pub const GROUP: PermissionCatalog = PermissionCatalog {
        entries: GROUP_PERMISSIONS,
        all: aggregate(GROUP_PERMISSIONS),
    };

    /// Looks up the bit for a permission name
    pub fn lookup(&self, name: &str) -> Option<ScopeMask> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, bit)| *bit)
    }

    /// OR of every permission in the catalog
    pub fn all(&self) -> ScopeMask {
        self.all
    }

    /// Permission names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Name/bit pairs in catalog order
    pub fn entries(&self) -> &'static [(&'static str, ScopeMask)] {
        self.entries
    }

    /// Names of the catalog permissions set in `mask`
    pub fn describe(&self, mask: ScopeMask) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, bit)| mask & bit != 0)
            .map(|(name, _)| *name)
            .collect()
    }
}
