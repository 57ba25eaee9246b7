//! Requested scope specification and its resolution into a bitmask

use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::errors::{AuthError, Result};
use crate::permissions::{PermissionCatalog, ScopeMask};

/// The three shapes a caller may use to describe the requested permissions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScopeSpec {
    /// Every permission in the catalog
    #[default]
    All,
    /// A bitmask passed through untouched
    Mask(ScopeMask),
    /// Permission names, OR-ed together
    Names(Vec<String>),
}

impl ScopeSpec {
    /// Builds a name list from anything yielding string-likes
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// Resolves the requested scope against a catalog into a single mask
    pub fn resolve(&self, catalog: &PermissionCatalog) -> Result<ScopeMask> {
        let mask = match self {
            Self::All => catalog.all(),
            Self::Names(names) if names.is_empty() => catalog.all(),
            Self::Mask(mask) => *mask,
            Self::Names(names) => names.iter().try_fold(0, |mask, name| {
                catalog
                    .lookup(name)
                    .map(|bit| mask | bit)
                    .ok_or_else(|| AuthError::UnknownPermission { name: name.clone() })
            })?,
        };

        debug!("auth scope {}", mask);

        Ok(mask)
    }
}

impl From<&str> for ScopeSpec {
    /// `""`/`"all"` select everything, digits are a raw mask, anything else is
    /// a comma separated list of names.
    fn from(s: &str) -> Self {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Self::All;
        }

        if let Ok(mask) = s.parse::<ScopeMask>() {
            return Self::Mask(mask);
        }

        Self::names(s.split(',').map(str::trim).filter(|name| !name.is_empty()))
    }
}

impl FromStr for ScopeSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<ScopeMask> for ScopeSpec {
    fn from(mask: ScopeMask) -> Self {
        Self::Mask(mask)
    }
}

impl<'de> Deserialize<'de> for ScopeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Mask(ScopeMask),
            Text(String),
            List(Vec<String>),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => Self::All,
            Some(Raw::Mask(mask)) => Self::Mask(mask),
            Some(Raw::Text(text)) => Self::from(text.as_str()),
            Some(Raw::List(names)) if names.is_empty() => Self::All,
            Some(Raw::List(names)) => Self::Names(names),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &PermissionCatalog = &PermissionCatalog::USER;

    #[test]
    fn test_resolve_names_is_order_independent() {
        let forward = ScopeSpec::names(["friends", "photos", "wall"]);
        let backward = ScopeSpec::names(["wall", "photos", "friends"]);

        assert_eq!(forward.resolve(USER).unwrap(), 2 | 4 | 8192);
        assert_eq!(backward.resolve(USER).unwrap(), 2 | 4 | 8192);
    }

    #[test]
    fn test_resolve_all_matches_every_name() {
        let every = ScopeSpec::names(USER.names());
        assert_eq!(
            ScopeSpec::All.resolve(USER).unwrap(),
            every.resolve(USER).unwrap()
        );
    }

    #[test]
    fn test_resolve_empty_list_means_all() {
        assert_eq!(
            ScopeSpec::Names(Vec::new()).resolve(USER).unwrap(),
            USER.all()
        );
    }

    #[test]
    fn test_resolve_mask_is_unchanged() {
        assert_eq!(ScopeSpec::Mask(0).resolve(USER).unwrap(), 0);
        assert_eq!(ScopeSpec::Mask(1 << 30).resolve(USER).unwrap(), 1 << 30);
        assert_eq!(ScopeSpec::from(140492255u32).resolve(USER).unwrap(), 140492255);
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = ScopeSpec::names(["friends", "teleport"])
            .resolve(USER)
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownPermission { ref name } if name == "teleport"));
    }

    #[test]
    fn test_group_catalog_rejects_user_names() {
        let err = ScopeSpec::names(["friends"])
            .resolve(&PermissionCatalog::GROUP)
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownPermission { .. }));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("all".parse::<ScopeSpec>().unwrap(), ScopeSpec::All);
        assert_eq!("".parse::<ScopeSpec>().unwrap(), ScopeSpec::All);
        assert_eq!("4096".parse::<ScopeSpec>().unwrap(), ScopeSpec::Mask(4096));
        assert_eq!(
            "friends".parse::<ScopeSpec>().unwrap(),
            ScopeSpec::names(["friends"])
        );
        assert_eq!(
            "friends, photos,wall".parse::<ScopeSpec>().unwrap(),
            ScopeSpec::names(["friends", "photos", "wall"])
        );
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default)]
            scope: ScopeSpec,
        }

        let parse = |json: &str| serde_json::from_str::<Holder>(json).unwrap().scope;

        assert_eq!(parse(r#"{}"#), ScopeSpec::All);
        assert_eq!(parse(r#"{"scope": null}"#), ScopeSpec::All);
        assert_eq!(parse(r#"{"scope": "all"}"#), ScopeSpec::All);
        assert_eq!(parse(r#"{"scope": 6}"#), ScopeSpec::Mask(6));
        assert_eq!(parse(r#"{"scope": "friends,photos"}"#), ScopeSpec::names(["friends", "photos"]));
        assert_eq!(parse(r#"{"scope": ["docs"]}"#), ScopeSpec::names(["docs"]));
        assert_eq!(parse(r#"{"scope": []}"#), ScopeSpec::All);
    }
}
