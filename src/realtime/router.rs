use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::Cache;

/// Type tag of the liveness handshake the server sends on connect.
pub const HANDSHAKE_TYPE: &str = "connected";

pub const STATIC_PAGES_HOME_KEY: &str = "static-pages/home";
pub const STATIC_PAGES_INFO_KEY: &str = "static-pages/info";

/// Resource families the push stream announces changes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceTag {
    News,
    Videos,
    Banners,
    Partners,
    UsefulPhones,
    Businesses,
    Accommodations,
    StaticPages,
    Notifications,
}

impl ResourceTag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Videos => "videos",
            Self::Banners => "banners",
            Self::Partners => "partners",
            Self::UsefulPhones => "useful-phones",
            Self::Businesses => "businesses",
            Self::Accommodations => "accommodations",
            Self::StaticPages => "static-pages",
            Self::Notifications => "notifications",
        }
    }

    pub const fn all() -> &'static [ResourceTag] {
        &[
            ResourceTag::News,
            ResourceTag::Videos,
            ResourceTag::Banners,
            ResourceTag::Partners,
            ResourceTag::UsefulPhones,
            ResourceTag::Businesses,
            ResourceTag::Accommodations,
            ResourceTag::StaticPages,
            ResourceTag::Notifications,
        ]
    }

    /// Cache keys that go stale when this resource changes. The resource
    /// path itself always comes first.
    pub const fn cache_keys(&self) -> &'static [&'static str] {
        match self {
            Self::News => &["news"],
            Self::Videos => &["videos"],
            Self::Banners => &["banners"],
            Self::Partners => &["partners"],
            Self::UsefulPhones => &["useful-phones"],
            Self::Businesses => &["businesses"],
            Self::Accommodations => &["accommodations"],
            Self::StaticPages => &["static-pages", STATIC_PAGES_HOME_KEY, STATIC_PAGES_INFO_KEY],
            Self::Notifications => &["notifications"],
        }
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceTag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|tag| tag.as_str() == value)
            .ok_or_else(|| format!("unknown resource tag: {value}"))
    }
}

/// Turns push-message type tags into cache invalidations.
#[derive(Clone)]
pub struct InvalidationRouter {
    cache: Arc<dyn Cache>,
}

impl InvalidationRouter {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Invalidate everything `tag` covers. Unknown tags come from newer
    /// servers and are ignored; the returned slice is empty for them.
    pub fn route(&self, tag: &str) -> &'static [&'static str] {
        let Ok(resource) = tag.parse::<ResourceTag>() else {
            tracing::debug!(tag, "ignoring unknown push message type");
            return &[];
        };

        let keys = resource.cache_keys();
        for key in keys {
            self.cache.invalidate(key);
        }
        tracing::debug!(tag, ?keys, "invalidated cached resources");
        keys
    }
}
