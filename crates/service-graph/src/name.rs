use std::borrow::Cow;
use std::fmt;

/// A service's identity in the registry.
///
/// A plain string newtype rather than a closed enum: the concrete set of
/// services (`EventWatcher`, `ChainService`, `Dispatcher`, ...) is decided
/// by the binary wiring them up, not by this crate — but lookups still go
/// through this typed wrapper rather than raw `&str`/`HashMap<String, _>`
/// sprinkled through call sites, per spec.md §9 "Dynamic service lookup".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(Cow<'static, str>);

impl ServiceName {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for ServiceName {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}
