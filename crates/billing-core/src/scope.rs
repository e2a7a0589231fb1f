//! Account scopes, billing facets, and endpoint URLs.

use std::fmt;

/// Which kind of account a billing facet is queried for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountScope {
    Organization(String),
    User(String),
}

impl AccountScope {
    /// Account name. Doubles as the `owner` label on every gauge.
    pub fn owner(&self) -> &str {
        match self {
            AccountScope::Organization(name) | AccountScope::User(name) => name,
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            AccountScope::Organization(_) => "orgs",
            AccountScope::User(_) => "users",
        }
    }
}

impl fmt::Display for AccountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path_segment(), self.owner())
    }
}

/// One billing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Actions,
    Packages,
    SharedStorage,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Actions, Facet::Packages, Facet::SharedStorage];

    /// Last path segment under `settings/billing/`.
    pub fn path(self) -> &'static str {
        match self {
            Facet::Actions => "actions",
            Facet::Packages => "packages",
            Facet::SharedStorage => "shared-storage",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Facet::Actions => "actions",
            Facet::Packages => "packages",
            Facet::SharedStorage => "shared_storage",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `{api_base}/{orgs|users}/{owner}/settings/billing/{facet}`.
pub fn endpoint(api_base: &str, scope: &AccountScope, facet: Facet) -> String {
    format!(
        "{}/{}/{}/settings/billing/{}",
        api_base.trim_end_matches('/'),
        scope.path_segment(),
        scope.owner(),
        facet.path()
    )
}
