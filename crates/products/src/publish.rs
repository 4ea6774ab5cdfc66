//! Publish workflow shared by products and packages.
//!
//! The workflow is a closed transition table: each [`Transition`] names a set of
//! allowed source states and a single target state. Storage adapters apply a
//! transition as one conditional update guarded by [`Transition::sources`], so
//! nothing here reads state before writing it.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use nova_core::{DomainError, PackageId, ProductId};

/// Publish status of an artifact.
///
/// Persisted and serialized as the legacy `pro_status_0N` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PublishStatus {
    #[default]
    Unpublished,
    Trial,
    Published,
    RetiredFromSale,
}

impl PublishStatus {
    pub const ALL: [PublishStatus; 4] = [
        PublishStatus::Unpublished,
        PublishStatus::Trial,
        PublishStatus::Published,
        PublishStatus::RetiredFromSale,
    ];

    pub const fn as_token(self) -> &'static str {
        match self {
            PublishStatus::Unpublished => "pro_status_01",
            PublishStatus::Trial => "pro_status_02",
            PublishStatus::Published => "pro_status_03",
            PublishStatus::RetiredFromSale => "pro_status_04",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_token() == token)
    }

    /// Human readable label used in list views.
    pub const fn label(self) -> &'static str {
        match self {
            PublishStatus::Unpublished => "unpublished",
            PublishStatus::Trial => "trial",
            PublishStatus::Published => "published",
            PublishStatus::RetiredFromSale => "retired from sale",
        }
    }
}

impl core::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_token())
    }
}

impl TryFrom<String> for PublishStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for PublishStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
            .ok_or_else(|| DomainError::validation(format!("unknown publish status '{s}'")))
    }
}

impl From<PublishStatus> for String {
    fn from(value: PublishStatus) -> Self {
        value.as_token().to_string()
    }
}

/// A named, guarded publish-status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Put the artifact on trial.
    Tryout,
    /// Pull a trial back to unpublished.
    Withdraw,
    /// Release the artifact.
    Publish,
    /// Delist a published artifact ("obtained" in the console's vocabulary).
    Obtained,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Tryout,
        Transition::Withdraw,
        Transition::Publish,
        Transition::Obtained,
    ];

    /// Publish states from which this transition may be applied.
    pub const fn sources(self) -> &'static [PublishStatus] {
        match self {
            Transition::Tryout => &[PublishStatus::Unpublished, PublishStatus::RetiredFromSale],
            Transition::Withdraw => &[PublishStatus::Trial],
            Transition::Publish => &[
                PublishStatus::Unpublished,
                PublishStatus::Trial,
                PublishStatus::RetiredFromSale,
            ],
            Transition::Obtained => &[PublishStatus::Published],
        }
    }

    pub const fn target(self) -> PublishStatus {
        match self {
            Transition::Tryout => PublishStatus::Trial,
            Transition::Withdraw => PublishStatus::Unpublished,
            Transition::Publish => PublishStatus::Published,
            Transition::Obtained => PublishStatus::RetiredFromSale,
        }
    }

    pub fn permits(self, current: PublishStatus) -> bool {
        self.sources().contains(&current)
    }

    /// The state reached from `current`, or `None` if the transition is not allowed.
    pub fn apply(self, current: PublishStatus) -> Option<PublishStatus> {
        self.permits(current).then_some(self.target())
    }

    /// Whether this transition stamps `published_by` with the acting user.
    ///
    /// Products and packages both stamp on `publish`; keep the two kinds in step.
    pub const fn records_publisher(self) -> bool {
        matches!(self, Transition::Publish)
    }

    /// Source tokens as stored in the `publish_status` column.
    pub fn source_tokens(self) -> Vec<&'static str> {
        self.sources().iter().map(|s| s.as_token()).collect()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Transition::Tryout => "tryout",
            Transition::Withdraw => "withdraw",
            Transition::Publish => "publish",
            Transition::Obtained => "obtained",
        }
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown action '{s}'")))
    }
}

/// The two kinds of versioned artifact that carry the publish workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Product,
    Package,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Product => "product",
            ArtifactKind::Package => "package",
        }
    }
}

impl core::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRef {
    Product(ProductId),
    Package(PackageId),
}

impl ArtifactRef {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactRef::Product(_) => ArtifactKind::Product,
            ArtifactRef::Package(_) => ArtifactKind::Package,
        }
    }
}

impl core::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArtifactRef::Product(id) => write!(f, "product {id}"),
            ArtifactRef::Package(id) => write!(f, "package {id}"),
        }
    }
}
