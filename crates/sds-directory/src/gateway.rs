use async_trait::async_trait;

use crate::{AttributeDelta, DirectoryEntry, DirectoryError, EqualityFilter};

/// Directory contract consumed by the sync core.
///
/// Methods take `&mut self`: one connection, one operation in flight.
/// Implementations must be object-safe so the orchestrator can run against
/// `Box<dyn DirectoryGateway>` as well as a concrete type.
#[async_trait]
pub trait DirectoryGateway: Send {
    /// All entries under the configured base (subtree scope) matching
    /// `filter`, in server order. Only `attributes` are populated.
    async fn search(
        &mut self,
        filter: &EqualityFilter,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Replace every attribute named in `delta` on `dn`.
    async fn modify(&mut self, dn: &str, delta: &AttributeDelta) -> Result<(), DirectoryError>;

    /// Close the session. Further calls are undefined.
    async fn disconnect(&mut self) -> Result<(), DirectoryError>;
}
