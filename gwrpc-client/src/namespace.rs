//! API namespace resolution
//!
//! Graphene nodes address method groups by small integers. Two are fixed by
//! the node and seeded here: `database` (0) and `login` (1). Every other
//! namespace ("history", "network_broadcast", ...) is looked up once by
//! calling the method of the same name on the login API and remembered for
//! the lifetime of the client.
//!
//! The table only grows. A failed lookup inserts nothing, and the resolver
//! never retries; replaying the whole call is the orchestrator's business.

use async_trait::async_trait;
use gwrpc_core::{ApiId, Error, Result, DATABASE_API, DATABASE_API_ID, LOGIN_API, LOGIN_API_ID};
use std::collections::BTreeMap;

/// One RPC round-trip on the login API
///
/// Implemented by the client's exchange so the resolver can be exercised
/// without a socket.
#[async_trait]
pub trait NamespaceLookup: Send {
    /// Call `login.<name>()` with no arguments and return its raw result
    async fn lookup_api(&mut self, name: &str) -> Result<serde_json::Value>;
}

/// Name → id table with lazy resolution of unknown names
#[derive(Debug, Clone)]
pub struct ApiResolver {
    table: BTreeMap<String, ApiId>,
}

impl ApiResolver {
    /// Resolver seeded with the database and login namespaces
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        table.insert(DATABASE_API.to_string(), DATABASE_API_ID);
        table.insert(LOGIN_API.to_string(), LOGIN_API_ID);
        Self { table }
    }

    /// Id of `name` if it has already been resolved
    pub fn get(&self, name: &str) -> Option<ApiId> {
        self.table.get(name).copied()
    }

    /// Snapshot of every resolved namespace
    pub fn known(&self) -> BTreeMap<String, ApiId> {
        self.table.clone()
    }

    /// Resolve `name`, asking the node through `lookup` if it is unknown
    pub async fn resolve(
        &mut self,
        name: &str,
        lookup: &mut (dyn NamespaceLookup + '_),
    ) -> Result<ApiId> {
        if let Some(id) = self.get(name) {
            return Ok(id);
        }

        let result = lookup.lookup_api(name).await?;
        let id = result.as_u64().ok_or_else(|| {
            Error::Protocol(format!(
                "expected a numeric id for API {:?}, got {}",
                name, result
            ))
        })?;

        tracing::debug!(api = %name, api_id = id, "Resolved API namespace");
        self.table.insert(name.to_string(), id);
        Ok(id)
    }
}

impl Default for ApiResolver {
    fn default() -> Self {
        Self::new()
    }
}
