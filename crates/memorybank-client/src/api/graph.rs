//! Knowledge graph API.

use crate::client::MemoryBankClient;
use crate::error::Result;
use crate::types::{ConceptGraph, GraphData};

/// Graph API client.
pub struct GraphApi {
    client: MemoryBankClient,
}

impl GraphApi {
    pub(crate) fn new(client: MemoryBankClient) -> Self {
        Self { client }
    }

    /// The whole graph: every note and concept of the user.
    pub async fn graph(&self) -> Result<GraphData> {
        self.client.get(&["graph"]).await
    }

    /// Subgraph around one concept. The name is sent as a single path segment.
    pub async fn concept_graph(&self, name: &str) -> Result<ConceptGraph> {
        self.client.get(&["graph", "concept", name]).await
    }
}
