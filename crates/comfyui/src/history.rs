//! ComfyUI history record types.
//!
//! `GET /history/{prompt_id}` returns `{"<prompt_id>": {"outputs": {...}}}`
//! once the engine has finished the prompt. The `outputs` mapping is keyed
//! by node id; image-producing nodes carry an `images` list of
//! `{filename, subfolder, type}` entries.

use serde::Deserialize;
use serde_json::{Map, Value};

/// The completed history entry for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    /// Correlation identifier the record was found under.
    pub prompt_id: String,
    /// Per-node outputs, in the order the engine reported them.
    pub outputs: Map<String, Value>,
}

/// One image produced by a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Output of a single node. Only images are of interest; other output
/// kinds (text, gifs, latents) are ignored.
#[derive(Debug, Clone, Deserialize)]
struct NodeOutput {
    #[serde(default)]
    images: Vec<ImageRef>,
}

/// A node's output did not match the expected shape.
#[derive(Debug, thiserror::Error)]
#[error("Malformed output for node {node_id}: {source}")]
pub struct MalformedOutput {
    pub node_id: String,
    #[source]
    pub source: serde_json::Error,
}

impl CompletionRecord {
    /// Look up `prompt_id` in a history response.
    ///
    /// Returns `None` while the prompt is not yet complete: the key is
    /// absent, or its `outputs` field is missing, null, or empty.
    pub fn from_history(history: &Value, prompt_id: &str) -> Option<Self> {
        let outputs = history.get(prompt_id)?.get("outputs")?.as_object()?;
        if outputs.is_empty() {
            return None;
        }
        Some(Self {
            prompt_id: prompt_id.to_string(),
            outputs: outputs.clone(),
        })
    }

    /// Every image across all nodes, node order first, then list order.
    pub fn images(&self) -> Result<Vec<ImageRef>, MalformedOutput> {
        let mut images = Vec::new();
        for (node_id, output) in &self.outputs {
            let node: NodeOutput =
                serde_json::from_value(output.clone()).map_err(|source| MalformedOutput {
                    node_id: node_id.clone(),
                    source,
                })?;
            images.extend(node.images);
        }
        Ok(images)
    }

    /// Filenames of every produced image, in [`images`](Self::images) order.
    pub fn filenames(&self) -> Result<Vec<String>, MalformedOutput> {
        Ok(self.images()?.into_iter().map(|image| image.filename).collect())
    }
}
