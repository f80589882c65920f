use super::RecipeRepository;
use crate::config::PineconeConfig;
use crate::error::{ColunchError, Result};
use crate::model::Recipe;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde_json::{json, Value};

/// Recipes kept in a Pinecone index, recipe fields as vector metadata
pub struct PineconeRepository {
    client: Client,
    api_key: String,
    index_host: String,
    namespace: Option<String>,
}

impl PineconeRepository {
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("PINECONE_API_KEY").ok())
            .ok_or_else(|| missing("PINECONE_API_KEY not found in config or environment"))?;
        let index_host = config
            .index_host
            .clone()
            .ok_or_else(|| missing("storage.pinecone.index_host is not set"))?;

        Ok(Self::with_host(api_key, index_host, config.namespace.clone()))
    }

    #[doc(hidden)]
    pub fn with_host(api_key: String, index_host: String, namespace: Option<String>) -> Self {
        PineconeRepository {
            client: Client::new(),
            api_key,
            index_host: index_host.trim_end_matches('/').to_string(),
            namespace,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.index_host, path)
    }

    async fn read_body(response: Response) -> Result<Value> {
        let response = response.error_for_status()?;
        let body: Value = response.json().await?;
        debug!("{:?}", body);
        Ok(body)
    }
}

fn missing(message: &str) -> ColunchError {
    ColunchError::Config(config::ConfigError::NotFound(message.to_string()))
}

/// Recipe stored as vector metadata, taking the vector id when the metadata
/// lacks one
fn recipe_from_metadata(metadata: &Value, vector_id: &str) -> Option<Recipe> {
    let mut metadata = metadata.as_object()?.clone();
    if !metadata.contains_key("id") {
        metadata.insert("id".to_string(), json!(vector_id));
    }
    match serde_json::from_value(Value::Object(metadata)) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            warn!("Skipping vector {} with unreadable metadata: {}", vector_id, e);
            None
        }
    }
}

#[async_trait]
impl RecipeRepository for PineconeRepository {
    fn backend_name(&self) -> &str {
        "pinecone"
    }

    async fn store(&self, recipe: &Recipe, vector: &[f32]) -> Result<()> {
        let mut payload = json!({
            "vectors": [{
                "id": recipe.id,
                "values": vector,
                "metadata": recipe,
            }]
        });
        if let Some(namespace) = &self.namespace {
            payload["namespace"] = json!(namespace);
        }

        let response = self
            .client
            .post(self.url("vectors/upsert"))
            .header("Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Recipe> {
        let mut query = vec![("ids", id)];
        if let Some(namespace) = &self.namespace {
            query.push(("namespace", namespace.as_str()));
        }

        let response = self
            .client
            .get(self.url("vectors/fetch"))
            .header("Api-Key", &self.api_key)
            .query(&query)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        recipe_from_metadata(&body["vectors"][id]["metadata"], id)
            .ok_or_else(|| ColunchError::NotFound(id.to_string()))
    }

    async fn search(&self, vector: &[f32], top_n: usize) -> Result<Vec<Recipe>> {
        let mut payload = json!({
            "vector": vector,
            "topK": top_n,
            "includeMetadata": true,
        });
        if let Some(namespace) = &self.namespace {
            payload["namespace"] = json!(namespace);
        }

        let response = self
            .client
            .post(self.url("query"))
            .header("Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let matches = body["matches"]
            .as_array()
            .ok_or_else(|| ColunchError::MissingField {
                field: "matches",
                body: body.clone(),
            })?;

        // The index already orders matches by score
        Ok(matches
            .iter()
            .filter_map(|m| {
                recipe_from_metadata(&m["metadata"], m["id"].as_str().unwrap_or_default())
            })
            .take(top_n)
            .collect())
    }
}
