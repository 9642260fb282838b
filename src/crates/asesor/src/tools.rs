//! Research tools
//!
//! The research agent's two tools: web search for external facts (market
//! prices, competitors, news) and internal document search for material the
//! business has on file. The actual search engines are collaborators behind
//! [`SearchProvider`] and [`DocumentIndex`]; the tools here format results
//! for the model and convert provider failures into error text the agent
//! can read and work around.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use charla_core::{Result, Tool, ToolOutput, ToolRuntime};

/// One web search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Snippet or summary of the page content
    pub content: String,

    /// Source URL
    pub url: String,
}

/// External web search collaborator
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web, returning up to `limit` results
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Internal document index collaborator
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Look up documents relevant to the query
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Web search tool backed by a [`SearchProvider`]
pub struct SearchTool {
    provider: std::sync::Arc<dyn SearchProvider>,
    max_results: usize,
}

impl SearchTool {
    /// Search tool over the given provider
    pub fn new(provider: std::sync::Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            max_results: 3,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Busca en la web información externa: precios de mercado actuales, \
         competidores, reseñas recientes o noticias del sector. No la uses \
         para información interna del negocio."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Consulta de búsqueda"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _runtime: ToolRuntime) -> Result<ToolOutput> {
        let query = args["query"].as_str().unwrap_or_default();
        match self.provider.search(query, self.max_results).await {
            Ok(results) if results.is_empty() => Ok(ToolOutput::Text(
                "No se encontraron resultados relevantes en la búsqueda web.".into(),
            )),
            Ok(results) => {
                let mut formatted = format!("Resultados de la búsqueda web para '{query}':\n");
                for (i, result) in results.iter().enumerate() {
                    formatted.push_str(&format!(
                        "\nResultado {}:\n  Contenido: {}\n  Fuente: {}\n",
                        i + 1,
                        result.content,
                        result.url
                    ));
                }
                Ok(ToolOutput::Text(formatted.trim_end().to_string()))
            }
            Err(err) => {
                warn!(error = %err, "web search failed");
                Ok(ToolOutput::Text(format!(
                    "Se produjo un error al intentar realizar la búsqueda web: {err}"
                )))
            }
        }
    }
}

/// Internal document search tool backed by a [`DocumentIndex`]
pub struct DocumentSearchTool {
    index: std::sync::Arc<dyn DocumentIndex>,
    max_results: usize,
}

impl DocumentSearchTool {
    /// Document search tool over the given index
    pub fn new(index: std::sync::Arc<dyn DocumentIndex>) -> Self {
        Self {
            index,
            max_results: 3,
        }
    }
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Busca en la base de documentos interna del negocio: catálogos, \
         manuales y material propio. Úsala para datos internos precisos, \
         no para información externa de mercado."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Consulta de búsqueda"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _runtime: ToolRuntime) -> Result<ToolOutput> {
        let query = args["query"].as_str().unwrap_or_default();
        match self.index.lookup(query, self.max_results).await {
            Ok(documents) if documents.is_empty() => Ok(ToolOutput::Text(
                "No se encontraron documentos relevantes.".into(),
            )),
            Ok(documents) => {
                let formatted: Vec<String> = documents
                    .iter()
                    .enumerate()
                    .map(|(i, doc)| format!("Documento {}: {}", i + 1, doc))
                    .collect();
                Ok(ToolOutput::Text(formatted.join("\n\n---\n\n")))
            }
            Err(err) => {
                warn!(error = %err, "document lookup failed");
                Ok(ToolOutput::Text("Error al buscar documentos.".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_core::{GraphError, StateRecord};
    use std::sync::Arc;

    struct FixedSearch(Vec<SearchResult>);

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl SearchProvider for BrokenSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Err(GraphError::Execution("dns failure".into()))
        }
    }

    fn runtime() -> ToolRuntime {
        ToolRuntime::new(StateRecord::new())
    }

    #[tokio::test]
    async fn test_search_formats_results() {
        let tool = SearchTool::new(Arc::new(FixedSearch(vec![SearchResult {
            content: "Hay 40 panaderías en Miraflores".into(),
            url: "https://example.pe/panaderias".into(),
        }])));

        let output = tool
            .execute(json!({"query": "panaderías Lima"}), runtime())
            .await
            .unwrap();
        let ToolOutput::Text(text) = output else {
            panic!("expected text")
        };
        assert!(text.contains("Resultado 1"));
        assert!(text.contains("40 panaderías"));
        assert!(text.contains("https://example.pe/panaderias"));
    }

    #[tokio::test]
    async fn test_search_failure_is_error_text_not_an_error() {
        let tool = SearchTool::new(Arc::new(BrokenSearch));
        let output = tool.execute(json!({"query": "x"}), runtime()).await.unwrap();
        let ToolOutput::Text(text) = output else {
            panic!("expected text")
        };
        assert!(text.contains("error"));
        assert!(text.contains("dns failure"));
    }

    struct FixedIndex(Vec<String>);

    #[async_trait]
    impl DocumentIndex for FixedIndex {
        async fn lookup(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_document_search_joins_results() {
        let tool = DocumentSearchTool::new(Arc::new(FixedIndex(vec![
            "Catálogo 2026".into(),
            "Lista de precios".into(),
        ])));

        let output = tool.execute(json!({"query": "precios"}), runtime()).await.unwrap();
        let ToolOutput::Text(text) = output else {
            panic!("expected text")
        };
        assert!(text.contains("Documento 1: Catálogo 2026"));
        assert!(text.contains("---"));
        assert!(text.contains("Documento 2: Lista de precios"));
    }

    #[tokio::test]
    async fn test_empty_results_get_friendly_text() {
        let tool = DocumentSearchTool::new(Arc::new(FixedIndex(vec![])));
        let output = tool.execute(json!({"query": "nada"}), runtime()).await.unwrap();
        let ToolOutput::Text(text) = output else {
            panic!("expected text")
        };
        assert!(text.contains("No se encontraron documentos"));
    }
}
