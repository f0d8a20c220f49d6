use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::search::{self, EtfSearchClient};
use crate::tools::Tool;

/// Arguments the model supplies when invoking `search_etfs`
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchEtfsParams {
    #[schemars(description = "Free-text search over ETF names, ISINs and issuers")]
    pub query: String,

    #[schemars(description = "Maximum number of securities to return")]
    pub entries: Option<u32>,

    #[schemars(
        description = "JSON-encoded sort object, e.g. {\"totalExpenseRatio\": \"asc\"}. Defaults to descending share class volume."
    )]
    pub sort: Option<String>,
}

pub struct SearchEtfsTool {
    client: EtfSearchClient,
    default_entries: u32,
}

impl SearchEtfsTool {
    pub fn new(client: EtfSearchClient, default_entries: u32) -> Self {
        Self {
            client,
            default_entries,
        }
    }
}

#[async_trait]
impl Tool for SearchEtfsTool {
    fn name(&self) -> &'static str {
        "search_etfs"
    }

    fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": "Search the ETF universe and return matching securities with volume, fee and replication data",
                "parameters": schemars::schema_for!(SearchEtfsParams).to_value(),
            }
        })
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let params: SearchEtfsParams = serde_json::from_value(arguments)?;
        let entries = params.entries.unwrap_or(self.default_entries);
        let sort = params
            .sort
            .as_deref()
            .map(search::parse_sort)
            .unwrap_or_else(search::default_sort);

        self.client.search(&params.query, entries, sort).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_deserialize_from_model_arguments() {
        let params: SearchEtfsParams = serde_json::from_str(
            r#"{"query": "iShares MSCI World", "entries": 5, "sort": "{\"fundVolume\":\"desc\"}"}"#,
        )
        .unwrap();

        assert_eq!(params.query, "iShares MSCI World");
        assert_eq!(params.entries, Some(5));
        assert_eq!(params.sort.as_deref(), Some(r#"{"fundVolume":"desc"}"#));
    }

    #[test]
    fn params_require_only_the_query() {
        let params: SearchEtfsParams =
            serde_json::from_str(r#"{"query": "global clean energy"}"#).unwrap();

        assert!(params.entries.is_none());
        assert!(params.sort.is_none());
    }

    #[test]
    fn definition_declares_a_function_tool_with_schema() {
        let tool = SearchEtfsTool::new(EtfSearchClient::new("http://localhost/graphql".into()), 10);
        let definition = tool.definition();

        assert_eq!(definition["type"], "function");
        assert_eq!(definition["function"]["name"], "search_etfs");
        let schema = &definition["function"]["parameters"];
        assert!(schema["properties"].get("query").is_some());
        assert!(schema["properties"].get("entries").is_some());
        assert!(schema["properties"].get("sort").is_some());
    }
}
