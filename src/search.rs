use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{InformerError, Result};
use crate::models::SearchEnvelope;

/// The one GraphQL operation this backend issues. Field selection mirrors
/// what the remote informer exposes for its overview table.
const SEARCH_QUERY: &str = r#"
    fragment CoreSearchFields on SearchResult2 {
        aggregations
        total
        unfilteredTotal
        pages
        currentPage
        currentPer
        __typename
    }

    fragment OverviewTableFields on ETF {
        releaseDate
        fundVolume
        shareClassVolume
        totalExpenseRatio
        isDistributing
        replicationMethod
        currency
        preferredPerformanceIdId
        __typename
    }

    query InformerSearchQuery($query: String, $per: Int, $page: Int, $filter: JSON, $sort: JSON) {
        search(q: $query, per: $per, page: $page, filter: $filter, sort: $sort) {
            ...CoreSearchFields
            results {
                isin
                name
                displayName
                preferredPerformanceIdId
                ...OverviewTableFields
                __typename
            }
            __typename
        }
    }
"#;

pub fn default_sort() -> Value {
    json!({"shareClassVolume": "desc"})
}

/// Parse a JSON-encoded sort object handed over by the model. Malformed
/// input falls back to the default sort; it never fails the search.
pub fn parse_sort(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(sort) => sort,
        Err(e) => {
            tracing::warn!("Malformed sort parameter {raw:?}: {e} - using default sort");
            default_sort()
        }
    }
}

/// Client for the remote ETF search service
pub struct EtfSearchClient {
    client: Client,
    endpoint: String,
}

impl EtfSearchClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub(crate) fn request_body(query: &str, entries: u32, sort: &Value) -> Value {
        json!({
            "operationName": "InformerSearchQuery",
            "query": SEARCH_QUERY,
            "variables": {
                "query": query,
                "per": entries,
                "page": 1,
                "filter": {},
                "sort": sort,
            }
        })
    }

    /// Normalize the raw GraphQL response into the envelope handed back to
    /// the assistant. Missing fields default to empty rather than erroring.
    pub(crate) fn normalize(response: &Value) -> SearchEnvelope {
        let search = response
            .pointer("/data/search")
            .cloned()
            .unwrap_or(Value::Null);

        SearchEnvelope {
            aggregations: search
                .get("aggregations")
                .cloned()
                .unwrap_or_else(|| json!({})),
            total: search.get("total").and_then(Value::as_i64).unwrap_or(0),
            pages: search.get("pages").and_then(Value::as_i64).unwrap_or(0),
            current_page: search
                .get("currentPage")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            current_per: search
                .get("currentPer")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            results: search
                .get("results")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Issue the search and return the normalized envelope as a JSON string.
    /// Non-success upstream statuses surface as errors; there is no retry.
    pub async fn search(&self, query: &str, entries: u32, sort: Value) -> Result<String> {
        tracing::info!("Searching ETFs for {query:?} (entries: {entries})");

        let body = Self::request_body(query, entries, &sort);
        let response = self
            .client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Search request failed with status {status}");
            return Err(InformerError::Api { status, message });
        }

        let data: Value = response.json().await?;
        let envelope = Self::normalize(&data);
        tracing::debug!("Search returned {} result(s)", envelope.results.len());
        Ok(serde_json::to_string(&envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_sort_falls_back_to_default() {
        let sort = parse_sort("not json at all {");
        assert_eq!(sort, json!({"shareClassVolume": "desc"}));
    }

    #[test]
    fn valid_sort_passes_through() {
        let sort = parse_sort(r#"{"totalExpenseRatio":"asc"}"#);
        assert_eq!(sort, json!({"totalExpenseRatio": "asc"}));
    }

    #[test]
    fn request_variables_match_contract() {
        let body = EtfSearchClient::request_body("iShares MSCI World", 5, &default_sort());

        assert_eq!(body["operationName"], "InformerSearchQuery");
        assert_eq!(
            body["variables"],
            json!({
                "query": "iShares MSCI World",
                "per": 5,
                "page": 1,
                "filter": {},
                "sort": {"shareClassVolume": "desc"},
            })
        );
        let query = body["query"].as_str().unwrap();
        assert!(query.contains("query InformerSearchQuery"));
        assert!(query.contains("fragment CoreSearchFields on SearchResult2"));
    }

    #[test]
    fn empty_search_normalizes_to_empty_envelope() {
        let envelope = EtfSearchClient::normalize(&json!({"data": {"search": {}}}));

        assert_eq!(envelope.aggregations, json!({}));
        assert_eq!(envelope.total, 0);
        assert_eq!(envelope.pages, 0);
        assert_eq!(envelope.current_page, 0);
        assert_eq!(envelope.current_per, 0);
        assert!(envelope.results.is_empty());
    }

    #[test]
    fn populated_search_normalizes_all_fields() {
        let envelope = EtfSearchClient::normalize(&json!({
            "data": {
                "search": {
                    "aggregations": {"currency": {"EUR": 2}},
                    "total": 2,
                    "unfilteredTotal": 940,
                    "pages": 1,
                    "currentPage": 1,
                    "currentPer": 10,
                    "results": [
                        {"isin": "IE00B4L5Y983", "name": "iShares Core MSCI World"},
                        {"isin": "IE00B0M62Q58", "name": "iShares MSCI World"}
                    ]
                }
            }
        }));

        assert_eq!(envelope.total, 2);
        assert_eq!(envelope.pages, 1);
        assert_eq!(envelope.current_page, 1);
        assert_eq!(envelope.current_per, 10);
        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results[0]["isin"], "IE00B4L5Y983");
        assert_eq!(envelope.aggregations["currency"]["EUR"], 2);
    }

    #[test]
    fn envelope_serializes_with_camel_case_paging_fields() {
        let envelope = EtfSearchClient::normalize(&json!({"data": {"search": {"currentPage": 3, "currentPer": 25}}}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["currentPage"], 3);
        assert_eq!(value["currentPer"], 25);
        assert!(value.get("current_page").is_none());
    }
}
