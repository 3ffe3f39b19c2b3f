//! [`SearchEngineClient`] implementation for Elasticsearch.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::http::response::Response;
use elasticsearch::indices::{IndicesExistsAliasParts, IndicesGetAliasParts, IndicesPutAliasParts};
use elasticsearch::{ScrollParts, SearchParts};
use serde_json::{Value, json};

use crate::engine::{EnginePage, EngineRequest, SearchEngineClient};
use crate::error::{EngineError, EngineResult};

use super::backend::ElasticsearchEngine;
use super::response::{
    classify_failure, concrete_index_behind, paging_context_lost, parse_alias_names, parse_page,
    transport_error,
};

/// Renders a keep-alive in the engine's time-unit syntax.
fn keep_alive_param(keep_alive: Duration) -> String {
    format!("{}s", keep_alive.as_secs().max(1))
}

impl ElasticsearchEngine {
    /// Returns the JSON body of a successful response, or the classified failure.
    async fn read_body(&self, response: Response) -> EngineResult<Value> {
        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body, self.timeout_ms()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::internal(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SearchEngineClient for ElasticsearchEngine {
    fn engine_name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn search_first_page(&self, request: &EngineRequest) -> EngineResult<EnginePage> {
        let parts: Vec<&str> = request.index.parts().collect();
        let keep_alive = request.keep_alive.map(keep_alive_param);

        let mut search = self
            .client()
            .search(SearchParts::Index(&parts))
            .allow_no_indices(true)
            .ignore_unavailable(true)
            .body(request.body.clone());
        if let Some(ref keep_alive) = keep_alive {
            search = search.scroll(keep_alive);
        }

        let response = search
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;
        let body = self.read_body(response).await?;

        Ok(parse_page(&body))
    }

    async fn continue_paging(
        &self,
        handle: &str,
        keep_alive: Duration,
    ) -> EngineResult<EnginePage> {
        let response = self
            .client()
            .scroll(ScrollParts::None)
            .body(json!({
                "scroll": keep_alive_param(keep_alive),
                "scroll_id": handle,
            }))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;
        let body = self.read_body(response).await?;

        if let Some(err) = paging_context_lost(&body) {
            return Err(err);
        }
        Ok(parse_page(&body))
    }

    async fn alias_exists(&self, alias: &str) -> EngineResult<bool> {
        let response = self
            .client()
            .indices()
            .exists_alias(IndicesExistsAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(classify_failure(status, &body, self.timeout_ms()))
            }
        }
    }

    async fn create_alias(&self, concrete_index: &str, alias: &str) -> EngineResult<bool> {
        let response = self
            .client()
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(&[concrete_index], alias))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;
        let body = self.read_body(response).await?;

        Ok(body
            .get("acknowledged")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn get_all_aliases(&self) -> EngineResult<HashSet<String>> {
        let response = self
            .client()
            .indices()
            .get_alias(IndicesGetAliasParts::None)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;
        let body = self.read_body(response).await?;

        Ok(parse_alias_names(&body))
    }

    async fn resolve_concrete_index(&self, index: &str) -> EngineResult<Option<String>> {
        let response = self
            .client()
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[index]))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;

        // 404: no alias by that name, so `index` is taken as the concrete index.
        if response.status_code().as_u16() == 404 {
            return Ok(Some(index.to_string()));
        }
        let body = self.read_body(response).await?;

        Ok(Some(concrete_index_behind(&body, index)))
    }
}
