use super::connection::{ApiRequest, AttributeQuery, CrmConnection, Entity, EntityCollection};
use crate::config::{HttpConfig, Token};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use uuid::Uuid;

/// Dataverse Web API バージョン
const API_VERSION: &str = "v9.2";

/// Dataverse Web API (OData v4) クライアント
///
/// `CrmConnection` の本番実装。1呼び出し = 1往復で、
/// リトライ・バックオフは行わない。タイムアウトは `HttpConfig` 由来。
pub struct WebApiConnection {
    client: Client,
    base_url: String,
    token: Token,
}

impl WebApiConnection {
    /// 新しいWeb API接続を作成（デフォルトHTTP設定）
    pub fn new(base_url: impl Into<String>, token: Token) -> Self {
        Self::with_config(base_url, token, &HttpConfig::default())
    }

    /// HTTP設定を指定して接続を作成
    pub fn with_config(base_url: impl Into<String>, token: Token, config: &HttpConfig) -> Self {
        Self {
            client: config.build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// エンティティセットのコレクションURL
    fn collection_url(&self, entity_set: &str) -> String {
        format!("{}/api/data/{}/{}", self.base_url, API_VERSION, entity_set)
    }

    /// 単一レコードのURL
    fn record_url(&self, entity_set: &str, id: Uuid) -> String {
        format!("{}({})", self.collection_url(entity_set), id)
    }

    /// 標準ヘッダー付きのリクエストを構築
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", self.token.to_bearer())
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Accept", "application/json")
    }

    /// 非成功ステータスを `DeployError::Api` へ変換
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeployError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl CrmConnection for WebApiConnection {
    async fn retrieve_multiple(&self, query: &AttributeQuery) -> Result<EntityCollection> {
        let url = self.collection_url(&query.entity_set);

        let mut params: Vec<(&str, String)> =
            vec![("$filter", odata_filter(&query.attribute, &query.value))];
        if !query.columns.is_empty() {
            params.push(("$select", query.columns.join(",")));
        }

        let response = self
            .request(Method::GET, &url)
            .query(&params)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body: Value = response.json().await?;
        collection_from_json(&query.entity_set, &body)
    }

    async fn fetch(&self, entity_set: &str, fetch_xml: &str) -> Result<EntityCollection> {
        let url = self.collection_url(entity_set);

        let response = self
            .request(Method::GET, &url)
            .query(&[("fetchXml", fetch_xml)])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body: Value = response.json().await?;
        collection_from_json(entity_set, &body)
    }

    async fn create(&self, entity: &Entity) -> Result<Uuid> {
        let url = self.collection_url(&entity.entity_set);

        let response = self
            .request(Method::POST, &url)
            .json(&Value::Object(entity.attributes.clone()))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        // 採番されたIDは OData-EntityId 応答ヘッダーで返る
        let header = response
            .headers()
            .get("OData-EntityId")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DeployError::MissingEntityId(entity.entity_set.clone()))?;

        parse_entity_id_header(header)
    }

    async fn update(&self, entity: &Entity) -> Result<()> {
        let id = entity
            .id
            .ok_or_else(|| DeployError::MissingEntityId(entity.entity_set.clone()))?;
        let url = self.record_url(&entity.entity_set, id);

        let response = self
            .request(Method::PATCH, &url)
            .header("If-Match", "*")
            .json(&Value::Object(entity.attributes.clone()))
            .send()
            .await?;
        Self::check_status(response).await?;

        Ok(())
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        let url = format!("{}/api/data/{}/{}", self.base_url, API_VERSION, request.action);

        let response = self
            .request(Method::POST, &url)
            .json(&request.parameters)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        // 多くのアクションは 204 No Content を返す
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// OData等値フィルタ式を構築（単引用符は二重化でエスケープ）
fn odata_filter(attribute: &str, value: &str) -> String {
    format!("{} eq '{}'", attribute, value.replace('\'', "''"))
}

/// OData-EntityId ヘッダー値からGUIDを取り出す
///
/// 形式: `https://org.crm.dynamics.com/api/data/v9.2/pluginassemblies(<guid>)`
fn parse_entity_id_header(value: &str) -> Result<Uuid> {
    let open = value.rfind('(');
    let close = value.rfind(')');

    let raw = match (open, close) {
        (Some(open), Some(close)) if open + 1 < close => &value[open + 1..close],
        _ => return Err(DeployError::InvalidResponse(value.to_string())),
    };

    Uuid::parse_str(raw).map_err(|_| DeployError::InvalidResponse(value.to_string()))
}

/// OData応答ボディ（`{"value": [...]}`）をEntityCollectionへ変換
fn collection_from_json(entity_set: &str, body: &Value) -> Result<EntityCollection> {
    let rows = body
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| DeployError::InvalidResponse("response has no value array".to_string()))?;

    let entities = rows
        .iter()
        .map(|row| {
            let attributes = row
                .as_object()
                .cloned()
                .ok_or_else(|| DeployError::InvalidResponse("row is not an object".to_string()))?;
            Ok(Entity::from_attributes(entity_set, attributes))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EntityCollection::new(entities))
}

#[cfg(test)]
#[path = "webapi_test.rs"]
mod tests;
