use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// リモートエンティティレコード
///
/// 属性は不透明なキー・値の集合として運ぶだけで、意味は解釈しない。
#[derive(Debug, Clone)]
pub struct Entity {
    /// エンティティセット名（Web API の複数形名、例: "pluginassemblies"）
    pub entity_set: String,
    /// レコードID（作成前は None）
    pub id: Option<Uuid>,
    /// 属性マップ
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// 新しい空のエンティティを作成
    pub fn new(entity_set: impl Into<String>) -> Self {
        Self {
            entity_set: entity_set.into(),
            id: None,
            attributes: Map::new(),
        }
    }

    /// 属性マップからエンティティを作成（クエリ結果の行）
    pub fn from_attributes(entity_set: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            entity_set: entity_set.into(),
            id: None,
            attributes,
        }
    }

    /// 属性を設定
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) {
        self.attributes.insert(attribute.to_string(), value.into());
    }

    /// 文字列属性を取得
    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).and_then(Value::as_str)
    }

    /// GUID属性を取得
    pub fn get_uuid(&self, attribute: &str) -> Option<Uuid> {
        self.get_str(attribute)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// クエリ結果のレコード集合
#[derive(Debug, Clone, Default)]
pub struct EntityCollection {
    pub entities: Vec<Entity>,
}

impl EntityCollection {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// 先頭のレコードを取得
    ///
    /// 複数件返った場合の順序はリモートストア任せ（先頭採用は仕様）。
    pub fn first(&self) -> Option<&Entity> {
        self.entities.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

/// 構造化クエリ（単一属性の等値フィルタ）
#[derive(Debug, Clone)]
pub struct AttributeQuery {
    /// エンティティセット名
    pub entity_set: String,
    /// 取得する列名（$select相当）
    pub columns: Vec<String>,
    /// フィルタ対象の属性名
    pub attribute: String,
    /// 等値比較する値
    pub value: String,
}

impl AttributeQuery {
    pub fn new(
        entity_set: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_set: entity_set.into(),
            columns: Vec::new(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// 取得列を指定
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// 名前付きリクエスト（Web API アクション）
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// アクション名（例: "AddSolutionComponent"）
    pub action: String,
    /// パラメータ（アクション固有のJSONボディ）
    pub parameters: Value,
}

impl ApiRequest {
    pub fn new(action: impl Into<String>, parameters: Value) -> Self {
        Self {
            action: action.into(),
            parameters,
        }
    }
}

/// Dataverse 組織への認証済みセッションの抽象化
///
/// 仕様上の5プリミティブ（構造化クエリ・FetchXMLクエリ・作成・更新・
/// 名前付きリクエスト実行）だけを公開する。
/// 1呼び出し = 1往復。リトライもタイムアウト制御もこの層は持たず、
/// トランスポートの挙動をそのまま継承する。
#[async_trait]
pub trait CrmConnection: Send + Sync {
    /// 構造化クエリを実行
    async fn retrieve_multiple(&self, query: &AttributeQuery) -> Result<EntityCollection>;

    /// FetchXML文字列でクエリを実行
    async fn fetch(&self, entity_set: &str, fetch_xml: &str) -> Result<EntityCollection>;

    /// エンティティを作成し、採番されたIDを返す
    async fn create(&self, entity: &Entity) -> Result<Uuid>;

    /// エンティティを更新（`entity.id` でアドレス指定）
    async fn update(&self, entity: &Entity) -> Result<()>;

    /// 名前付きリクエストを実行
    async fn execute(&self, request: &ApiRequest) -> Result<Value>;
}
