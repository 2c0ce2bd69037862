//! テスト用モック接続
//!
//! レコードとソリューション構成要素をメモリ上に保持する意味論的モック。
//! 呼び出し履歴の記録と、プリミティブ単位の失敗注入ができる。

use super::connection::{ApiRequest, AttributeQuery, CrmConnection, Entity, EntityCollection};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::RwLock;
use uuid::Uuid;

/// 失敗注入の対象プリミティブ名
pub const ALL_OPS: [&str; 5] = ["retrieve_multiple", "fetch", "create", "update", "execute"];

/// テスト用モック接続
pub struct MockConnection {
    records: RwLock<Vec<Entity>>,
    components: RwLock<Vec<(Uuid, String)>>,
    failing_ops: RwLock<HashSet<&'static str>>,
    calls: RwLock<Vec<String>>,
    next_create_id: RwLock<Uuid>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            components: RwLock::new(Vec::new()),
            failing_ops: RwLock::new(HashSet::new()),
            calls: RwLock::new(Vec::new()),
            next_create_id: RwLock::new(Uuid::new_v4()),
        }
    }

    /// 既存レコードを追加（ID属性付与済みの行として保持）
    pub fn add_record(&self, entity: Entity) {
        self.records.write().unwrap().push(entity);
    }

    /// 次のcreateで採番するIDを固定
    pub fn set_create_id(&self, id: Uuid) {
        *self.next_create_id.write().unwrap() = id;
    }

    /// 指定プリミティブを失敗させる
    pub fn fail_on(&self, op: &'static str) {
        self.failing_ops.write().unwrap().insert(op);
    }

    /// 全プリミティブを失敗させる（ネットワーク断のシミュレーション）
    pub fn fail_all(&self) {
        let mut failing = self.failing_ops.write().unwrap();
        for op in ALL_OPS {
            failing.insert(op);
        }
    }

    /// 呼び出し履歴（プリミティブ名の列）
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// 登録済みソリューション構成要素
    pub fn components(&self) -> Vec<(Uuid, String)> {
        self.components.read().unwrap().clone()
    }

    fn record_call(&self, op: &'static str) -> Result<()> {
        self.calls.write().unwrap().push(op.to_string());

        if self.failing_ops.read().unwrap().contains(op) {
            return Err(DeployError::Api {
                status: 503,
                message: "simulated connection failure".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// エンティティセット名からID属性名を導出（"pluginassemblies" → "pluginassemblyid"）
fn id_attribute(entity_set: &str) -> String {
    let singular = if let Some(stem) = entity_set.strip_suffix("ies") {
        format!("{stem}y")
    } else {
        entity_set.strip_suffix('s').unwrap_or(entity_set).to_string()
    };

    format!("{singular}id")
}

#[async_trait]
impl CrmConnection for MockConnection {
    async fn retrieve_multiple(&self, query: &AttributeQuery) -> Result<EntityCollection> {
        self.record_call("retrieve_multiple")?;

        let records = self.records.read().unwrap();
        let matches = records
            .iter()
            .filter(|r| {
                r.entity_set == query.entity_set
                    && r.get_str(&query.attribute) == Some(query.value.as_str())
            })
            .cloned()
            .collect();

        Ok(EntityCollection::new(matches))
    }

    async fn fetch(&self, entity_set: &str, fetch_xml: &str) -> Result<EntityCollection> {
        self.record_call("fetch")?;

        // FetchXMLは解釈せず、埋め込まれた両方のキーが登録済み構成要素と
        // 一致する行を返す
        let records = self.records.read().unwrap();
        let components = self.components.read().unwrap();

        let rows: Vec<Entity> = components
            .iter()
            .filter(|(component_id, solution)| {
                let assembly_name = records
                    .iter()
                    .find(|r| r.get_uuid(&id_attribute(&r.entity_set)) == Some(*component_id))
                    .and_then(|r| r.get_str("name"));

                let name_matches = assembly_name
                    .map(|name| fetch_xml.contains(&format!("value='{name}'")))
                    .unwrap_or(false);

                name_matches && fetch_xml.contains(&format!("value='{solution}'"))
            })
            .map(|(component_id, _)| {
                let mut row = Entity::new(entity_set);
                row.set("solutioncomponentid", Uuid::new_v4().to_string());
                row.set("objectid", component_id.to_string());
                row
            })
            .collect();

        Ok(EntityCollection::new(rows))
    }

    async fn create(&self, entity: &Entity) -> Result<Uuid> {
        self.record_call("create")?;

        let id = *self.next_create_id.read().unwrap();

        let mut stored = entity.clone();
        stored.id = Some(id);
        stored.set(&id_attribute(&entity.entity_set), id.to_string());
        self.records.write().unwrap().push(stored);

        Ok(id)
    }

    async fn update(&self, entity: &Entity) -> Result<()> {
        self.record_call("update")?;

        let id = entity
            .id
            .ok_or_else(|| DeployError::MissingEntityId(entity.entity_set.clone()))?;

        let mut records = self.records.write().unwrap();
        let id_attr = id_attribute(&entity.entity_set);

        match records.iter_mut().find(|r| r.get_uuid(&id_attr) == Some(id)) {
            Some(existing) => {
                for (key, value) in &entity.attributes {
                    existing.set(key, value.clone());
                }
                Ok(())
            }
            None => Err(DeployError::Api {
                status: 404,
                message: format!("record not found: {id}"),
            }),
        }
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        self.record_call("execute")?;

        if request.action == "AddSolutionComponent" {
            let component_id = request
                .parameters
                .get("ComponentId")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| {
                    DeployError::InvalidResponse("ComponentId missing".to_string())
                })?;
            let solution = request
                .parameters
                .get("SolutionUniqueName")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    DeployError::InvalidResponse("SolutionUniqueName missing".to_string())
                })?;

            self.components
                .write()
                .unwrap()
                .push((component_id, solution.to_string()));
        }

        Ok(Value::Null)
    }
}
