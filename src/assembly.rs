//! プラグインアセンブリ配備操作
//!
//! 検索・作成更新・ソリューション所属確認・ソリューション登録の4操作。
//! どの操作も `DeployError` を外へ返さない。内部の `try_*` 関数が
//! Result で伝播させ、公開関数の境界で番兵値
//! （`None` / `Uuid::nil()` / 偏りのあるbool）へ変換する。
//! 呼び出し側が「存在しない」と「確認に失敗した」を区別する手段は
//! ログシンクだけである。

use crate::crm::{fetchxml, ApiRequest, AttributeQuery, CrmConnection, Entity};
use crate::error::{DeployError, Result};
use crate::fs::FileSystem;
use crate::log::DeployLog;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// ソリューション構成要素種別: プラグインアセンブリ
///
/// プラットフォームスキーマ定義の固定値。互換性のためビット単位で保存する。
pub const COMPONENT_TYPE_PLUGIN_ASSEMBLY: i64 = 91;

/// ソース種別: database（コンテンツをレコード内に保持）
const SOURCE_TYPE_DATABASE: i64 = 0;

const PLUGIN_ASSEMBLY_SET: &str = "pluginassemblies";
const SOLUTION_COMPONENT_SET: &str = "solutioncomponents";

/// アセンブリの分離モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationMode {
    None,
    #[default]
    Sandbox,
}

impl IsolationMode {
    /// プラットフォームのオプション値へ変換（Sandbox → 2、それ以外 → 1）
    pub fn option_value(self) -> i64 {
        match self {
            IsolationMode::Sandbox => 2,
            IsolationMode::None => 1,
        }
    }
}

/// 配備対象アセンブリのローカル記述子
#[derive(Debug, Clone)]
pub struct AssemblyDescriptor {
    /// リモート側ID（`Uuid::nil()` = 未作成、upsertでcreateが走る）
    pub id: Uuid,
    /// コンパイル済みアセンブリのファイルパス
    pub path: PathBuf,
    /// アセンブリ名（配備キー。リモート側での一意性は呼び出し側の前提）
    pub name: String,
    pub culture: String,
    pub version: String,
    pub public_key_token: String,
    pub isolation_mode: IsolationMode,
}

/// 検索で得たリモート側アセンブリの射影
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAssembly {
    pub id: Uuid,
    pub name: String,
    pub version: String,
}

/// AddSolutionComponent アクションのパラメータ
#[derive(Debug, Serialize)]
struct AddSolutionComponent {
    #[serde(rename = "ComponentType")]
    component_type: i64,
    #[serde(rename = "ComponentId")]
    component_id: Uuid,
    #[serde(rename = "SolutionUniqueName")]
    solution_unique_name: String,
    #[serde(rename = "AddRequiredComponents")]
    add_required_components: bool,
}

/// アセンブリを名前で検索
///
/// 見つかれば先頭の1件を返す（複数件時の順序はリモートストア任せ）。
/// 見つからない場合と検索に失敗した場合はどちらも `None`。
pub async fn retrieve_assembly(
    conn: &dyn CrmConnection,
    log: &dyn DeployLog,
    assembly_name: &str,
) -> Option<RemoteAssembly> {
    match try_retrieve(conn, assembly_name).await {
        Ok(Some(found)) => {
            log.info(&format!("Retrieved assembly: {}", found.id));
            Some(found)
        }
        Ok(None) => None,
        Err(err) => {
            log.error(&format!("Error retrieving assembly: {err}"));
            None
        }
    }
}

async fn try_retrieve(
    conn: &dyn CrmConnection,
    assembly_name: &str,
) -> Result<Option<RemoteAssembly>> {
    let query = AttributeQuery::new(PLUGIN_ASSEMBLY_SET, "name", assembly_name)
        .with_columns(&["pluginassemblyid", "name", "version"]);

    let results = conn.retrieve_multiple(&query).await?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let id = first.get_uuid("pluginassemblyid").ok_or_else(|| {
        DeployError::InvalidResponse("assembly row has no pluginassemblyid".to_string())
    })?;

    Ok(Some(RemoteAssembly {
        id,
        name: first.get_str("name").unwrap_or_default().to_string(),
        version: first.get_str("version").unwrap_or_default().to_string(),
    }))
}

enum UpsertOutcome {
    Created(Uuid),
    Updated(Uuid),
}

/// アセンブリを作成または更新
///
/// 記述子のIDが nil なら create（採番された新IDを返す）、
/// 非 nil ならそのIDに対して update（同じIDを返す）。
/// ファイル読み込みを含むあらゆる失敗は `Uuid::nil()` として返る。
/// ファイルが読めない場合、リモート呼び出しは一切発生しない。
pub async fn upsert_assembly(
    conn: &dyn CrmConnection,
    fs: &dyn FileSystem,
    log: &dyn DeployLog,
    descriptor: &AssemblyDescriptor,
) -> Uuid {
    match try_upsert(conn, fs, descriptor).await {
        Ok(UpsertOutcome::Created(id)) => {
            log.info(&format!("Created assembly: {id}"));
            id
        }
        Ok(UpsertOutcome::Updated(id)) => {
            log.info(&format!("Updated assembly: {id}"));
            id
        }
        Err(err) => {
            log.error(&format!("Error creating or updating assembly: {err}"));
            Uuid::nil()
        }
    }
}

async fn try_upsert(
    conn: &dyn CrmConnection,
    fs: &dyn FileSystem,
    descriptor: &AssemblyDescriptor,
) -> Result<UpsertOutcome> {
    let content = fs.read_bytes(&descriptor.path)?;

    let mut entity = Entity::new(PLUGIN_ASSEMBLY_SET);
    entity.set("content", BASE64.encode(&content));
    entity.set("name", descriptor.name.as_str());
    entity.set("culture", descriptor.culture.as_str());
    entity.set("version", descriptor.version.as_str());
    entity.set("publickeytoken", descriptor.public_key_token.as_str());
    entity.set("sourcetype", SOURCE_TYPE_DATABASE);
    entity.set("isolationmode", descriptor.isolation_mode.option_value());

    if descriptor.id.is_nil() {
        let new_id = conn.create(&entity).await?;
        return Ok(UpsertOutcome::Created(new_id));
    }

    entity.id = Some(descriptor.id);
    conn.update(&entity).await?;

    Ok(UpsertOutcome::Updated(descriptor.id))
}

/// アセンブリがソリューションに所属しているか確認
///
/// 確認に失敗した場合は `true` を返す。呼び出し側はこの結果で二重登録を
/// 避けるため、失敗を「未所属」と報告すると重複追加を誘発する。
/// `false` は「エラーなしで0行」が確認できた場合のみ。
pub async fn is_assembly_in_solution(
    conn: &dyn CrmConnection,
    log: &dyn DeployLog,
    assembly_name: &str,
    solution_unique_name: &str,
) -> bool {
    match try_membership(conn, assembly_name, solution_unique_name).await {
        Ok(in_solution) => {
            log.info(&format!(
                "Assembly in solution: {solution_unique_name} - {assembly_name} - {in_solution}"
            ));
            in_solution
        }
        Err(err) => {
            log.error(&format!("Error checking assembly in solution: {err}"));
            true
        }
    }
}

async fn try_membership(
    conn: &dyn CrmConnection,
    assembly_name: &str,
    solution_unique_name: &str,
) -> Result<bool> {
    let query = fetchxml::solution_component_query(assembly_name, solution_unique_name);
    let results = conn.fetch(SOLUTION_COMPONENT_SET, &query).await?;

    Ok(!results.is_empty())
}

/// アセンブリをソリューションへ登録
///
/// 成功で `true`、あらゆる失敗で `false`。
/// 所属確認とこの追加は原子的でない: 並行配備やリトライで重複登録が
/// 起き得るが、この層は補償しない（呼び出し側で直列化すること）。
pub async fn add_assembly_to_solution(
    conn: &dyn CrmConnection,
    log: &dyn DeployLog,
    assembly_id: Uuid,
    solution_unique_name: &str,
) -> bool {
    match try_add(conn, assembly_id, solution_unique_name).await {
        Ok(()) => {
            log.info(&format!(
                "Assembly added to solution: {solution_unique_name} - {assembly_id}"
            ));
            true
        }
        Err(err) => {
            log.error(&format!("Error adding assembly to solution: {err}"));
            false
        }
    }
}

async fn try_add(
    conn: &dyn CrmConnection,
    assembly_id: Uuid,
    solution_unique_name: &str,
) -> Result<()> {
    let parameters = AddSolutionComponent {
        component_type: COMPONENT_TYPE_PLUGIN_ASSEMBLY,
        component_id: assembly_id,
        solution_unique_name: solution_unique_name.to_string(),
        add_required_components: false,
    };

    let request = ApiRequest::new("AddSolutionComponent", serde_json::to_value(&parameters)?);
    conn.execute(&request).await?;

    Ok(())
}

/// アセンブリ配備の一連の流れ
///
/// 名前で既存レコードを検索し、あればそのIDでupsert、なければ新規作成。
/// ソリューション名が与えられた場合は未所属のときだけ登録する。
/// upsert失敗または登録失敗で `None`、成功でリモート側IDを返す。
pub async fn deploy_assembly(
    conn: &dyn CrmConnection,
    fs: &dyn FileSystem,
    log: &dyn DeployLog,
    descriptor: &AssemblyDescriptor,
    solution_unique_name: Option<&str>,
) -> Option<Uuid> {
    let mut descriptor = descriptor.clone();

    if descriptor.id.is_nil() {
        if let Some(existing) = retrieve_assembly(conn, log, &descriptor.name).await {
            descriptor.id = existing.id;
        }
    }

    let id = upsert_assembly(conn, fs, log, &descriptor).await;
    if id.is_nil() {
        return None;
    }

    if let Some(solution) = solution_unique_name {
        if !is_assembly_in_solution(conn, log, &descriptor.name, solution).await
            && !add_assembly_to_solution(conn, log, id, solution).await
        {
            return None;
        }
    }

    Some(id)
}

#[cfg(test)]
#[path = "assembly_test.rs"]
mod tests;
