//! Dataverse プラグインアセンブリ配備ファサード
//!
//! コンパイル済みプラグインアセンブリを Microsoft Dynamics CRM / Dataverse
//! 組織へ Web API 経由で配備する薄い統合レイヤー。
//!
//! ## 使い方
//!
//! ```ignore
//! let token = Token::from_env().expect("DATAVERSE_TOKEN not set");
//! let conn = WebApiConnection::new("https://org.crm.dynamics.com", token);
//! let log = ConsoleLog::new();
//!
//! let id = assembly::upsert_assembly(&conn, &RealFs, &log, &descriptor).await;
//! ```
//!
//! 4つの操作（検索・作成更新・ソリューション所属確認・ソリューション登録）は
//! いずれもエラーを外へ漏らさない。失敗は各操作の番兵値
//! （`None` / `Uuid::nil()` / 偏りのあるbool）として返り、詳細は注入された
//! ログシンクにのみ記録される。

pub mod assembly;
pub mod config;
pub mod crm;
pub mod error;
pub mod fs;
pub mod log;

pub use assembly::{
    deploy_assembly, AssemblyDescriptor, IsolationMode, RemoteAssembly,
    COMPONENT_TYPE_PLUGIN_ASSEMBLY,
};
pub use config::{AuthProvider, HttpConfig, Token};
pub use crm::{ApiRequest, AttributeQuery, CrmConnection, Entity, EntityCollection, WebApiConnection};
pub use error::{DeployError, Result};
pub use fs::{FileSystem, RealFs};
pub use log::{ConsoleLog, DeployLog, TracingLog};
