//! Dataverse 接続ハンドルとワイヤ型
//!
//! ベンダー側のオブジェクトモデルは不透明な統合点として扱う。
//! このモジュールはクエリ・CRUD・名前付きリクエストの5プリミティブだけを
//! 抽象化し、属性の意味には立ち入らない。

pub mod fetchxml;

mod connection;
mod webapi;

pub use connection::{ApiRequest, AttributeQuery, CrmConnection, Entity, EntityCollection};
pub use webapi::WebApiConnection;

#[cfg(test)]
pub mod mock;
