//! ファイルシステム抽象化
//!
//! アセンブリファイル読み込みの抽象化レイヤー。
//! テスト時に MockFs を注入して「ファイルが無ければリモート呼び出しが
//! 発生しない」ことを検証できる。

use crate::error::Result;
use std::path::Path;

/// ファイルシステム操作を抽象化するトレイト
///
/// テスト時に MockFs を注入してファイル操作をモック化できる。
/// 本番コードでは RealFs を使用する。
pub trait FileSystem: Send + Sync {
    /// ファイル内容をバイト列として読み込み
    ///
    /// - 存在しない場合は Err
    /// - ディレクトリの場合は Err
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// パスが存在するか（シンボリックリンク追従）
    fn exists(&self, path: &Path) -> bool;
}

/// 本番用ファイルシステム実装
pub struct RealFs;

impl FileSystem for RealFs {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
pub mod mock;

#[cfg(test)]
#[path = "fs_test.rs"]
mod tests;
