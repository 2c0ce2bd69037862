//! テスト用モックファイルシステム

use super::*;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// テスト用モックファイルシステム
pub struct MockFs {
    files: RwLock<HashMap<String, Vec<u8>>>,
    failing_reads: RwLock<HashSet<String>>,
}

impl MockFs {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            failing_reads: RwLock::new(HashSet::new()),
        }
    }

    /// バイナリファイルを追加
    pub fn add_file_bytes(&self, path: &str, content: &[u8]) {
        self.files
            .write()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
    }

    /// 指定パスの読み込みを失敗させる（権限エラー相当）
    pub fn fail_read(&self, path: &str) {
        self.failing_reads.write().unwrap().insert(path.to_string());
    }
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFs {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let key = path.to_string_lossy().to_string();

        if self.failing_reads.read().unwrap().contains(&key) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )
            .into());
        }

        self.files
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "not found").into()
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap()
            .contains_key(path.to_string_lossy().as_ref())
    }
}
