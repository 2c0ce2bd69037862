//! 配備ログシンク
//!
//! 各操作は成功時に1行のinfo、失敗時に1行のerrorを出力する。
//! シンクはグローバルではなく、操作ごとに明示的に注入する。

use owo_colors::OwoColorize;

/// ログシンクの抽象化
///
/// 操作の結果を人間向けの1行メッセージとして受け取る。
/// 呼び出し側は「見つからなかった」と「確認中に失敗した」を
/// このシンク経由でのみ区別できる。
pub trait DeployLog: Send + Sync {
    /// 操作成功の通知
    fn info(&self, message: &str);

    /// 操作失敗の通知
    fn error(&self, message: &str);
}

/// 標準エラー出力への色付きログ
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLog;

impl ConsoleLog {
    pub fn new() -> Self {
        Self
    }
}

impl DeployLog for ConsoleLog {
    fn info(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }
}

/// tracing イベントへ転送するログ
///
/// ファサードを tracing 計装済みのホストへ組み込む場合に使う。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TracingLog {
    pub fn new() -> Self {
        Self
    }
}

impl DeployLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "crmdeploy", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "crmdeploy", "{message}");
    }
}
