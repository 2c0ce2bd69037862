//! HTTP設定と認証プロバイダー

use reqwest::Client;
use std::time::Duration;

/// HTTP設定
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// タイムアウト（秒）
    pub timeout: Option<Duration>,
    /// User-Agent
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: "crmdeploy".to_string(),
        }
    }
}

impl HttpConfig {
    /// reqwest::Client を構築
    pub fn build_client(&self) -> Client {
        let mut builder = Client::builder().user_agent(&self.user_agent);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().unwrap_or_else(|_| Client::new())
    }
}

/// Dataverse 認証トークン
///
/// 組織への認証済みセッションは呼び出し側が用意する。
/// このクレートはトークンの取得フロー（OAuth等）を持たない。
#[derive(Clone)]
pub struct Token(String);

impl Token {
    /// 新しいTokenを作成
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// トークン文字列への参照を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 環境変数 DATAVERSE_TOKEN から取得（空文字列はNone扱い）
    pub fn from_env() -> Option<Self> {
        std::env::var("DATAVERSE_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    /// Bearer認証ヘッダー値を生成
    pub fn to_bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// トークン値をログやデバッグ出力へ漏らさない
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(***)")
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(***)")
    }
}

/// 認証プロバイダー
///
/// トークンの取得元を管理する。
/// 優先順位: 明示的なトークン > 環境変数
#[derive(Debug, Clone, Default)]
pub struct AuthProvider {
    token: Option<Token>,
}

impl AuthProvider {
    /// 新しいAuthProviderを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 明示的にトークンを設定
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Token::new(token));
        self
    }

    /// トークンを解決
    pub fn resolve(&self) -> Option<Token> {
        self.token.clone().or_else(Token::from_env)
    }
}
