use thiserror::Error;

/// 配備レイヤー統一エラー型
///
/// 公開ファサード操作（`assembly` モジュール）はこのエラーを外へ返さない。
/// 内部で `?` により伝播させ、各操作の境界で番兵値へ変換する。
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Dataverse API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entity id unavailable for: {0}")]
    MissingEntityId(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, DeployError>;
