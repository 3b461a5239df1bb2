use thiserror::Error;

/// 起動時の致命的なエラー。標準エラーに出力して終了する
#[derive(Error, Debug)]
pub enum InitProcessError {
    #[error("フィルタが長すぎます (最大 {max} バイト)")]
    FilterTooLong { max: usize },

    #[error("フィルタの構文エラーです")]
    InvalidFilterSyntax,

    #[error("迂回デバイスのオープンに失敗しました ({0})")]
    OpenFailed(i32),

    #[error("このプラットフォームでは迂回デバイスを利用できません")]
    UnsupportedPlatform,

    #[error("応答テンプレートの作成に失敗しました: {0}")]
    Template(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ロガーのセットアップに失敗しました: {0}")]
    LoggerError(String),
}
