use thiserror::Error;

/// 受信・送信ループ中のエラー。いずれもログに残してループを継続する
#[derive(Error, Debug)]
pub enum DivertError {
    #[error("パケットの受信に失敗しました: {0}")]
    Recv(String),

    #[error("パケットの送信に失敗しました: {0}")]
    Send(String),

    #[error("応答パケットの構築に失敗しました: {0}")]
    Build(&'static str),
}

pub type DivertResult<T> = Result<T, DivertError>;
