use crate::core::config::LoggingConfig;
use crate::error::InitProcessError;
use env_logger::{Builder, Target};
use std::fs::File;
use std::io::Write;

pub fn setup_logger(config: &LoggingConfig) -> Result<(), InitProcessError> {
    // 標準出力は BLOCK 行専用なので、ログは標準エラーかファイルに出す
    let target = match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| InitProcessError::LoggerError(format!("{}: {}", path.display(), e)))?;
            Target::Pipe(Box::new(file))
        }
        None => Target::Stderr,
    };

    Builder::new()
        // ログレベルの設定 (RUST_LOG があれば優先)
        .filter_level(config.level_filter()?)
        .parse_default_env()
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(target)
        .try_init()
        .map_err(|e| InitProcessError::LoggerError(e.to_string()))
}
