// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// 解析全体で使うエラー型
///
/// 致命的なのはエントリーファイルの検証と CLI の入出力だけで、
/// それ以外は発生した枝の中でログに記録して解析を続ける。
#[derive(Error, Debug)]
pub enum Error {
    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("tsconfig の読み込みに失敗しました: {0}")]
    Json5(#[from] json5::Error),

    #[error("ディレクトリ探索エラー: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("構文エラー ({}): {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("プロジェクトルート外へのアクセスを拒否しました: {}", .0.display())]
    SecurityViolation(PathBuf),

    #[error("'{name}' の参照先が見つかりません ({})", .file.display())]
    UnresolvedReference { name: String, file: PathBuf },

    #[error("パスが見つかりません: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("メインのルーティングファイルが見つかりませんでした: {}", .0.display())]
    EntryNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Error::UnresolvedReference {
            name: name.into(),
            file: file.into(),
        }
    }
}
