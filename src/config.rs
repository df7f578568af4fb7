// src/config.rs
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::alias::AliasTable;
use crate::error::{Error, Result};

/// アプリ全体のルーティングとみなすファイル名 (優先順)
pub const ROUTES_FILE_NAMES: [&str; 3] = ["app.routes.ts", "app-routing.module.ts", "app-routing.ts"];

/// 探索しないディレクトリ
const SKIPPED_DIRS: [&str; 4] = ["node_modules", "dist", ".angular", ".git"];

/// 解析の入力。CLI が組み立て、解析中は変更しない
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub project_root: PathBuf,
    /// ルートからの相対パスか絶対パス
    pub routes_file: PathBuf,
    pub aliases: AliasTable,
    pub with_services: bool,
    pub with_nested_templates: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfigFile {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

/// tsconfig の `compilerOptions.paths` をエイリアス表として読む。
///
/// 置換先は `baseUrl` (既定は tsconfig のあるディレクトリ) を基準にした絶対パスにする。
/// ファイルが無ければ空の表を返す
pub fn load_tsconfig_paths(path: &Path) -> Result<AliasTable> {
    if !path.is_file() {
        debug!("{:?} がないのでエイリアスなしで解析します", path);
        return Ok(AliasTable::new());
    }
    let text = fs::read_to_string(path)?;
    // tsconfig はコメントと末尾カンマを許すので JSON5 として読む
    let config: TsConfigFile = json5::from_str(&text)?;

    let dir = path.parent().unwrap_or(Path::new("."));
    let base = dir.join(config.compiler_options.base_url.as_deref().unwrap_or("."));
    let base = base.absolutize().map(|p| p.to_path_buf()).unwrap_or(base);

    let table: AliasTable = config
        .compiler_options
        .paths
        .into_iter()
        .map(|(key, targets)| {
            let targets = targets
                .iter()
                .map(|t| base.join(t).to_string_lossy().into_owned())
                .collect();
            (key, targets)
        })
        .collect();
    info!("{} 件のパスエイリアスを読み込みました", table.len());
    Ok(table)
}

/// プロジェクトルート以下からアプリ全体のルーティングファイルを探す。
/// 候補はパス順に並べ、最初のものを使う
pub fn discover_routes_file(root: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(fname) = entry.file_name().to_str() else {
            continue;
        };
        if ROUTES_FILE_NAMES.contains(&fname) {
            candidates.push(entry.into_path());
        }
    }
    candidates.sort();
    match candidates.into_iter().next() {
        Some(path) => {
            info!("ルーティングファイルを検出しました: {:?}", path);
            Ok(path)
        }
        None => Err(Error::EntryNotFound(root.to_path_buf())),
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
