// src/alias.rs
use path_absolutize::Absolutize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// tsconfig の `paths` と同じ形: エイリアス → 候補ディレクトリ (先頭を使う)
pub type AliasTable = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
struct AliasEntry {
    /// 末尾の `*` を外したキー (例: "@app/")
    prefix: String,
    /// `*` 付きで登録されたか。付いていなければ完全一致かサブパスだけを受け付ける
    wildcard: bool,
    /// 絶対パス化した置換先
    target: PathBuf,
}

/// パスエイリアスの解決器。長いキーから順に照合するので、
/// 短いエイリアスがより具体的なエイリアスを覆い隠すことはない
#[derive(Debug, Clone)]
pub struct AliasResolver {
    root: PathBuf,
    entries: Vec<AliasEntry>,
}

impl AliasResolver {
    pub fn new(root: &Path) -> Self {
        let root = root
            .absolutize()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| root.to_path_buf());
        AliasResolver {
            root,
            entries: Vec::new(),
        }
    }

    pub fn from_table(root: &Path, table: &AliasTable) -> Self {
        let mut resolver = AliasResolver::new(root);
        resolver.register(table);
        resolver
    }

    /// エイリアス表を登録する。解析開始前に一度だけ呼ぶ
    pub fn register(&mut self, table: &AliasTable) {
        for (key, targets) in table {
            let Some(first) = targets.first() else {
                debug!("エイリアス '{}' に置換先がありません", key);
                continue;
            };
            let wildcard = key.ends_with('*');
            let prefix = key.trim_end_matches('*').to_string();
            if prefix.is_empty() {
                // "*" だけのキーは全指定子に一致してしまう
                debug!("エイリアス '{}' を無視します", key);
                continue;
            }
            let joined = self.root.join(first.trim_end_matches('*'));
            let target = joined
                .absolutize()
                .map(|p| p.to_path_buf())
                .unwrap_or(joined);
            self.entries.push(AliasEntry {
                prefix,
                wildcard,
                target,
            });
        }
        self.entries.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エイリアスで始まる指定子を、プロジェクトルートからの相対パスに書き換える。
    /// どのエイリアスにも一致しなければ None
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let entry = self.entries.iter().find(|e| e.matches(specifier))?;
        let rest = specifier[entry.prefix.len()..].trim_start_matches('/');
        let base = entry
            .target
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.target.clone());
        Some(if rest.is_empty() { base } else { base.join(rest) })
    }
}

impl AliasEntry {
    fn matches(&self, specifier: &str) -> bool {
        if !specifier.starts_with(&self.prefix) {
            return false;
        }
        if self.wildcard || self.prefix.ends_with('/') {
            return true;
        }
        let rest = &specifier[self.prefix.len()..];
        rest.is_empty() || rest.starts_with('/')
    }
}
