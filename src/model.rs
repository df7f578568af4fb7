// src/model.rs
use serde::Serialize;
use std::path::PathBuf;

/// `loadComponent` / `loadChildren` の遅延 import 先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyTarget {
    /// `import("…")` に書かれたモジュール指定子 (例: "./feature/feature.routes")
    pub specifier: String,

    /// `.then(m => m.X)` で取り出しているエクスポート名
    pub export: Option<String>,
}

impl LazyTarget {
    /// 表示名。`.then` が無ければモジュール指定子そのものを使う
    pub fn display_name(&self) -> &str {
        self.export.as_deref().unwrap_or(&self.specifier)
    }
}

/// ルートオブジェクト 1 件をどう扱うかの分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// `component: HomeComponent`
    Component { name: String },
    /// `loadComponent: () => import(…)`
    LoadComponent(LazyTarget),
    /// `loadChildren: () => import(…)`
    LoadChildren(LazyTarget),
    /// `redirectTo: '…'` のみ。読み込む対象は無い
    Redirect { to: String },
    /// `children` だけを持つグループ
    Children,
}

/// ルート宣言 1 件を正規化した中間表現
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    /// ルートのパス (例: "home", "" など)
    pub path: Option<String>,

    pub kind: RouteKind,

    /// このルートを持つコンテキスト (ルート名・モジュール名) の名前
    pub parent: String,

    /// 同じオブジェクトに `redirectTo` も書かれていたか
    pub redirect_to: Option<String>,
}

impl RouteSpec {
    /// 遅延読み込み先の表示名
    pub fn component_name(&self) -> Option<&str> {
        match &self.kind {
            RouteKind::Component { name } => Some(name),
            RouteKind::LoadComponent(target) | RouteKind::LoadChildren(target) => {
                Some(target.display_name())
            }
            RouteKind::Redirect { .. } | RouteKind::Children => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Component,
    Module,
    Route,
    Service,
    Import,
    HostDirective,
}

/// モジュールのまとまりを図上で囲むための印
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SubgraphRole {
    Start,
    End,
    #[default]
    None,
}

/// 依存グラフの頂点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// 図に表示する名前
    pub name: String,

    pub kind: NodeKind,

    /// プロジェクトルートからの相対パス (拡張子なし)。外部パッケージや未解決なら None
    pub source_path: Option<PathBuf>,

    /// このノードにたどり着いたルートのパス
    pub route_path: Option<String>,

    /// 親ノードの名前
    pub parent: Option<String>,

    /// 遅延読み込みでたどり着いたか
    pub lazy: bool,

    pub subgraph: SubgraphRole,

    /// 構造上の目印で、これ以上依存をたどらない
    pub skip_dependencies: bool,
}

impl GraphNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, parent: impl Into<String>) -> Self {
        GraphNode {
            name: name.into(),
            kind,
            source_path: None,
            route_path: None,
            parent: Some(parent.into()),
            lazy: false,
            subgraph: SubgraphRole::None,
            skip_dependencies: false,
        }
    }

    pub fn with_source(mut self, source_path: Option<PathBuf>) -> Self {
        self.source_path = source_path;
        self
    }

    pub fn with_route_path(mut self, route_path: Option<String>) -> Self {
        self.route_path = route_path;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn structural(mut self, role: SubgraphRole) -> Self {
        self.subgraph = role;
        self.skip_dependencies = true;
        self
    }

    /// 重複排除のキー。同じ名前でも親が違えば別の頂点として扱う
    pub fn identity(&self) -> (&str, Option<&str>) {
        (&self.name, self.parent.as_deref())
    }

    /// サービスやテンプレートの依存を調べる対象か
    pub fn has_dependencies(&self) -> bool {
        !self.skip_dependencies
            && self.source_path.is_some()
            && matches!(
                self.kind,
                NodeKind::Component | NodeKind::Service | NodeKind::Import | NodeKind::HostDirective
            )
    }
}
