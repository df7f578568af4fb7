// src/lib.rs
//
// Angular のルーティング定義を静的に解析し、コンポーネント・モジュール・サービスの
// つながりを Mermaid の flowchart として描く。

pub mod alias;
pub mod config;
pub mod error;
pub mod extractor;
pub mod mermaid;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod security;
pub mod services;
pub mod template;

use tracing::{debug, info};

pub use config::AnalyzeOptions;
pub use error::{Error, Result};
pub use model::GraphNode;

use alias::AliasResolver;
use resolver::Resolver;

/// ルーティングファイルから重複のないノード列を作る。
///
/// 失敗するのはプロジェクトルートかエントリーファイルが不正なときだけで、
/// 途中の枝で起きた問題はログに残して部分的な結果を返す
pub fn analyze(options: &AnalyzeOptions) -> Result<Vec<GraphNode>> {
    let root = options
        .project_root
        .canonicalize()
        .map_err(|_| Error::PathNotFound(options.project_root.clone()))?;
    let aliases = AliasResolver::from_table(&root, &options.aliases);
    if aliases.is_empty() {
        debug!("パスエイリアスは登録されていません");
    }
    let resolver = Resolver::new(&root, &aliases)?;

    let nodes = resolver.resolve_entry(&options.routes_file)?;
    info!("ルート解析で {} 個のノードを得ました", nodes.len());

    let mut nodes = template::add_template_elements(&resolver, nodes, options.with_nested_templates);
    if options.with_services {
        nodes = services::add_services(&resolver, nodes);
    }
    Ok(mermaid::normalize(nodes))
}

/// ノード列を Mermaid のテキストにする
pub fn render_mermaid(nodes: &[GraphNode]) -> String {
    let mut text = mermaid::render(nodes).join("\n");
    text.push('\n');
    text
}
