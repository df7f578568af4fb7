// src/mermaid.rs
//
// ノード列の重複排除と Mermaid flowchart への変換。

use std::collections::HashSet;

use crate::model::{GraphNode, NodeKind, SubgraphRole};

/// 図の向きの宣言 (出力の 1 行目)
pub const FLOW_DIRECTION: &str = "flowchart LR";

/// 辺の種類。(lazy, kind) の組から決まる
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    EagerComponent,
    LazyComponent,
    Service,
    Import,
    HostDirective,
}

impl Edge {
    pub fn of(node: &GraphNode) -> Self {
        if node.lazy {
            return Edge::LazyComponent;
        }
        match node.kind {
            NodeKind::Service => Edge::Service,
            NodeKind::Import => Edge::Import,
            NodeKind::HostDirective => Edge::HostDirective,
            NodeKind::Component | NodeKind::Module | NodeKind::Route => Edge::EagerComponent,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Edge::EagerComponent => "--o",
            Edge::LazyComponent => "-.-o",
            Edge::Service => "---",
            Edge::Import => "-->",
            Edge::HostDirective => "-.->",
        }
    }
}

/// (name, parent) が同じノードは最初のものだけを残す。
///
/// 開始印か終了印のどちらかが既に出現しているサブグラフは、中身ごと捨てる。
/// 捨てたまとまりの終了印 (遅延エッジ) は、未出現なら通常のエッジとして残す。
/// 開始と終了の対応はこれで崩れない
pub fn normalize(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let partners = matching_ends(&nodes);
    let keys: Vec<(String, Option<String>)> = nodes
        .iter()
        .map(|n| (n.name.clone(), n.parent.clone()))
        .collect();

    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut out = Vec::with_capacity(nodes.len());
    let mut skip_to: Option<usize> = None;

    for (i, mut node) in nodes.into_iter().enumerate() {
        if let Some(end) = skip_to {
            if i < end {
                continue;
            }
            skip_to = None;
            node.subgraph = SubgraphRole::None;
            if seen.insert(keys[i].clone()) {
                out.push(node);
            }
            continue;
        }

        match (node.subgraph, partners[i]) {
            (SubgraphRole::Start, Some(end)) => {
                let fresh = !seen.contains(&keys[i]) && !seen.contains(&keys[end]) && keys[i] != keys[end];
                if fresh {
                    seen.insert(keys[i].clone());
                    out.push(node);
                } else {
                    skip_to = Some(end);
                }
            }
            // 開いているまとまりの終了印。開始時に未出現を確かめてある
            (SubgraphRole::End, Some(_)) => {
                seen.insert(keys[i].clone());
                out.push(node);
            }
            // 対応の取れない印は通常のノードとして扱う
            (SubgraphRole::Start | SubgraphRole::End, None) => {
                node.subgraph = SubgraphRole::None;
                if seen.insert(keys[i].clone()) {
                    out.push(node);
                }
            }
            (SubgraphRole::None, _) => {
                if seen.insert(keys[i].clone()) {
                    out.push(node);
                }
            }
        }
    }
    out
}

/// 開始印と終了印の位置を互いに引けるようにする
fn matching_ends(nodes: &[GraphNode]) -> Vec<Option<usize>> {
    let mut partners = vec![None; nodes.len()];
    let mut open = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.subgraph {
            SubgraphRole::Start => open.push(i),
            SubgraphRole::End => {
                if let Some(start) = open.pop() {
                    partners[start] = Some(i);
                    partners[i] = Some(start);
                }
            }
            SubgraphRole::None => {}
        }
    }
    partners
}

/// Mermaid の行に変換する
pub fn render(nodes: &[GraphNode]) -> Vec<String> {
    let mut lines = vec![FLOW_DIRECTION.to_string()];
    for node in nodes {
        match node.subgraph {
            SubgraphRole::Start => {
                let title = node.parent.as_deref().unwrap_or(&node.name);
                let id = format!("{}_{}", title, node.name);
                lines.push(format!(
                    "subgraph {}[{}]",
                    sanitize_id(&id),
                    sanitize_label(title)
                ));
                lines.push("direction LR".to_string());
            }
            SubgraphRole::End => {
                lines.push("end".to_string());
                lines.push(edge_line(node));
            }
            SubgraphRole::None => lines.push(edge_line(node)),
        }
    }
    lines
}

fn edge_line(node: &GraphNode) -> String {
    let label = sanitize_label(&node.name);
    let shape = match node.kind {
        NodeKind::Service => format!("{{{{{}}}}}", label),
        NodeKind::Import => format!("([{}])", label),
        NodeKind::HostDirective => format!("[[{}]]", label),
        NodeKind::Component | NodeKind::Module | NodeKind::Route => format!("({})", label),
    };
    let target = format!("{}{}", sanitize_id(&node.name), shape);
    match &node.parent {
        Some(parent) => format!("{} {} {}", sanitize_id(parent), Edge::of(node).glyph(), target),
        None => target,
    }
}

/// `[A-Za-z0-9_]` 以外を `_` に置き換える
pub fn sanitize_id(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// 引用符で囲み、`"` `<` `>` をエスケープする
pub fn sanitize_label(text: &str) -> String {
    let escaped = text
        .replace('"', "#quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("\"{}\"", escaped)
}
