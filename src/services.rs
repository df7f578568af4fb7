use tracing::{debug, warn};

use crate::mermaid::normalize;
use crate::model::{GraphNode, NodeKind};
use crate::resolver::{Reference, Resolver};

/// サービスからさらにサービスをたどる段数の上限
pub const MAX_SERVICE_DEPTH: usize = 3;

/// コンポーネントが DI で受け取っているサービスをノードとして追加する
pub fn add_services(resolver: &Resolver, nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let services = collect_services(resolver, &nodes, 0);
    let mut all = nodes;
    all.extend(services);
    normalize(all)
}

fn collect_services(resolver: &Resolver, owners: &[GraphNode], depth: usize) -> Vec<GraphNode> {
    let mut found = Vec::new();
    for owner in owners.iter().filter(|n| n.has_dependencies()) {
        let file = match resolver.source_of(owner) {
            Ok(file) => file,
            Err(e) => {
                debug!("{} のソースを読めません: {}", owner.name, e);
                continue;
            }
        };

        for name in file.injected_types() {
            let source_path = match resolver.reference(&name, &file) {
                Ok(Reference::Local(path)) => Some(path),
                Ok(Reference::External(_)) => None,
                Ok(Reference::Framework(_) | Reference::Missing) => continue,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            found.push(
                GraphNode::new(name, NodeKind::Service, &owner.name)
                    .with_source(source_path)
                    .with_route_path(owner.route_path.clone()),
            );
        }
    }

    let mut found = normalize(found);
    if depth < MAX_SERVICE_DEPTH && !found.is_empty() {
        let deeper = collect_services(resolver, &found, depth + 1);
        found.extend(deeper);
        found = normalize(found);
    }
    found
}
