use swc_ecma_ast::*;
use tracing::{debug, warn};

use crate::extractor::extract_routes;
use crate::model::{GraphNode, NodeKind};
use crate::parser::{callee_name, prop_key, unwrap_expr, SourceFile, ROUTE_PROVIDERS};
use crate::resolver::{Reference, Resolver, Scope};

/// テンプレートの部品をたどる深さの上限
pub const MAX_TEMPLATE_DEPTH: usize = 5;

/// `@Component` メタデータから読み取った要素
#[derive(Debug, Default)]
struct Metadata {
    /// (名前, 種別) の組。`imports` と `hostDirectives` の静的な参照
    elements: Vec<(String, NodeKind)>,
    /// `provideRouter([…])` などで埋め込まれたルート配列
    route_tables: Vec<ArrayLit>,
}

/// コンポーネントのメタデータを調べてノードを補う。
///
/// - ファイルが export しているクラスが 1 つだけなら、そのクラス名に名前を揃える
/// - メタデータに埋め込まれたルートはルート解析に戻して展開する
/// - `nested` が真なら `imports` / `hostDirectives` の部品もノードにし、さらにたどる
pub fn add_template_elements(
    resolver: &Resolver,
    nodes: Vec<GraphNode>,
    nested: bool,
) -> Vec<GraphNode> {
    expand(resolver, nodes, nested, 0)
}

fn expand(resolver: &Resolver, nodes: Vec<GraphNode>, nested: bool, depth: usize) -> Vec<GraphNode> {
    if depth > MAX_TEMPLATE_DEPTH {
        return nodes;
    }
    nodes
        .into_iter()
        .flat_map(|node| expand_node(resolver, node, nested, depth))
        .collect()
}

fn expand_node(resolver: &Resolver, mut node: GraphNode, nested: bool, depth: usize) -> Vec<GraphNode> {
    let expandable = matches!(
        node.kind,
        NodeKind::Component | NodeKind::Import | NodeKind::HostDirective
    );
    if !expandable || !node.has_dependencies() {
        return vec![node];
    }
    let file = match resolver.source_of(&node) {
        Ok(file) => file,
        Err(e) => {
            debug!("{} のソースを読めません: {}", node.name, e);
            return vec![node];
        }
    };

    if node.kind == NodeKind::Component {
        if let [class] = file.exported_classes().as_slice() {
            node.name = class.clone();
        }
    }

    let Some(object) = file.component_metadata() else {
        return vec![node];
    };
    let metadata = read_metadata(&object, &file);

    let mut routed = Vec::new();
    for table in &metadata.route_tables {
        let specs = extract_routes(table, &node.name);
        routed.extend(resolver.resolve_specs(specs, &Scope::new(&file)));
    }

    let mut elements = Vec::new();
    if nested {
        for (name, kind) in &metadata.elements {
            if let Some(element) = element_node(resolver, &file, name, *kind, &node.name) {
                elements.push(element);
            }
        }
    }

    let mut out = vec![node];
    out.extend(expand(resolver, routed, nested, depth + 1));
    out.extend(expand(resolver, elements, nested, depth + 1));
    out
}

fn element_node(
    resolver: &Resolver,
    file: &SourceFile,
    name: &str,
    kind: NodeKind,
    parent: &str,
) -> Option<GraphNode> {
    let node = GraphNode::new(name, kind, parent);
    match resolver.reference(name, file) {
        Ok(Reference::Local(path)) => Some(node.with_source(Some(path))),
        Ok(Reference::External(_)) => Some(node),
        Ok(Reference::Framework(_)) => None,
        Ok(Reference::Missing) => {
            let mut node = node;
            node.skip_dependencies = true;
            Some(node)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

fn read_metadata(object: &ObjectLit, file: &SourceFile) -> Metadata {
    let mut metadata = Metadata::default();
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            continue;
        };
        let Prop::KeyValue(KeyValueProp { key, value }) = &**prop else {
            continue;
        };
        let Some(key) = prop_key(key) else {
            continue;
        };
        let Expr::Array(list) = unwrap_expr(value) else {
            continue;
        };
        let kind = match key.as_str() {
            "imports" => NodeKind::Import,
            "hostDirectives" => NodeKind::HostDirective,
            "providers" => {
                collect_route_tables(list, file, &mut metadata.route_tables);
                continue;
            }
            _ => continue,
        };

        collect_route_tables(list, file, &mut metadata.route_tables);
        for entry in list.elems.iter().flatten() {
            match unwrap_expr(&entry.expr) {
                Expr::Ident(ident) => metadata.elements.push((ident.sym.to_string(), kind)),
                // { directive: MyDirective, inputs: [...] }
                Expr::Object(obj) => {
                    if let Some(name) = directive_name(obj) {
                        metadata.elements.push((name, kind));
                    }
                }
                // RouterModule.forChild([…]) などはルート配列として上で集めたので部品にはしない
                Expr::Call(_) => {}
                _ => {}
            }
        }
    }
    metadata
}

fn directive_name(obj: &ObjectLit) -> Option<String> {
    obj.props.iter().find_map(|prop| {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let Prop::KeyValue(KeyValueProp { key, value }) = &**prop else {
            return None;
        };
        if prop_key(key).as_deref() != Some("directive") {
            return None;
        }
        match unwrap_expr(value) {
            Expr::Ident(ident) => Some(ident.sym.to_string()),
            _ => None,
        }
    })
}

/// `provideRouter([…])` / `RouterModule.forChild(routes)` の引数を集める
fn collect_route_tables(list: &ArrayLit, file: &SourceFile, tables: &mut Vec<ArrayLit>) {
    for entry in list.elems.iter().flatten() {
        let Expr::Call(call) = unwrap_expr(&entry.expr) else {
            continue;
        };
        if !callee_name(&call.callee).is_some_and(|name| ROUTE_PROVIDERS.contains(&name)) {
            continue;
        }
        match call.args.first().map(|arg| unwrap_expr(&arg.expr)) {
            Some(Expr::Array(arr)) => tables.push(arr.clone()),
            Some(Expr::Ident(ident)) => match file.array_variable(&ident.sym) {
                Some(arr) => tables.push(arr),
                None => debug!("ルート変数 '{}' がこのファイルにありません", ident.sym),
            },
            _ => {}
        }
    }
}
