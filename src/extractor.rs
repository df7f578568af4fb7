use swc_common::Spanned;
use swc_ecma_ast::*;
use tracing::{debug, warn};

use crate::model::{LazyTarget, RouteKind, RouteSpec};
use crate::parser::{prop_key, string_value, unwrap_expr};

/// ガードやメタデータで、グラフには関係しないプロパティ
const IGNORED_KEYS: [&str; 12] = [
    "canActivate",
    "canActivateChild",
    "canDeactivate",
    "canMatch",
    "canLoad",
    "data",
    "resolve",
    "pathMatch",
    "title",
    "providers",
    "outlet",
    "runGuardsAndResolvers",
];

/// ルートオブジェクトから読み取ったプロパティ
#[derive(Default)]
struct RouteFields<'a> {
    path: Option<String>,
    component: Option<String>,
    load_component: Option<LazyTarget>,
    load_children: Option<LazyTarget>,
    children: Option<&'a ArrayLit>,
    redirect_to: Option<String>,
}

/// ルート配列を RouteSpec の列に変換する。
/// `children` は同じ `parent` のまま展開し、親ルート自身より先に並べる
pub fn extract_routes(table: &ArrayLit, parent: &str) -> Vec<RouteSpec> {
    let mut specs = Vec::new();
    extract_into(table, parent, &mut specs);
    specs
}

fn extract_into(table: &ArrayLit, parent: &str, specs: &mut Vec<RouteSpec>) {
    for (i, elem) in table.elems.iter().enumerate() {
        let Some(elem) = elem else {
            continue;
        };
        if elem.spread.is_some() {
            warn!("ルート要素 {} はスプレッド構文のため解析できません", i);
            continue;
        }
        match unwrap_expr(&elem.expr) {
            Expr::Object(obj) => extract_route(obj, parent, specs),
            other => warn!(
                "ルート要素 {} はオブジェクトリテラルではありません: {:?}",
                i,
                other.span()
            ),
        }
    }
}

fn extract_route(obj: &ObjectLit, parent: &str, specs: &mut Vec<RouteSpec>) {
    let fields = read_fields(obj);
    if let Some(children) = fields.children {
        extract_into(children, parent, specs);
    }

    let Some(kind) = classify(&fields) else {
        warn!("ルート {:?} に読み込み対象がありません", fields.path);
        return;
    };
    if kind == RouteKind::Children {
        return;
    }
    specs.push(RouteSpec {
        path: fields.path,
        kind,
        parent: parent.to_string(),
        redirect_to: fields.redirect_to,
    });
}

/// プロパティの組み合わせを RouteKind のどれか一つに振り分ける
fn classify(fields: &RouteFields) -> Option<RouteKind> {
    if let Some(target) = &fields.load_component {
        return Some(RouteKind::LoadComponent(target.clone()));
    }
    if let Some(target) = &fields.load_children {
        return Some(RouteKind::LoadChildren(target.clone()));
    }
    if let Some(name) = &fields.component {
        return Some(RouteKind::Component { name: name.clone() });
    }
    if let Some(to) = &fields.redirect_to {
        return Some(RouteKind::Redirect { to: to.clone() });
    }
    fields.children.map(|_| RouteKind::Children)
}

fn read_fields(obj: &ObjectLit) -> RouteFields<'_> {
    let mut fields = RouteFields::default();

    for prop in &obj.props {
        let PropOrSpread::Prop(prop) = prop else {
            debug!("ルートオブジェクト内のスプレッドを無視します");
            continue;
        };
        match &**prop {
            Prop::KeyValue(KeyValueProp { key, value }) => {
                let Some(key) = prop_key(key) else {
                    continue;
                };
                read_field(&mut fields, &key, value);
            }
            // loadComponent() { return import('…') }
            Prop::Method(MethodProp { key, function }) => {
                let Some(key) = prop_key(key) else {
                    continue;
                };
                let target = function
                    .body
                    .as_ref()
                    .and_then(returned_expr)
                    .and_then(deferred_import);
                match key.as_str() {
                    "loadComponent" => fields.load_component = target,
                    "loadChildren" => fields.load_children = target,
                    _ => {}
                }
            }
            _ => debug!("未対応のプロパティ形式を無視します"),
        }
    }
    fields
}

fn read_field<'a>(fields: &mut RouteFields<'a>, key: &str, value: &'a Expr) {
    match key {
        "path" => fields.path = string_value(value),
        "component" => match unwrap_expr(value) {
            Expr::Ident(ident) => fields.component = Some(ident.sym.to_string()),
            _ => warn!("component の値がクラス参照ではありません"),
        },
        "loadComponent" => {
            fields.load_component = lazy_target(value);
            if fields.load_component.is_none() {
                warn!("loadComponent の式を解釈できません: {:?}", value.span());
            }
        }
        "loadChildren" => {
            fields.load_children = lazy_target(value);
            if fields.load_children.is_none() {
                warn!("loadChildren の式を解釈できません: {:?}", value.span());
            }
        }
        "children" => match unwrap_expr(value) {
            Expr::Array(arr) => fields.children = Some(arr),
            _ => warn!("children が配列リテラルではありません"),
        },
        // 関数で書かれたリダイレクトもリダイレクトとして扱う
        "redirectTo" => {
            fields.redirect_to = Some(string_value(value).unwrap_or_else(|| "<fn>".to_string()))
        }
        key if IGNORED_KEYS.contains(&key) => {}
        other => debug!("未知のプロパティ: {}", other),
    }
}

/// 遅延読み込みの値を解釈する。受け付ける形は次のとおり:
///
/// - `() => import('…')` (ブロック本体の `return import('…')` も可)
/// - 上記に `.then(m => m.X)` を付けたもの
/// - `cond ? import('a') : import('b')` (先頭の分岐を採用)
/// - `cond ? () => import('a') : …` (同上)
/// - 旧式の文字列 `'./path/to/module#ExportName'`
pub fn lazy_target(expr: &Expr) -> Option<LazyTarget> {
    match unwrap_expr(expr) {
        Expr::Arrow(ArrowExpr { body, .. }) => match &**body {
            BlockStmtOrExpr::Expr(expr) => deferred_import(expr),
            BlockStmtOrExpr::BlockStmt(block) => returned_expr(block).and_then(deferred_import),
        },
        Expr::Fn(FnExpr { function, .. }) => function
            .body
            .as_ref()
            .and_then(returned_expr)
            .and_then(deferred_import),
        Expr::Cond(CondExpr { cons, .. }) => lazy_target(cons),
        Expr::Lit(Lit::Str(Str { value, .. })) => {
            let (specifier, export) = match value.split_once('#') {
                Some((specifier, export)) => (specifier, Some(export.to_string())),
                None => (&**value, None),
            };
            Some(LazyTarget {
                specifier: specifier.to_string(),
                export,
            })
        }
        _ => None,
    }
}

/// `import('…')`、`import('…').then(…)`、またはその三項演算子
fn deferred_import(expr: &Expr) -> Option<LazyTarget> {
    match unwrap_expr(expr) {
        Expr::Call(call) => match &call.callee {
            Callee::Import(_) => {
                let specifier = call.args.first().and_then(|arg| string_value(&arg.expr))?;
                Some(LazyTarget {
                    specifier,
                    export: None,
                })
            }
            Callee::Expr(callee) => {
                let Expr::Member(MemberExpr {
                    obj,
                    prop: MemberProp::Ident(method),
                    ..
                }) = unwrap_expr(callee)
                else {
                    return None;
                };
                if &*method.sym != "then" || call.args.len() != 1 {
                    return None;
                }
                let mut target = deferred_import(obj)?;
                target.export = then_export(&call.args[0].expr);
                if target.export.is_none() {
                    debug!("{} の .then からエクスポート名を取り出せません", target.specifier);
                }
                Some(target)
            }
            Callee::Super(_) => None,
        },
        Expr::Cond(CondExpr { cons, .. }) => deferred_import(cons),
        _ => None,
    }
}

/// `m => m.X`、`(m) => m['X']`、`m => { return m.X; }` から X を取り出す
fn then_export(expr: &Expr) -> Option<String> {
    let Expr::Arrow(ArrowExpr { params, body, .. }) = unwrap_expr(expr) else {
        return None;
    };
    let [Pat::Ident(param)] = params.as_slice() else {
        return None;
    };
    let returned = match &**body {
        BlockStmtOrExpr::Expr(expr) => &**expr,
        BlockStmtOrExpr::BlockStmt(block) => returned_expr(block)?,
    };
    let Expr::Member(MemberExpr { obj, prop, .. }) = unwrap_expr(returned) else {
        return None;
    };
    match unwrap_expr(obj) {
        Expr::Ident(obj) if obj.sym == param.id.sym => {}
        _ => return None,
    }
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.to_string()),
        MemberProp::Computed(ComputedPropName { expr, .. }) => string_value(expr),
        MemberProp::PrivateName(_) => None,
    }
}

fn returned_expr(block: &BlockStmt) -> Option<&Expr> {
    block.stmts.iter().find_map(|stmt| match stmt {
        Stmt::Return(ReturnStmt { arg: Some(arg), .. }) => Some(&**arg),
        _ => None,
    })
}
