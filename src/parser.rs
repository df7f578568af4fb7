use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// ルーティング情報を提供する関数 (`provideRouter(…)` / `RouterModule.forRoot(…)` など)
pub const ROUTE_PROVIDERS: [&str; 3] = ["provideRouter", "forRoot", "forChild"];

/// 1 ファイル分の構文木。問い合わせはすべて構文木の上で行い、
/// 文字列リテラルやコメントの中身を宣言と取り違えることはない
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    module: Module,
}

impl SourceFile {
    /// TypeScript としてパースする。`path` はエラー表示用
    pub fn parse(src: &str, path: &Path) -> Result<Self> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Real(path.to_path_buf()), src.to_string());

        // TypeScript構文でパースする設定
        let syntax = Syntax::Typescript(TsConfig {
            tsx: false,
            decorators: true,
            dts: false,
            no_early_errors: true,
            disallow_ambiguous_jsx_like: true,
        });

        let lexer = Lexer::new(
            syntax,
            Default::default(), // es version
            StringInput::from(&*fm),
            None,
        );

        let mut parser = SwcParser::new_from(lexer);
        let module = parser
            .parse_module()
            .map_err(|e| Error::syntax(path, format!("{:?}", e.kind())))?;

        let recovered = parser.take_errors();
        if !recovered.is_empty() {
            debug!("{:?}: 回復可能な構文エラー {} 件", path, recovered.len());
        }

        Ok(SourceFile {
            path: path.to_path_buf(),
            module,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル内で直接宣言されているルート配列を出現順に返す
    pub fn route_tables(&self) -> Vec<ArrayLit> {
        let mut visitor = RouteTableVisitor::default();
        self.module.visit_with(&mut visitor);
        visitor.into_tables()
    }

    /// ファイル内で宣言された配列変数 (`const routes = […]` など) を名前で引く
    pub fn array_variable(&self, name: &str) -> Option<ArrayLit> {
        let mut visitor = RouteTableVisitor::default();
        self.module.visit_with(&mut visitor);
        visitor.arrays.remove(name).map(|(_, arr)| arr)
    }

    /// ローカル名 `local` を導入している import 文のモジュール指定子
    pub fn import_specifier(&self, local: &str) -> Option<String> {
        self.imports().find_map(|decl| {
            decl.specifiers
                .iter()
                .any(|spec| local_name(spec) == local)
                .then(|| decl.src.value.to_string())
        })
    }

    /// import 文のモジュール指定子をすべて出現順に返す
    pub fn import_specifiers(&self) -> Vec<String> {
        self.imports().map(|decl| decl.src.value.to_string()).collect()
    }

    /// このファイルでクラス `name` が宣言されているか
    pub fn declares_class(&self, name: &str) -> bool {
        self.top_level_classes().any(|(ident, _)| ident == Some(name))
    }

    /// export されているクラス名
    pub fn exported_classes(&self) -> Vec<String> {
        self.module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                    decl: Decl::Class(class),
                    ..
                })) => Some(class.ident.sym.to_string()),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                    decl: DefaultDecl::Class(ClassExpr { ident: Some(ident), .. }),
                    ..
                })) => Some(ident.sym.to_string()),
                _ => None,
            })
            .collect()
    }

    /// `@Component({…})` (または `@Directive({…})`) に渡されたメタデータ
    pub fn component_metadata(&self) -> Option<ObjectLit> {
        self.top_level_classes().find_map(|(_, class)| {
            class.decorators.iter().find_map(|decorator| {
                let Expr::Call(call) = &*decorator.expr else {
                    return None;
                };
                let name = callee_name(&call.callee)?;
                if name != "Component" && name != "Directive" {
                    return None;
                }
                match call.args.first().map(|arg| unwrap_expr(&arg.expr)) {
                    Some(Expr::Object(obj)) => Some(obj.clone()),
                    _ => None,
                }
            })
        })
    }

    /// DI で受け取っている型名。`inject(X)` の出現順、続いてコンストラクタ引数の型の順で重複なし
    pub fn injected_types(&self) -> Vec<String> {
        let mut visitor = InjectionVisitor::default();
        self.module.visit_with(&mut visitor);

        let mut names: Vec<String> = Vec::new();
        for name in visitor.injected.into_iter().chain(visitor.constructor_params) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.module.body.iter().filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some(decl),
            _ => None,
        })
    }

    fn top_level_classes(&self) -> impl Iterator<Item = (Option<&str>, &Class)> {
        self.module.body.iter().filter_map(|item| match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Class(class)))
            | ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                decl: Decl::Class(class),
                ..
            })) => Some((Some(&*class.ident.sym), &*class.class)),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                decl: DefaultDecl::Class(ClassExpr { ident, class, .. }),
                ..
            })) => Some((ident.as_ref().map(|i| &*i.sym), &**class)),
            _ => None,
        })
    }
}

/// AST をトラバースしてルート配列を集める Visitor
#[derive(Default)]
struct RouteTableVisitor {
    /// ルート配列とみなした配列 (開始位置つき)
    tables: Vec<(u32, ArrayLit)>,
    /// 変数名とその配列リテラルのマッピング
    arrays: HashMap<String, (u32, ArrayLit)>,
    /// `forRoot(routes)` のように変数で渡されたもの
    referenced: Vec<String>,
}

impl RouteTableVisitor {
    fn push(&mut self, arr: &ArrayLit) {
        self.tables.push((arr.span.lo.0, arr.clone()));
    }

    fn into_tables(mut self) -> Vec<ArrayLit> {
        for name in std::mem::take(&mut self.referenced) {
            match self.arrays.get(&name) {
                Some((lo, arr)) => self.tables.push((*lo, arr.clone())),
                None => debug!("変数 '{}' の定義がこのファイルに見つかりません", name),
            }
        }
        self.tables.sort_by_key(|(lo, _)| *lo);
        self.tables.dedup_by_key(|(lo, _)| *lo);
        self.tables.into_iter().map(|(_, arr)| arr).collect()
    }
}

impl Visit for RouteTableVisitor {
    /// 変数宣言をキャッチして、ルート配列らしいものを記録する
    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        for declarator in &var_decl.decls {
            let Pat::Ident(BindingIdent { id, type_ann }) = &declarator.name else {
                continue;
            };
            let Some(init) = &declarator.init else {
                continue;
            };
            let Some((arr, asserted)) = route_array(init) else {
                continue;
            };

            let var_name = id.sym.to_string();
            let annotated = type_ann.as_ref().is_some_and(|ann| is_routes_type(&ann.type_ann));
            let named = var_name.to_lowercase().contains("route") && looks_like_routes(arr);
            if annotated || asserted || named {
                debug!("ルート配列の変数宣言発見: {} ({} 要素)", var_name, arr.elems.len());
                self.push(arr);
            }
            self.arrays.insert(var_name, (arr.span.lo.0, arr.clone()));
        }

        // 子ノードも訪問
        var_decl.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, export: &ExportDefaultExpr) {
        if let Some((arr, asserted)) = route_array(&export.expr) {
            if asserted || looks_like_routes(arr) {
                self.push(arr);
            }
        }
        export.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        let is_provider = callee_name(&call.callee)
            .is_some_and(|name| ROUTE_PROVIDERS.contains(&name));
        if is_provider {
            match call.args.first().map(|arg| unwrap_expr(&arg.expr)) {
                // 直接配列リテラルの場合
                Some(Expr::Array(arr)) => self.push(arr),
                // 変数参照の場合
                Some(Expr::Ident(ident)) => self.referenced.push(ident.sym.to_string()),
                other => debug!("ルート提供関数の第一引数が配列でも変数でもありません: {:?}", other.map(|e| e.span())),
            }
        }
        call.visit_children_with(self);
    }
}

/// DI の対象を集める Visitor
#[derive(Default)]
struct InjectionVisitor {
    injected: Vec<String>,
    constructor_params: Vec<String>,
}

impl Visit for InjectionVisitor {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if callee_name(&call.callee) == Some("inject") && call.args.len() == 1 {
            if let Expr::Ident(ident) = &*call.args[0].expr {
                self.injected.push(ident.sym.to_string());
            }
        }
        call.visit_children_with(self);
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        for param in &ctor.params {
            let binding = match param {
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(binding) => Some(binding),
                    TsParamPropParam::Assign(assign) => match &*assign.left {
                        Pat::Ident(binding) => Some(binding),
                        _ => None,
                    },
                },
                ParamOrTsParamProp::Param(Param { pat: Pat::Ident(binding), .. }) => Some(binding),
                ParamOrTsParamProp::Param(_) => None,
            };
            if let Some(name) = binding.and_then(|b| b.type_ann.as_ref()).and_then(|ann| type_ref_name(&ann.type_ann)) {
                self.constructor_params.push(name);
            }
        }
        ctor.visit_children_with(self);
    }
}

/// 括弧・型アサーション (`as` / `satisfies` / `!`) を剥がす
pub fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(ParenExpr { expr, .. })
        | Expr::TsAs(TsAsExpr { expr, .. })
        | Expr::TsSatisfies(TsSatisfiesExpr { expr, .. })
        | Expr::TsConstAssertion(TsConstAssertion { expr, .. })
        | Expr::TsNonNull(TsNonNullExpr { expr, .. }) => unwrap_expr(expr),
        other => other,
    }
}

/// 文字列リテラル、または埋め込み式のないテンプレートリテラルの値
pub fn string_value(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Str(Str { value, .. })) => Some(value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() && tpl.quasis.len() == 1 => {
            let quasi = &tpl.quasis[0];
            Some(quasi.cooked.as_ref().unwrap_or(&quasi.raw).to_string())
        }
        _ => None,
    }
}

/// オブジェクトのキー名 (識別子か文字列)
pub fn prop_key(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(Str { value, .. }) => Some(value.to_string()),
        _ => None,
    }
}

/// `foo(…)` なら "foo"、`RouterModule.forRoot(…)` なら "forRoot"
pub fn callee_name(callee: &Callee) -> Option<&str> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    match unwrap_expr(expr) {
        Expr::Ident(ident) => Some(&*ident.sym),
        Expr::Member(MemberExpr { prop: MemberProp::Ident(prop), .. }) => Some(&*prop.sym),
        _ => None,
    }
}

fn local_name(spec: &ImportSpecifier) -> &str {
    match spec {
        ImportSpecifier::Named(named) => &*named.local.sym,
        ImportSpecifier::Default(default) => &*default.local.sym,
        ImportSpecifier::Namespace(namespace) => &*namespace.local.sym,
    }
}

/// 配列リテラルを取り出す。`satisfies Routes` / `as Routes` が付いていれば真を返す
fn route_array(expr: &Expr) -> Option<(&ArrayLit, bool)> {
    match expr {
        Expr::Array(arr) => Some((arr, false)),
        Expr::TsSatisfies(TsSatisfiesExpr { expr, type_ann, .. })
        | Expr::TsAs(TsAsExpr { expr, type_ann, .. }) => {
            let (arr, asserted) = route_array(expr)?;
            Some((arr, asserted || is_routes_type(type_ann)))
        }
        Expr::Paren(ParenExpr { expr, .. })
        | Expr::TsConstAssertion(TsConstAssertion { expr, .. }) => route_array(expr),
        _ => None,
    }
}

/// `Routes` または `Route[]`
fn is_routes_type(ty: &TsType) -> bool {
    match ty {
        TsType::TsTypeRef(_) => type_ref_name(ty).as_deref() == Some("Routes"),
        TsType::TsArrayType(TsArrayType { elem_type, .. }) => {
            type_ref_name(elem_type).as_deref() == Some("Route")
        }
        _ => false,
    }
}

fn type_ref_name(ty: &TsType) -> Option<String> {
    match ty {
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            ..
        }) => Some(ident.sym.to_string()),
        _ => None,
    }
}

/// 空配列か、オブジェクトリテラルを要素に持つ配列
fn looks_like_routes(arr: &ArrayLit) -> bool {
    arr.elems.is_empty()
        || arr
            .elems
            .iter()
            .flatten()
            .any(|elem| matches!(unwrap_expr(&elem.expr), Expr::Object(_)))
}
