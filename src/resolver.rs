use path_absolutize::Absolutize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::alias::AliasResolver;
use crate::error::{Error, Result};
use crate::extractor::extract_routes;
use crate::model::{GraphNode, LazyTarget, NodeKind, RouteKind, RouteSpec, SubgraphRole};
use crate::parser::SourceFile;
use crate::security::{ensure_contained, is_contained};

/// トップレベルのルートを持つコンテキスト名
pub const ROOT_CONTEXT: &str = "Root";

/// ファイルをまたいで再帰する深さの上限
pub const MAX_DEPTH: usize = 16;

/// この接頭辞で始まる import はフレームワーク内部とみなして追跡しない
pub const FRAMEWORK_PREFIX: &str = "@angular";

/// モジュール指定子の行き先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleTarget {
    /// プロジェクト内のモジュール (字句的に正規化した絶対パス、拡張子なし)
    Local(PathBuf),
    /// `rxjs` や `@nebular/auth` のようなパッケージ
    External(String),
}

/// import 文から引いた名前の参照先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// ルートからの相対パス (拡張子なし)
    Local(PathBuf),
    External(String),
    Framework(String),
    Missing,
}

/// 1 回の解析で共有する読み取り専用の状態 (プロジェクトルートとエイリアス表)
#[derive(Debug)]
pub struct Resolver<'a> {
    root: PathBuf,
    aliases: &'a AliasResolver,
}

/// 再帰のたびに作り直す、いま解析中のファイルの文脈
#[derive(Debug, Clone)]
pub struct Scope<'s> {
    pub file: &'s SourceFile,
    pub depth: usize,
    /// ここまでにたどったファイル (実体パス)
    trail: Vec<PathBuf>,
}

impl<'s> Scope<'s> {
    pub fn new(file: &'s SourceFile) -> Self {
        Scope {
            file,
            depth: 0,
            trail: vec![physical(file.path())],
        }
    }

    /// 別ファイルへ一段降りた文脈を作る
    pub fn descend<'c>(&self, file: &'c SourceFile) -> Scope<'c> {
        let mut trail = self.trail.clone();
        trail.push(physical(file.path()));
        Scope {
            file,
            depth: self.depth + 1,
            trail,
        }
    }

    fn has_visited(&self, path: &Path) -> bool {
        self.trail.contains(&physical(path))
    }

    fn dir(&self) -> &Path {
        self.file.path().parent().unwrap_or(Path::new("/"))
    }
}

impl<'a> Resolver<'a> {
    pub fn new(project_root: &Path, aliases: &'a AliasResolver) -> Result<Self> {
        let root = project_root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(project_root.to_path_buf()))?;
        Ok(Resolver { root, aliases })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// エントリーファイルからグラフを組み立てる。
    /// エントリーがルート外・存在しない場合だけはここでエラーにする
    pub fn resolve_entry(&self, entry: &Path) -> Result<Vec<GraphNode>> {
        let entry = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            self.root.join(entry)
        };
        let entry = ensure_contained(&entry, &self.root)?;
        if !entry.is_file() {
            return Err(Error::PathNotFound(entry));
        }

        info!("解析中: {:?}", entry);
        let file = match self.load(&entry) {
            Ok(file) => file,
            Err(e) => {
                warn!("{}", e);
                return Ok(Vec::new());
            }
        };

        let tables = file.route_tables();
        if tables.is_empty() {
            warn!("{:?} にルート定義が見つかりませんでした", entry);
        }
        let specs = tables
            .iter()
            .flat_map(|table| extract_routes(table, ROOT_CONTEXT))
            .collect();
        Ok(self.resolve_specs(specs, &Scope::new(&file)))
    }

    /// RouteSpec の列をグラフのノードに変換する
    pub fn resolve_specs(&self, specs: Vec<RouteSpec>, scope: &Scope) -> Vec<GraphNode> {
        let mut nodes = Vec::new();
        for spec in specs {
            match &spec.kind {
                RouteKind::LoadComponent(target) => {
                    nodes.extend(self.lazy_component(&spec, target, scope))
                }
                RouteKind::LoadChildren(target) => {
                    nodes.extend(self.lazy_module(&spec, target, scope))
                }
                RouteKind::Component { name } => {
                    nodes.extend(self.eager_component(&spec, name, scope))
                }
                RouteKind::Redirect { to } => {
                    debug!("リダイレクト {:?} -> {}", spec.path, to)
                }
                RouteKind::Children => {}
            }
        }
        nodes
    }

    fn lazy_component(
        &self,
        spec: &RouteSpec,
        target: &LazyTarget,
        scope: &Scope,
    ) -> Option<GraphNode> {
        let node = GraphNode::new(target.display_name(), NodeKind::Component, &spec.parent)
            .with_route_path(spec.path.clone())
            .lazy(true);
        match self.module_target(&target.specifier, scope.dir()) {
            ModuleTarget::Local(module) => match self.contained_module(&module) {
                Ok(source) => Some(node.with_source(Some(source))),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
            ModuleTarget::External(_) => Some(node),
        }
    }

    fn eager_component(&self, spec: &RouteSpec, name: &str, scope: &Scope) -> Option<GraphNode> {
        let node = GraphNode::new(name, NodeKind::Component, &spec.parent)
            .with_route_path(spec.path.clone());
        match self.reference(name, scope.file) {
            Ok(Reference::Local(path)) => Some(node.with_source(Some(path))),
            Ok(Reference::External(_) | Reference::Framework(_)) => Some(node),
            Ok(Reference::Missing) if scope.file.declares_class(name) => {
                let own = scope.file.path().with_extension("");
                Some(node.with_source(Some(self.relative(&own))))
            }
            Ok(Reference::Missing) if spec.redirect_to.is_some() => None,
            Ok(Reference::Missing) => {
                error!("{}", Error::unresolved(name, scope.file.path()));
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// `loadChildren` をモジュールの開始印・入れ子のルート・終了印 (遅延エッジ) に展開する。
    /// 展開できなければ遅延エッジだけを返す
    fn lazy_module(&self, spec: &RouteSpec, target: &LazyTarget, scope: &Scope) -> Vec<GraphNode> {
        let module_name = target.display_name().to_string();
        let mut edge = GraphNode::new(&module_name, NodeKind::Module, &spec.parent)
            .with_route_path(spec.path.clone())
            .lazy(true);
        edge.skip_dependencies = true;

        let module = match self.module_target(&target.specifier, scope.dir()) {
            ModuleTarget::Local(module) => module,
            ModuleTarget::External(package) => {
                debug!("パッケージ {} のルートは追跡しません", package);
                return vec![edge];
            }
        };
        let file_path = match self.locate_source(&module) {
            Ok(path) => path,
            Err(e @ Error::SecurityViolation(_)) => {
                warn!("{}", e);
                return Vec::new();
            }
            Err(_) => {
                error!("{}", Error::unresolved(&module_name, scope.file.path()));
                return vec![edge];
            }
        };
        let edge = edge.with_source(Some(self.relative(&module)));

        if scope.depth >= MAX_DEPTH {
            debug!("深さの上限に達したため {} を展開しません", module_name);
            return vec![edge];
        }
        if scope.has_visited(&file_path) {
            debug!("{:?} は既にたどっているため展開しません", file_path);
            return vec![edge];
        }

        let source = match self.load(&file_path) {
            Ok(source) => source,
            Err(e) => {
                warn!("{}", e);
                return vec![edge];
            }
        };

        let mut tables = source.route_tables();
        let mut kind = NodeKind::Module;
        let bridged;
        let mut routes_file = &source;
        if tables.is_empty() {
            // モジュールに直接ルートが無ければ、import しているルーティングモジュールを解析する
            bridged = match self.bridge(&source, scope) {
                Ok(bridged) => bridged,
                Err(e) => {
                    error!("{}", e);
                    return vec![edge];
                }
            };
            tables = bridged.route_tables();
            kind = NodeKind::Route;
            routes_file = &bridged;
        }

        let context = spec
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| module_name.clone());
        let start = GraphNode::new(&context, kind, &module_name)
            .with_source(Some(self.relative(&routes_file.path().with_extension(""))))
            .structural(SubgraphRole::Start);
        // 終了印はそのままモジュールへの遅延エッジを兼ねる
        let end = edge.structural(SubgraphRole::End);

        let specs = tables
            .iter()
            .flat_map(|table| extract_routes(table, &context))
            .collect();
        let mut child = scope.descend(routes_file);
        if !std::ptr::eq(routes_file, &source) {
            child.trail.push(physical(source.path()));
        }

        let mut nodes = vec![start];
        nodes.extend(self.resolve_specs(specs, &child));
        nodes.push(end);
        nodes
    }

    /// ルート定義を持たないモジュールファイルから、ルーティングモジュールを探す。
    /// 名前に routing / routes を含む import を優先し、無ければ最初のローカル import
    fn bridge(&self, module: &SourceFile, scope: &Scope) -> Result<SourceFile> {
        let dir = module.path().parent().unwrap_or(Path::new("/"));
        let locals: Vec<PathBuf> = module
            .import_specifiers()
            .iter()
            .filter_map(|specifier| match self.module_target(specifier, dir) {
                ModuleTarget::Local(path) => Some(path),
                ModuleTarget::External(_) => None,
            })
            .collect();
        let chosen = locals
            .iter()
            .find(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains("routing") || n.contains("routes"))
            })
            .or_else(|| locals.first())
            .ok_or_else(|| Error::unresolved("routing module", module.path()))?;

        let path = self
            .locate_source(chosen)
            .map_err(|_| Error::unresolved(chosen.display().to_string(), module.path()))?;
        if scope.has_visited(&path) {
            return Err(Error::unresolved(path.display().to_string(), module.path()));
        }
        let bridged = self.load(&path)?;
        if bridged.route_tables().is_empty() {
            return Err(Error::unresolved("Routes", bridged.path()));
        }
        Ok(bridged)
    }

    /// `file` の import から `name` の参照先を求める
    pub fn reference(&self, name: &str, file: &SourceFile) -> Result<Reference> {
        let Some(specifier) = file.import_specifier(name) else {
            return Ok(Reference::Missing);
        };
        if specifier.starts_with(FRAMEWORK_PREFIX) {
            return Ok(Reference::Framework(specifier));
        }
        let dir = file.path().parent().unwrap_or(Path::new("/"));
        match self.module_target(&specifier, dir) {
            ModuleTarget::Local(module) => Ok(Reference::Local(self.contained_module(&module)?)),
            ModuleTarget::External(package) => Ok(Reference::External(package)),
        }
    }

    /// モジュールがルート内にあることを確かめ、ルートからの相対パスを返す。
    /// 実ファイル (`x.ts` など) が見つかればそのファイル自体も検査する。
    /// どの候補も存在しなければパスだけで判断する
    fn contained_module(&self, module: &Path) -> Result<PathBuf> {
        let module = ensure_contained(module, &self.root)?;
        match self.locate_source(&module) {
            Ok(_) | Err(Error::PathNotFound(_)) => Ok(self.relative(&module)),
            Err(e) => Err(e),
        }
    }

    /// エイリアス → 相対パス → パッケージの順にモジュール指定子を解釈する
    pub fn module_target(&self, specifier: &str, from_dir: &Path) -> ModuleTarget {
        let joined = if let Some(rewritten) = self.aliases.resolve(specifier) {
            self.root.join(rewritten)
        } else if specifier.starts_with('.') || specifier.starts_with('/') {
            from_dir.join(specifier)
        } else {
            return ModuleTarget::External(specifier.to_string());
        };
        let normalized = joined
            .absolutize()
            .map(|p| p.to_path_buf())
            .unwrap_or(joined);
        ModuleTarget::Local(normalized)
    }

    /// モジュールの実ファイルを探す (`x.ts`、`x/index.ts`、`x` 自身の順)。
    /// 存在確認の前に必ずルート内かどうかを確かめる
    pub fn locate_source(&self, module: &Path) -> Result<PathBuf> {
        if !is_contained(module, &self.root) {
            return Err(Error::SecurityViolation(module.to_path_buf()));
        }
        let mut with_ext = OsString::from(module.as_os_str());
        with_ext.push(".ts");
        let mut candidates = vec![PathBuf::from(with_ext), module.join("index.ts")];
        if module.extension().is_some_and(|ext| ext == "ts") {
            candidates.push(module.to_path_buf());
        }

        for candidate in candidates {
            if !is_contained(&candidate, &self.root) {
                return Err(Error::SecurityViolation(candidate));
            }
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Error::PathNotFound(module.to_path_buf()))
    }

    /// ノードのソースファイルを読み込む
    pub fn source_of(&self, node: &GraphNode) -> Result<SourceFile> {
        let Some(source_path) = &node.source_path else {
            return Err(Error::unresolved(&node.name, &self.root));
        };
        let path = self.locate_source(&self.root.join(source_path))?;
        self.load(&path)
    }

    /// ルート内であることを確かめてから読み込んでパースする
    pub fn load(&self, path: &Path) -> Result<SourceFile> {
        let path = ensure_contained(path, &self.root)?;
        let src = fs::read_to_string(&path)?;
        SourceFile::parse(&src, &path)
    }

    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn physical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn names(nodes: &[GraphNode]) -> Vec<(&str, Option<&str>)> {
        nodes.iter().map(|n| n.identity()).collect()
    }

    #[test]
    fn resolves_eager_components_from_imports() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/app.routes.ts",
            r#"
            import { HomeComponent } from './home/home.component';
            import { AboutComponent } from './about/about.component';
            export const routes: Routes = [
              { path: '', component: HomeComponent },
              { path: 'about', component: AboutComponent },
            ];
            "#,
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("src/app.routes.ts")).unwrap();

        assert_eq!(
            names(&nodes),
            vec![("HomeComponent", Some("Root")), ("AboutComponent", Some("Root"))]
        );
        assert!(nodes.iter().all(|n| n.kind == NodeKind::Component && !n.lazy));
        assert_eq!(
            nodes[0].source_path.as_deref(),
            Some(Path::new("src/home/home.component"))
        );
    }

    #[test]
    fn drops_missing_component_but_tolerates_redirect() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            r#"
            export const routes: Routes = [
              { path: 'a', component: NowhereComponent },
              { path: 'b', component: GoneComponent, redirectTo: 'a' },
              { path: 'c', component: LocalComponent },
            ];
            export class LocalComponent {}
            "#,
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();
        assert_eq!(names(&nodes), vec![("LocalComponent", Some("Root"))]);
        assert_eq!(nodes[0].source_path.as_deref(), Some(Path::new("app.routes")));
    }

    #[test]
    fn lazy_component_uses_alias() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/app/app.routes.ts",
            "export const routes = [{ path: 'x', loadComponent: () => import('@app/x/x.component').then(m => m.XComponent) }];",
        );
        let mut table = AliasTable::new();
        table.insert("@app/*".into(), vec!["src/app/*".into()]);
        let aliases = AliasResolver::from_table(dir.path(), &table);
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("src/app/app.routes.ts")).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "XComponent");
        assert!(nodes[0].lazy);
        assert_eq!(
            nodes[0].source_path.as_deref(),
            Some(Path::new("src/app/x/x.component"))
        );
    }

    #[test]
    fn lazy_component_outside_root_is_dropped() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            "export const routes = [{ path: 'x', loadComponent: () => import('../../etc/passwd') }];",
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn expands_load_children_into_subgraph() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            "export const routes = [{ path: 'feature', loadChildren: () => import('./feature/feature.routes').then(m => m.FEATURE_ROUTES) }];",
        );
        write(
            dir.path(),
            "feature/feature.routes.ts",
            r#"
            import { ListComponent } from './list.component';
            export const FEATURE_ROUTES: Routes = [{ path: '', component: ListComponent }];
            "#,
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();

        let roles: Vec<SubgraphRole> = nodes.iter().map(|n| n.subgraph).collect();
        assert_eq!(
            roles,
            vec![SubgraphRole::Start, SubgraphRole::None, SubgraphRole::End]
        );
        assert_eq!(nodes[0].identity(), ("feature", Some("FEATURE_ROUTES")));
        assert_eq!(nodes[0].kind, NodeKind::Module);
        assert_eq!(nodes[1].identity(), ("ListComponent", Some("feature")));
        assert_eq!(
            nodes[1].source_path.as_deref(),
            Some(Path::new("feature/list.component"))
        );
        assert_eq!(nodes[2].identity(), ("FEATURE_ROUTES", Some("Root")));
        assert_eq!(nodes[2].kind, NodeKind::Module);
        assert!(nodes[2].lazy);
    }

    #[test]
    fn bridges_through_routing_module() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app-routing.module.ts",
            "const routes: Routes = [{ path: 'pages', loadChildren: () => import('./pages/pages.module').then(m => m.PagesModule) }];",
        );
        write(
            dir.path(),
            "pages/pages.module.ts",
            r#"
            import { NgModule } from '@angular/core';
            import { SharedModule } from '../shared/shared.module';
            import { PagesRoutingModule } from './pages-routing.module';
            @NgModule({ imports: [SharedModule, PagesRoutingModule] })
            export class PagesModule {}
            "#,
        );
        write(
            dir.path(),
            "pages/pages-routing.module.ts",
            r#"
            import { DashboardComponent } from './dashboard/dashboard.component';
            const routes: Routes = [{ path: '', component: DashboardComponent }];
            @NgModule({ imports: [RouterModule.forChild(routes)] })
            export class PagesRoutingModule {}
            "#,
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app-routing.module.ts")).unwrap();

        assert_eq!(nodes[0].kind, NodeKind::Route);
        assert_eq!(
            nodes[0].source_path.as_deref(),
            Some(Path::new("pages/pages-routing.module"))
        );
        assert_eq!(nodes[1].identity(), ("DashboardComponent", Some("pages")));
        assert_eq!(
            nodes[1].source_path.as_deref(),
            Some(Path::new("pages/dashboard/dashboard.component"))
        );
    }

    #[test]
    fn missing_bridge_is_reported_as_plain_edge() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            "export const routes = [{ path: 'p', loadChildren: () => import('./p/p.module').then(m => m.PModule) }];",
        );
        write(
            dir.path(),
            "p/p.module.ts",
            "import { PRoutingModule } from './p-routing.module';\nexport class PModule {}",
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();

        assert_eq!(names(&nodes), vec![("PModule", Some("Root"))]);
        assert_eq!(nodes[0].subgraph, SubgraphRole::None);
        assert!(nodes[0].lazy);
    }

    #[test]
    fn depth_ceiling_turns_deep_modules_into_plain_edges() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            "export const routes = [{ path: 'l1', loadChildren: () => import('./level1').then(m => m.LEVEL1) }];",
        );
        for level in 1..=20 {
            let next = level + 1;
            write(
                dir.path(),
                &format!("level{level}.ts"),
                &format!(
                    "export const LEVEL{level}: Routes = [{{ path: 'l{next}', loadChildren: () => import('./level{next}').then(m => m.LEVEL{next}) }}];"
                ),
            );
        }
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();

        let starts = nodes.iter().filter(|n| n.subgraph == SubgraphRole::Start).count();
        let ends = nodes.iter().filter(|n| n.subgraph == SubgraphRole::End).count();
        assert_eq!(starts, MAX_DEPTH);
        assert_eq!(ends, MAX_DEPTH);

        let last = nodes
            .iter()
            .find(|n| n.name == format!("LEVEL{}", MAX_DEPTH + 1))
            .unwrap();
        assert_eq!(last.subgraph, SubgraphRole::None);
        assert_eq!(last.parent.as_deref(), Some(format!("l{}", MAX_DEPTH).as_str()));
        assert!(last.lazy);
        assert!(!nodes.iter().any(|n| n.name == format!("LEVEL{}", MAX_DEPTH + 2)));
    }

    #[cfg(unix)]
    #[test]
    fn file_symlink_outside_root_yields_no_node() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        write(dir.path(), "outside/evil.component.ts", "export class EvilComponent {}");
        write(
            &root,
            "app.routes.ts",
            r#"
            import { EvilComponent } from './evil.component';
            export const routes: Routes = [
              { path: 'eager', component: EvilComponent },
              { path: 'lazy', loadComponent: () => import('./evil.component').then(m => m.LazyEvil) },
            ];
            "#,
        );
        symlink(
            dir.path().join("outside/evil.component.ts"),
            root.join("evil.component.ts"),
        )
        .unwrap();

        let aliases = AliasResolver::new(&root);
        let resolver = Resolver::new(&root, &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn missing_module_file_keeps_source_path() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.routes.ts",
            "export const routes = [{ path: 'x', loadComponent: () => import('./x/x.component') }];",
        );
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let nodes = resolver.resolve_entry(Path::new("app.routes.ts")).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].source_path.as_deref(), Some(Path::new("x/x.component")));
    }

    #[test]
    fn locates_index_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "feature/index.ts", "export const routes = [];");
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let found = resolver
            .locate_source(&resolver.root().join("feature"))
            .unwrap();
        assert!(found.ends_with("feature/index.ts"));
    }

    #[test]
    fn keeps_dotted_file_names_when_locating() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "home/home.component.ts", "export class HomeComponent {}");
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        let found = resolver
            .locate_source(&resolver.root().join("home/home.component"))
            .unwrap();
        assert!(found.ends_with("home/home.component.ts"));
    }

    #[test]
    fn rejects_entry_outside_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("project")).unwrap();
        write(dir.path(), "secret.ts", "export const routes = [];");
        let root = dir.path().join("project");
        let aliases = AliasResolver::new(&root);
        let resolver = Resolver::new(&root, &aliases).unwrap();
        let err = resolver.resolve_entry(Path::new("../secret.ts")).unwrap_err();
        assert!(matches!(err, Error::SecurityViolation(_)));
    }

    #[test]
    fn packages_are_external() {
        let dir = TempDir::new().unwrap();
        let aliases = AliasResolver::new(dir.path());
        let resolver = Resolver::new(dir.path(), &aliases).unwrap();
        assert_eq!(
            resolver.module_target("@nebular/auth", dir.path()),
            ModuleTarget::External("@nebular/auth".into())
        );
    }
}
