// src/main.rs

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use angular_route_graph::config::{discover_routes_file, load_tsconfig_paths};
use angular_route_graph::{analyze, render_mermaid, AnalyzeOptions};

/// 出力形式
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    /// Mermaid の flowchart
    #[default]
    Mermaid,
    /// 正規化済みノード列の JSON
    Json,
}

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "angular-route-graph",
    version,
    about = "Angular プロジェクトのルーティングと依存関係を解析して Mermaid 図を出力する CLI ツール"
)]
struct Cli {
    /// 解析対象の Angular プロジェクトルート
    /// 例: `--project-root C:/path/to/my-angular-project`
    #[arg(short = 'r', long = "project-root", value_name = "DIR")]
    project_root: PathBuf,

    /// メインのルーティングファイル (省略時はプロジェクトから探す)
    #[arg(short = 'f', long = "routes-file", value_name = "FILE")]
    routes_file: Option<PathBuf>,

    /// パスエイリアスを読む tsconfig (省略時は `<root>/tsconfig.json`)
    #[arg(short = 't', long = "tsconfig", value_name = "FILE")]
    tsconfig: Option<PathBuf>,

    /// DI で注入しているサービスも図に含める
    #[arg(short = 's', long = "with-services")]
    with_services: bool,

    /// `imports` / `hostDirectives` の部品もたどる
    #[arg(short = 'n', long = "with-nested-template-elements")]
    with_nested_template_elements: bool,

    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Mermaid)]
    format: OutputFormat,

    /// 出力先 (省略時は標準出力)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログは標準エラーへ。図は標準出力に出すので混ぜない
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 1) CLI 引数をパースし、プロジェクトルートを絶対パス化
    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize()?;

    // 2) tsconfig からパスエイリアスを読む
    let tsconfig = cli
        .tsconfig
        .unwrap_or_else(|| project_root.join("tsconfig.json"));
    let aliases = load_tsconfig_paths(&tsconfig)?;

    // 3) ルーティングファイルが指定されていなければ探す
    let routes_file = match cli.routes_file {
        Some(path) => path,
        None => discover_routes_file(&project_root)?,
    };

    // 4) 解析
    let options = AnalyzeOptions {
        project_root,
        routes_file,
        aliases,
        with_services: cli.with_services,
        with_nested_templates: cli.with_nested_template_elements,
    };
    let nodes = analyze(&options)?;

    // 5) 出力
    let text = match cli.format {
        OutputFormat::Mermaid => render_mermaid(&nodes),
        OutputFormat::Json => serde_json::to_string_pretty(&nodes)? + "\n",
    };
    match cli.out {
        Some(out) => {
            fs::write(&out, text)?;
            info!("{:?} に書き出しました", out);
        }
        None => print!("{}", text),
    }
    Ok(())
}
