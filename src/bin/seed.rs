// Dev utility: ingest a local GICS workbook (CSV or Excel) into the SQLite store.
//
// Usage:
//   cargo run --bin seed -- --csv sample_gics.csv --label sample --effective 2024-01-01
//   cargo run --bin seed -- --excel GICS_2023.xlsx --label 2023-03-17 --effective 2023-03-17 --db ./gics.db

use anyhow::Context;
use clap::{ArgGroup, Parser};
use gics_explorer::config::{env_keys, get_default_db_path};
use gics_explorer::importer::SourceFormat;
use gics_explorer::{logging, AppState};
use std::path::PathBuf;

/// GICS 分类表导入工具
#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Ingest a GICS workbook into the local store as a new version")]
#[command(group(ArgGroup::new("source").required(true).args(["csv", "excel"])))]
struct Args {
    /// CSV 文件路径
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Excel 文件路径（.xlsx/.xls/.xlsm/.ods）
    #[arg(long, value_name = "FILE")]
    excel: Option<PathBuf>,

    /// 版本标签
    #[arg(long)]
    label: String,

    /// 生效日期 YYYY-MM-DD
    #[arg(long)]
    effective: String,

    /// 记录在版本上的来源地址
    #[arg(long)]
    source_url: Option<String>,

    /// 数据库路径
    #[arg(long, env = env_keys::DB_PATH)]
    db: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let (path, format) = match (args.csv, args.excel) {
        (Some(path), _) => (path, SourceFormat::Csv),
        (None, Some(path)) => (path, SourceFormat::Excel),
        (None, None) => anyhow::bail!("需要 --csv 或 --excel"),
    };

    let db_path = args.db.unwrap_or_else(get_default_db_path);
    let state = AppState::new(&db_path).context("数据库初始化失败")?;

    // 扩展名与参数不一致时以参数为准
    let report = state
        .taxonomy_api
        .ingest_file(
            &path,
            Some(format),
            &args.label,
            &args.effective,
            args.source_url.as_deref(),
        )
        .with_context(|| format!("导入 {} 失败", path.display()))?;

    tracing::info!(version_id = report.version_id, db = state.get_db_path(), "导入完成");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
