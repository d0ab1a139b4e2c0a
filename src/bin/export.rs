// Dev utility: export one taxonomy level of a stored version as CSV.
//
// Usage:
//   cargo run --bin export -- --version 1 --level subindustry --out sub_industries.csv

use anyhow::Context;
use clap::Parser;
use gics_explorer::api::{parse_level, write_csv};
use gics_explorer::config::{env_keys, get_default_db_path};
use gics_explorer::db::{init_schema, open_sqlite_connection};
use gics_explorer::logging;
use gics_explorer::repository::TaxonomyRepository;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// GICS 分类导出工具
#[derive(Parser, Debug)]
#[command(name = "export")]
#[command(about = "Export one level of a stored GICS version as CSV")]
struct Args {
    /// 版本ID
    #[arg(long)]
    version: i64,

    /// 层级: sector / group / industry / subindustry
    #[arg(long)]
    level: String,

    /// 输出文件
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    /// 数据库路径
    #[arg(long, env = env_keys::DB_PATH)]
    db: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let level = parse_level(&args.level)?;
    let db_path = args.db.unwrap_or_else(get_default_db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn).context("建表失败")?;
    let repo = TaxonomyRepository::new(Arc::new(Mutex::new(conn)));

    let table = repo.export_level(args.version, level)?;
    let file = File::create(&args.out)
        .with_context(|| format!("无法创建 {}", args.out.display()))?;
    write_csv(&table, BufWriter::new(file))?;

    tracing::info!(rows = table.rows.len(), out = %args.out.display(), "导出完成");
    Ok(())
}
