use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use config::EngineConfig;
use schemars::schema_for;

const SCHEMA_FILE: &str = "engine_config.schema.json";

fn main() -> Result<()> {
    let output_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("创建目录 {} 失败", output_dir.display()))?;

    let engine_config_schema = serde_json::to_string_pretty(&schema_for!(EngineConfig))?;
    let schema_file = output_dir.join(SCHEMA_FILE);
    fs::write(&schema_file, engine_config_schema)
        .with_context(|| format!("写入 {} 失败", schema_file.display()))?;
    println!("已生成 {}", schema_file.display());
    Ok(())
}
