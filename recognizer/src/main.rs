use std::io::{stdin, stdout};

use anyhow::Result;
use decoder::FileDecoder;
use engine::DryRunEngine;
use tracing::{debug, error, info, warn};

use crate::args::Args;
use crate::harness::Harness;
use crate::log::init_log;

mod args;
mod error;
mod harness;
mod log;

/// 程序入口
fn application(args: &Args) -> Result<()> {
    info!("车牌识别示例程序启动");

    let mut engine = DryRunEngine::new();
    let decoder = FileDecoder;
    let mut harness = Harness::new(&mut engine, &decoder);

    let mut out = stdout().lock();
    let result = harness.run(args, &mut out);
    debug!("识别流程结束, 运行状态: {:?}", harness.state());
    result?;
    Ok(())
}

/// 等待用户输入
fn wait_for_key_press() {
    let mut input = String::new();
    println!("按任意键退出程序...");
    if let Err(e) = stdin().read_line(&mut input) {
        warn!("读取输入失败: {}", e);
    }
}

fn main() {
    let args = match Args::new() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, Args::usage());
            std::process::exit(1);
        }
    };

    if let Err(e) = init_log(&args) {
        eprintln!("初始化日志失败: {:#}", e);
        std::process::exit(1);
    }

    for flag in &args.ignored_flags {
        warn!("未知参数 {} 已忽略", flag);
    }
    if args.parallel.is_some() {
        warn!("参数 --parallel 不受支持, 识别始终按顺序执行");
    }

    match application(&args) {
        Ok(_) => {
            info!("程序已执行完毕");
            if args.wait {
                wait_for_key_press();
            }
        }
        Err(e) => {
            error!("程序存在异常: {:#}", e);
            std::process::exit(1);
        }
    }
}
