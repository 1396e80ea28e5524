use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use mirror_status::common::config::AppConfig;
use mirror_status::common::logger::PrettyLogger;
use mirror_status::engine::{HttpEngine, SimulatedEngine};
use mirror_status::status::{
    ActionReply, ControlAction, StatusCategory, StatusMessage, StatusView, TaskContext, TaskRegistry,
};
use mirror_status::system::SysinfoSampler;
use mirror_status::{log_error, log_info, log_success, log_warning};

mod cli;

fn parse_category(code: &str) -> Result<StatusCategory> {
    StatusCategory::parse(code).ok_or_else(|| anyhow!("未知的状态分类: {}", code))
}

/// 打印一次状态报告
fn print_report(message: Option<&StatusMessage>, json: bool) -> Result<()> {
    match message {
        Some(message) if json => println!("{}", serde_json::to_string_pretty(message)?),
        Some(message) => PrettyLogger::status_report(&message.text, &message.controls.labels()),
        None => log_info!("当前没有运行中的任务"),
    }
    Ok(())
}

/// 翻页或刷新后重新生成报告
async fn next_report(view: &StatusView, viewer: i64, paginate: bool) -> Result<Option<StatusMessage>> {
    let action = if paginate { ControlAction::Next } else { ControlAction::Refresh };
    match view.handle_action(&action.encode(viewer)).await? {
        Some(ActionReply::Status(message)) => Ok(message),
        _ => Ok(None),
    }
}

async fn run_demo(view: &StatusView, args: &cli::DemoArgs) -> Result<()> {
    let opts = &args.view;
    let category = parse_category(&opts.category)?;

    let engine = SimulatedEngine::new(view.registry().clone());
    engine.spawn(args.tasks, opts.viewer).await?;

    let mut message = view
        .compose(opts.viewer, opts.user, opts.page, category, opts.step)
        .await?;
    for round in 0..args.rounds {
        PrettyLogger::title(format!("第 {} 轮", round + 1));
        print_report(message.as_ref(), opts.json)?;

        tokio::time::sleep(Duration::from_secs(opts.interval)).await;
        let finished = engine.tick(opts.interval.max(1)).await;
        if finished > 0 {
            log_success!("{} 个任务已完成", finished);
        }
        message = next_report(view, opts.viewer, args.paginate).await?;
    }
    Ok(())
}

async fn run_fetch(view: &StatusView, config: &AppConfig, args: &cli::FetchArgs) -> Result<()> {
    let opts = &args.view;
    let category = parse_category(&opts.category)?;

    let engine = HttpEngine::new(view.registry().clone(), config)?;
    let mut gids = Vec::new();
    for url in &args.urls {
        let ctx = TaskContext::new(opts.viewer, format!("@viewer_{}", opts.viewer), "Mirror");
        match engine.add_task(url, ctx).await {
            Ok(gid) => {
                log_info!("已添加任务 {}: {}", gid, url);
                gids.push(gid);
            }
            Err(e) => log_error!("添加任务失败 {}: {}", url, e),
        }
    }
    if gids.is_empty() {
        return Err(anyhow!("没有可下载的任务"));
    }

    let mut message = view
        .compose(opts.viewer, opts.user, opts.page, category, opts.step)
        .await?;
    loop {
        PrettyLogger::separator();
        print_report(message.as_ref(), opts.json)?;
        if engine.active() == 0 {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(opts.interval.max(1))) => {}
            _ = tokio::signal::ctrl_c() => {
                log_warning!("收到中断信号，取消全部任务");
                for gid in &gids {
                    engine.cancel(gid);
                }
                // 等待任务退出并从 registry 中移除
                while engine.active() > 0 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                break;
            }
        }
        message = next_report(view, opts.viewer, false).await?;
    }

    log_success!("全部任务已结束");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let cli::Command::Fetch(fetch) = &args.command {
        if let Some(dir) = &fetch.output_dir {
            config.download_dir = dir.clone();
        }
    }
    debug!("配置: {:?}", config);

    let registry = TaskRegistry::new(config.accessor_timeout());
    let sampler = Arc::new(SysinfoSampler::new(&config.download_dir, Utc::now()));
    let view = StatusView::new(registry, sampler, config.clone());

    info!("状态视图已就绪，每页 {} 个任务", config.status_limit);
    match &args.command {
        cli::Command::Demo(demo) => run_demo(&view, demo).await,
        cli::Command::Fetch(fetch) => run_fetch(&view, &config, fetch).await,
    }
}
