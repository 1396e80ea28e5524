use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// 后台传输任务状态视图
#[derive(Parser, Debug)]
#[command(name = "mirrorstat")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "实时查看后台传输任务的分页状态", long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(long, value_name = "FILE", global = true)]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 用模拟任务演示状态视图
    Demo(DemoArgs),
    /// 下载一组 URL 并实时显示状态
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// 查看者 ID
    #[arg(long, default_value_t = 1)]
    pub viewer: i64,

    /// 只看自己的任务（否则为管理员视图）
    #[arg(long)]
    pub user: bool,

    /// 状态分类代码: ALL, DL, UP, QD, QU, AR, EX, SD, CM, CL, SP, CK, SV, PA
    #[arg(long, default_value = "ALL")]
    pub category: String,

    /// 起始页码，越界时自动回绕
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// 每次翻页前进的页数
    #[arg(long, default_value_t = 1)]
    pub step: i64,

    /// 刷新间隔（秒）
    #[arg(long, default_value_t = 2)]
    pub interval: u64,

    /// 以 JSON 输出报告
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// 模拟任务数量
    #[arg(long, default_value_t = 25)]
    pub tasks: usize,

    /// 刷新轮数
    #[arg(long, default_value_t = 5)]
    pub rounds: usize,

    /// 每轮结束后翻到下一页
    #[arg(long)]
    pub paginate: bool,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// 下载链接
    #[arg(required = true, value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub urls: Vec<String>,

    /// 输出目录，覆盖配置文件中的 download_dir
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub view: ViewArgs,
}
