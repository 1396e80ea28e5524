use std::time::Duration;

use chrono::{DateTime, Utc};

use super::category::StatusCategory;
use super::error::{Result, StatusError};
use super::task::TransferTask;
use crate::common::units::{
    clamp_percentage, get_progress_bar_string, get_readable_file_size, get_readable_time,
};

/// 单个任务的渲染参数
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub category: StatusCategory,
    pub now: DateTime<Utc>,
    pub accessor_timeout: Duration,
    pub cancel_command: String,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn sanitize_user_tag(tag: &str) -> String {
    tag.replace('@', "").replace('_', " ")
}

/// 已运行时长，不足 1 秒显示 `-`
pub fn elapsed_since(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(started_at);
    if elapsed.num_milliseconds() < 1000 {
        return "-".to_string();
    }
    get_readable_time(elapsed.num_seconds() as u64)
}

/// 带超时地查询进度，失败会中止本次渲染
pub async fn query_progress(task: &dyn TransferTask, timeout: Duration) -> Result<f64> {
    match tokio::time::timeout(timeout, task.progress()).await {
        Ok(progress) => progress.map(clamp_percentage),
        Err(_) => Err(StatusError::AccessorTimeout(task.gid())),
    }
}

/// 渲染单个任务块，`index` 从 1 开始
pub async fn render_task(task: &dyn TransferTask, index: usize, opts: &RenderOptions) -> Result<String> {
    let progress = query_progress(task, opts.accessor_timeout).await?;

    let status = match opts.category {
        StatusCategory::All => task.status(),
        category => category.label().to_string(),
    };
    let ctx = task.context();
    let eta = match task.eta() {
        Some(secs) if secs > 0 => get_readable_time(secs),
        _ => "-".to_string(),
    };

    Ok(format!(
        "#{index}: <code>{name}</code>\n\n\
         {bar} » {progress:.2}%\n\
         ├✺ Status : {status}\n\
         ├Processed : {processed} of {size}\n\
         ├Speed : {speed}/s\n\
         ├Estimated : {eta}\n\
         ├Elapsed : {elapsed}\n\
         ├User : {user}\n\
         ├ID : {user_id}\n\
         ├Upload : {mode}\n\
         ├Tool : {engine}\n\
         └Stop : <code>/{cancel} {gid}</code>\n\n",
        name = escape_html(&task.name()),
        bar = get_progress_bar_string(progress),
        processed = get_readable_file_size(task.processed_bytes()),
        size = get_readable_file_size(task.size()),
        speed = get_readable_file_size(task.speed()),
        elapsed = elapsed_since(ctx.started_at, opts.now),
        user = sanitize_user_tag(&ctx.tag),
        user_id = ctx.user_id,
        mode = ctx.mode,
        engine = task.engine(),
        cancel = opts.cancel_command,
        gid = task.gid(),
    ))
}
