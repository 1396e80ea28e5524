use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;
use crate::common::units::{parse_percentage, speed_string_to_bytes, time_to_seconds};

/// 任务的发起者信息
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub user_id: i64,
    pub tag: String,
    /// 传输模式，如 `Leech` / `Mirror`
    pub mode: String,
    pub started_at: DateTime<Utc>,
}

impl TaskContext {
    pub fn new(user_id: i64, tag: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            user_id,
            tag: tag.into(),
            mode: mode.into(),
            started_at: Utc::now(),
        }
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }
}

// -----------------------------------------------------------------------------------------------

/// 由传输引擎实现，状态视图只读取，不创建也不销毁任务
#[async_trait]
pub trait TransferTask: Send + Sync {
    fn gid(&self) -> String;
    fn name(&self) -> String;
    // 原始状态标签，可能不在已知分类中
    fn status(&self) -> String;
    fn processed_bytes(&self) -> u64;
    fn size(&self) -> u64;
    /// 字节/秒
    fn speed(&self) -> u64;
    /// 剩余秒数，未知时为 None
    fn eta(&self) -> Option<u64>;
    fn engine(&self) -> &str;
    fn context(&self) -> &TaskContext;

    /// 百分比，可能需要等待引擎返回
    async fn progress(&self) -> Result<f64>;

    /// 支持主动刷新的任务返回 Some
    fn as_refresh(&self) -> Option<&dyn Refresh> {
        None
    }
}

#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}

pub type TaskHandle = Arc<dyn TransferTask>;

// -----------------------------------------------------------------------------------------------

/// 引擎以字符串上报的统计值，如 `45.3%`、`1.5MiB/s`、`00:12:30`
///
/// 实现 `TransferTask` 时用它换算成数值，无法解析的字段按 0 / None 处理。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportedStats {
    pub progress: String,
    pub speed: String,
    pub eta: String,
}

impl ReportedStats {
    pub fn progress(&self) -> f64 {
        parse_percentage(&self.progress)
    }

    pub fn speed(&self) -> u64 {
        speed_string_to_bytes(&self.speed) as u64
    }

    pub fn eta(&self) -> Option<u64> {
        match time_to_seconds(&self.eta) {
            0 => None,
            secs => Some(secs),
        }
    }
}
