use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("任务已存在: {0}")]
    TaskAlreadyExists(String),

    #[error("进度查询失败 [{gid}]: {reason}")]
    Progress { gid: String, reason: String },

    #[error("刷新任务状态失败 [{gid}]: {reason}")]
    Refresh { gid: String, reason: String },

    #[error("任务状态查询超时: {0}")]
    AccessorTimeout(String),

    #[error("系统资源采样失败: {0}")]
    Sampler(String),
}

pub type Result<T> = std::result::Result<T, StatusError>;
