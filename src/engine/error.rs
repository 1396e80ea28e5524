use thiserror::Error;

use crate::status::StatusError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("请求失败，状态码: {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("访问受限: {0}")]
    RateLimited(String),

    #[error("任务已取消: {0}")]
    Cancelled(String),

    #[error("信号量错误")]
    SemaphoreError,

    #[error(transparent)]
    Registry(#[from] StatusError),
}
