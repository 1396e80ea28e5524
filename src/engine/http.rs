use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::EngineError;
use crate::common::config::AppConfig;
use crate::status::error::Result as StatusResult;
use crate::status::{TaskContext, TaskRegistry, TaskStatus, TransferTask};

const ENGINE_NAME: &str = "reqwest";

/// 一个 HTTP 下载任务的实时状态
pub struct HttpTransfer {
    gid: String,
    name: String,
    url: String,
    output_path: PathBuf,
    ctx: TaskContext,
    total_size: AtomicU64,
    downloaded: AtomicU64,
    queued: AtomicBool,
    stream_started: OnceLock<Instant>,
    cancel: CancellationToken,
}

impl HttpTransfer {
    pub fn new(gid: String, url: &str, output_path: PathBuf, total_size: u64, ctx: TaskContext) -> Self {
        let name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| gid.clone());
        Self {
            gid,
            name,
            url: url.to_string(),
            output_path,
            ctx,
            total_size: AtomicU64::new(total_size),
            downloaded: AtomicU64::new(0),
            queued: AtomicBool::new(true),
            stream_started: OnceLock::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn mark_started(&self) {
        self.queued.store(false, Ordering::Relaxed);
        let _ = self.stream_started.set(Instant::now());
    }
}

#[async_trait]
impl TransferTask for HttpTransfer {
    fn gid(&self) -> String {
        self.gid.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn status(&self) -> String {
        if self.queued.load(Ordering::Relaxed) {
            TaskStatus::QueuedDownload.label().to_string()
        } else {
            TaskStatus::Downloading.label().to_string()
        }
    }

    fn processed_bytes(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    fn size(&self) -> u64 {
        self.total_size.load(Ordering::Relaxed)
    }

    // 平均速度
    fn speed(&self) -> u64 {
        let Some(started) = self.stream_started.get() else {
            return 0;
        };
        let secs = started.elapsed().as_secs_f64();
        if secs < 0.001 {
            return 0;
        }
        (self.processed_bytes() as f64 / secs) as u64
    }

    fn eta(&self) -> Option<u64> {
        let speed = self.speed();
        let size = self.size();
        if speed == 0 || size == 0 {
            return None;
        }
        Some(size.saturating_sub(self.processed_bytes()) / speed)
    }

    fn engine(&self) -> &str {
        ENGINE_NAME
    }

    fn context(&self) -> &TaskContext {
        &self.ctx
    }

    async fn progress(&self) -> StatusResult<f64> {
        let size = self.size();
        if size == 0 {
            return Ok(0.0);
        }
        Ok(self.processed_bytes() as f64 / size as f64 * 100.0)
    }
}

// -----------------------------------------------------------------------------------------------

/// 基于 reqwest 的下载引擎，运行中的任务都登记在 TaskRegistry 里
#[derive(Clone)]
pub struct HttpEngine {
    registry: TaskRegistry,
    client: Client,
    semaphore: Arc<Semaphore>, // 控制并发数
    output_dir: PathBuf,
    transfers: Arc<DashMap<String, Arc<HttpTransfer>>>,
    // 运行中任务占用的输出路径 -> gid
    output_paths: Arc<DashMap<PathBuf, String>>,
}

impl HttpEngine {
    pub fn new(registry: TaskRegistry, config: &AppConfig) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            registry,
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            output_dir: config.download_dir.clone(),
            transfers: Arc::new(DashMap::new()),
            output_paths: Arc::new(DashMap::new()),
        })
    }

    pub fn active(&self) -> usize {
        self.transfers.len()
    }

    // 添加新的下载任务，返回 gid
    pub async fn add_task(&self, url: &str, ctx: TaskContext) -> Result<String, EngineError> {
        let file_name = file_name_from_url(url)?;
        let gid = uuid::Uuid::new_v4().simple().to_string()[..16].to_string();

        tokio::fs::create_dir_all(&self.output_dir).await?;

        // 拿不到大小时按 0 处理，开始下载后再从响应头补上
        let total_size = match self.get_remote_file_size(url).await {
            Ok(size) => size,
            Err(e) => {
                warn!("无法获取文件大小: {}, {}", url, e);
                0
            }
        };

        let output_path = self.claim_output_path(&file_name, &gid);
        let transfer = Arc::new(HttpTransfer::new(gid.clone(), url, output_path, total_size, ctx));
        if let Err(e) = self.registry.insert(transfer.clone()).await {
            self.output_paths.remove(transfer.output_path());
            return Err(e.into());
        }
        self.transfers.insert(gid.clone(), Arc::clone(&transfer));
        debug!("添加下载任务: {} -> {}", gid, transfer.output_path().display());

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run(transfer).await;
        });

        Ok(gid)
    }

    /// 为任务占用一个输出路径，与运行中的任务重名时追加 ` (n)` 后缀
    pub fn claim_output_path(&self, file_name: &str, gid: &str) -> PathBuf {
        let mut n = 0;
        loop {
            let candidate = self.output_dir.join(numbered_file_name(file_name, n));
            if let Entry::Vacant(slot) = self.output_paths.entry(candidate.clone()) {
                slot.insert(gid.to_string());
                if n > 0 {
                    debug!("输出文件重名，改用: {}", candidate.display());
                }
                return candidate;
            }
            n += 1;
        }
    }

    pub fn cancel(&self, gid: &str) -> bool {
        match self.transfers.get(gid) {
            Some(transfer) => {
                transfer.cancel();
                true
            }
            None => false,
        }
    }

    async fn run(&self, transfer: Arc<HttpTransfer>) {
        let gid = transfer.gid();

        let result = tokio::select! {
            permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                Ok(_permit) => {
                    transfer.mark_started();
                    info!("开始下载任务: {}", gid);
                    self.download_stream(&transfer).await
                }
                Err(_) => Err(EngineError::SemaphoreError),
            },
            _ = transfer.cancel.cancelled() => Err(EngineError::Cancelled(gid.clone())),
        };

        match &result {
            Ok(()) => info!("✅ 下载任务完成: {}", gid),
            Err(EngineError::Cancelled(_)) => {
                warn!("下载任务已取消: {}", gid);
                let _ = tokio::fs::remove_file(transfer.output_path()).await;
            }
            Err(e) => error!("❌ 下载任务失败: {}, 错误: {}", gid, e),
        }

        self.registry.remove(&gid).await;
        self.transfers.remove(&gid);
        self.output_paths.remove(transfer.output_path());
    }

    async fn download_stream(&self, transfer: &HttpTransfer) -> Result<(), EngineError> {
        let response = self.client.get(transfer.url()).send().await?;
        check_response_status(&response, transfer.url())?;

        if transfer.size() == 0 {
            if let Some(len) = response.content_length() {
                transfer.total_size.store(len, Ordering::Relaxed);
            }
        }

        let mut file = tokio::fs::File::create(transfer.output_path()).await?;
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                chunk = stream.next() => chunk,
                _ = transfer.cancel.cancelled() => return Err(EngineError::Cancelled(transfer.gid())),
            };
            let Some(chunk) = chunk else {
                break;
            };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            transfer.downloaded.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        }

        file.flush().await?;
        Ok(())
    }

    async fn get_remote_file_size(&self, url: &str) -> Result<u64, EngineError> {
        let resp = self.client.head(url).send().await?;
        check_response_status(&resp, url)?;
        resp.headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|ct_len| ct_len.to_str().ok())
            .and_then(|ct_len| ct_len.parse().ok())
            .ok_or(EngineError::InvalidUrl("无法获取文件大小".to_string()))
    }
}

// 检查响应状态并处理特殊情况
fn check_response_status(response: &reqwest::Response, url: &str) -> Result<(), EngineError> {
    let status = response.status();
    debug!("Response Status: {}", status);

    match status {
        reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::TOO_MANY_REQUESTS => {
            warn!("🚫 请求被拒绝 ({})，可能触发了风控机制", status);
            Err(EngineError::RateLimited(format!("{} ({})", url, status)))
        }
        status if status.is_success() => Ok(()),
        _ => Err(EngineError::BadStatus(status)),
    }
}

/// 第 n 个同名文件：`a.zip` -> `a (n).zip`，n 为 0 时保持原名
pub fn numbered_file_name(file_name: &str, n: usize) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", file_name, n),
    }
}

pub fn file_name_from_url(url: &str) -> Result<String, EngineError> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let Some((scheme, rest)) = without_query.split_once("://") else {
        return Err(EngineError::InvalidUrl(url.to_string()));
    };
    if !matches!(scheme, "http" | "https") || rest.is_empty() {
        return Err(EngineError::InvalidUrl(url.to_string()));
    }

    let name = rest
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("index.html");
    Ok(name.to_string())
}
