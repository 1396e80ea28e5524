use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::error::EngineError;
use crate::status::category::PAUSED_LABEL;
use crate::status::error::Result as StatusResult;
use crate::common::units::get_readable_file_size;
use crate::status::{Refresh, ReportedStats, TaskContext, TaskRegistry, TaskStatus, TransferTask};

const ENGINE_NAME: &str = "simulator";
const MODES: [&str; 3] = ["Leech", "Mirror", "Clone"];

/// 模拟的传输任务，`demo` 命令用来演示状态视图
pub struct SimulatedTransfer {
    gid: String,
    name: String,
    status: RwLock<String>,
    ctx: TaskContext,
    size: u64,
    processed: AtomicU64,
    speed: AtomicU64,
    // 做种任务的上传量，刷新时更新
    uploaded: AtomicU64,
}

impl SimulatedTransfer {
    pub fn new(name: impl Into<String>, status: impl Into<String>, size: u64, speed: u64, ctx: TaskContext) -> Self {
        Self {
            gid: uuid::Uuid::new_v4().simple().to_string()[..16].to_string(),
            name: name.into(),
            status: RwLock::new(status.into()),
            ctx,
            size,
            processed: AtomicU64::new(0),
            speed: AtomicU64::new(speed),
            uploaded: AtomicU64::new(0),
        }
    }

    pub fn is_seeding(&self) -> bool {
        self.status() == TaskStatus::Seeding.label()
    }

    pub fn is_finished(&self) -> bool {
        !self.is_seeding() && self.processed_bytes() >= self.size
    }

    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }

    pub fn set_status(&self, status: impl Into<String>) {
        let mut current = self.status.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = status.into();
    }

    /// 按当前速度推进 `secs` 秒
    pub fn advance(&self, secs: u64) {
        if self.is_seeding() {
            return;
        }
        let delta = self.speed.load(Ordering::Relaxed).saturating_mul(secs);
        let next = self.processed_bytes().saturating_add(delta).min(self.size);
        self.processed.store(next, Ordering::Relaxed);
    }
}

#[async_trait]
impl TransferTask for SimulatedTransfer {
    fn gid(&self) -> String {
        self.gid.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn status(&self) -> String {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn processed_bytes(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn speed(&self) -> u64 {
        self.speed.load(Ordering::Relaxed)
    }

    fn eta(&self) -> Option<u64> {
        let speed = self.speed();
        if speed == 0 || self.is_seeding() {
            return None;
        }
        Some(self.size.saturating_sub(self.processed_bytes()) / speed)
    }

    fn engine(&self) -> &str {
        ENGINE_NAME
    }

    fn context(&self) -> &TaskContext {
        &self.ctx
    }

    async fn progress(&self) -> StatusResult<f64> {
        // 模拟需要等待引擎返回的进度查询
        tokio::task::yield_now().await;
        if self.size == 0 {
            return Ok(0.0);
        }
        Ok(self.processed_bytes() as f64 / self.size as f64 * 100.0)
    }

    fn as_refresh(&self) -> Option<&dyn Refresh> {
        if self.is_seeding() { Some(self) } else { None }
    }
}

#[async_trait]
impl Refresh for SimulatedTransfer {
    // 模拟做种客户端以字符串上报的上传速度
    async fn refresh(&self) -> StatusResult<()> {
        let upload: u64 = rand::rng().random_range(16 * 1024..512 * 1024);
        let report = ReportedStats {
            speed: format!("{}/s", get_readable_file_size(upload)),
            ..Default::default()
        };
        let speed = report.speed();
        self.speed.store(speed, Ordering::Relaxed);
        self.uploaded.fetch_add(speed, Ordering::Relaxed);
        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------

pub struct SimulatedEngine {
    registry: TaskRegistry,
    transfers: Mutex<Vec<Arc<SimulatedTransfer>>>,
}

impl SimulatedEngine {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            transfers: Mutex::new(Vec::new()),
        }
    }

    /// 生成 `count` 个任务，状态轮流覆盖各分类，每 10 个里有一个暂停
    pub async fn spawn(&self, count: usize, owner_id: i64) -> Result<Vec<String>, EngineError> {
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            let transfer = Arc::new(Self::make_transfer(i, owner_id));
            self.registry.insert(transfer.clone()).await?;
            created.push(transfer.gid());
            self.transfers.lock().await.push(transfer);
        }
        info!("已生成 {} 个模拟任务", count);
        Ok(created)
    }

    fn make_transfer(i: usize, owner_id: i64) -> SimulatedTransfer {
        let mut rng = rand::rng();
        let status = if i % 10 == 9 {
            PAUSED_LABEL
        } else {
            TaskStatus::ALL[i % TaskStatus::ALL.len()].label()
        };
        // 一半任务属于 owner，其余分给其他用户
        let user_id = if i % 2 == 0 { owner_id } else { owner_id + 1 + (i as i64 % 3) };
        let ctx = TaskContext::new(user_id, format!("@user_{}", user_id), MODES[i % MODES.len()]);
        let size = rng.random_range(50u64..4096) * 1024 * 1024;
        let speed = rng.random_range(256u64..8192) * 1024;
        SimulatedTransfer::new(format!("sample_file_{:03}.mkv", i + 1), status, size, speed, ctx)
    }

    /// 推进所有任务，已完成的任务从 registry 中移除，返回移除数量
    pub async fn tick(&self, secs: u64) -> usize {
        let mut transfers = self.transfers.lock().await;
        for transfer in transfers.iter() {
            transfer.advance(secs);
        }

        let (finished, running): (Vec<_>, Vec<_>) = transfers.drain(..).partition(|t| t.is_finished());
        *transfers = running;
        drop(transfers);

        for transfer in &finished {
            self.registry.remove(&transfer.gid()).await;
            debug!("模拟任务完成: {}", transfer.name());
        }
        finished.len()
    }

    pub async fn cancel(&self, gid: &str) -> bool {
        let mut transfers = self.transfers.lock().await;
        let before = transfers.len();
        transfers.retain(|t| t.gid() != gid);
        let removed = transfers.len() != before;
        drop(transfers);

        if removed {
            self.registry.remove(gid).await;
        }
        removed
    }
}
