use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sysinfo::{Disks, System};
use tokio::sync::Mutex;
use tracing::debug;

use crate::status::error::{Result, StatusError};

/// 一次系统资源采样
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub cpu_percent: f32,
    /// 下载目录所在磁盘的剩余空间
    pub disk_free: u64,
    pub memory_percent: f32,
    /// 进程启动时间，用于计算运行时长
    pub started_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<ResourceSnapshot>;
}

// -----------------------------------------------------------------------------------------------

pub struct SysinfoSampler {
    // 复用同一个 System，两次刷新之间才有 CPU 使用率
    system: Mutex<System>,
    disk_path: PathBuf,
    started_at: DateTime<Utc>,
}

impl SysinfoSampler {
    pub fn new(disk_path: impl AsRef<Path>, started_at: DateTime<Utc>) -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            disk_path: disk_path.as_ref().to_path_buf(),
            started_at,
        }
    }

    // 找不到挂载点时按 0 处理，不影响其他指标
    fn free_space(disk_path: &Path) -> u64 {
        let path = std::fs::canonicalize(disk_path)
            .or_else(|_| std::path::absolute(disk_path))
            .unwrap_or_else(|_| disk_path.to_path_buf());
        let disks = Disks::new_with_refreshed_list();
        let free = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space());
        if free.is_none() {
            debug!("找不到路径所在的磁盘: {}", path.display());
        }
        free.unwrap_or(0)
    }
}

#[async_trait]
impl ResourceSampler for SysinfoSampler {
    async fn sample(&self) -> Result<ResourceSnapshot> {
        let (cpu_percent, memory_percent) = {
            let mut system = self.system.lock().await;
            system.refresh_cpu();
            system.refresh_memory();
            let total = system.total_memory();
            let memory_percent = if total == 0 {
                0.0
            } else {
                (system.used_memory() as f64 / total as f64 * 100.0) as f32
            };
            (system.global_cpu_info().cpu_usage(), memory_percent)
        };
        // 枚举磁盘和解析路径都是阻塞调用
        let disk_path = self.disk_path.clone();
        let disk_free = tokio::task::spawn_blocking(move || Self::free_space(&disk_path))
            .await
            .map_err(|e| StatusError::Sampler(format!("磁盘采样任务失败: {}", e)))?;

        debug!(
            "资源采样: cpu={:.1}% mem={:.1}% free={}",
            cpu_percent, memory_percent, disk_free
        );
        Ok(ResourceSnapshot {
            cpu_percent,
            disk_free,
            memory_percent,
            started_at: self.started_at,
        })
    }
}
