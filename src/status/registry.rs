use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::category::StatusCategory;
use super::error::{Result, StatusError};
use super::filter::filter_tasks;
use super::task::TaskHandle;

const DEFAULT_ACCESSOR_TIMEOUT: Duration = Duration::from_secs(10);

struct RegisteredTask {
    seq: u64, // 插入序号，保证快照顺序稳定
    handle: TaskHandle,
}

/// 正在运行的任务表，gid -> 任务
///
/// 所有读写都在同一把锁下完成；快照复制出来后立即释放锁，
/// 之后的 refresh / progress 调用不会阻塞其他访问者。
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<DashMap<String, RegisteredTask>>>,
    next_seq: Arc<AtomicU64>,
    accessor_timeout: Duration,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESSOR_TIMEOUT)
    }
}

impl TaskRegistry {
    pub fn new(accessor_timeout: Duration) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(DashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            accessor_timeout,
        }
    }

    pub fn accessor_timeout(&self) -> Duration {
        self.accessor_timeout
    }

    // 登记新任务
    pub async fn insert(&self, task: TaskHandle) -> Result<()> {
        let gid = task.gid();
        let tasks = self.tasks.lock().await;
        if tasks.contains_key(&gid) {
            return Err(StatusError::TaskAlreadyExists(gid));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        tasks.insert(gid.clone(), RegisteredTask { seq, handle: task });
        debug!("任务已登记: {}", gid);
        Ok(())
    }

    // 任务结束（完成、取消或失败）后移除
    pub async fn remove(&self, gid: &str) -> Option<TaskHandle> {
        let tasks = self.tasks.lock().await;
        let removed = tasks.remove(gid).map(|(_, entry)| entry.handle);
        if removed.is_some() {
            debug!("任务已移除: {}", gid);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 复制当前全部任务，按登记顺序排列
    pub async fn snapshot(&self) -> Vec<TaskHandle> {
        let mut entries: Vec<(u64, TaskHandle)> = {
            let tasks = self.tasks.lock().await;
            tasks
                .iter()
                .map(|entry| (entry.seq, Arc::clone(&entry.handle)))
                .collect()
        };
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, handle)| handle).collect()
    }

    /// 按 gid 查找任务；支持刷新的任务会先刷新，刷新失败不影响查找
    pub async fn lookup(&self, gid: &str) -> Option<TaskHandle> {
        for task in self.snapshot().await {
            if let Some(refresher) = task.as_refresh() {
                match tokio::time::timeout(self.accessor_timeout, refresher.refresh()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => debug!("忽略刷新失败: {}", e),
                    Err(_) => debug!("忽略刷新超时: {}", task.gid()),
                }
            }
            if task.gid() == gid {
                return Some(task);
            }
        }
        None
    }

    /// 快照后按分类和用户筛选
    pub async fn tasks_for(&self, category: StatusCategory, user_id: Option<i64>) -> Vec<TaskHandle> {
        let snapshot = self.snapshot().await;
        filter_tasks(&snapshot, category, user_id)
    }
}
