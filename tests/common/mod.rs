#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use mirror_status::common::config::AppConfig;
use mirror_status::status::error::{Result, StatusError};
use mirror_status::status::{Refresh, StatusView, TaskContext, TaskRegistry, TaskStatus, TransferTask};
use mirror_status::system::{ResourceSampler, ResourceSnapshot};

#[derive(Debug, Clone, Copy)]
pub enum ProgressMode {
    Value(f64),
    Fail,
    Hang,
}

pub struct FakeTask {
    pub gid: String,
    pub name: String,
    pub status: String,
    pub ctx: TaskContext,
    pub processed: u64,
    pub size: u64,
    pub speed: u64,
    pub eta: Option<u64>,
    pub progress: ProgressMode,
    pub refreshable: bool,
    pub refresh_fails: bool,
    pub refresh_calls: AtomicUsize,
}

impl FakeTask {
    pub fn new(gid: &str) -> Self {
        Self {
            gid: gid.to_string(),
            name: format!("{}.bin", gid),
            status: TaskStatus::Downloading.label().to_string(),
            ctx: TaskContext::new(1, "@tester", "Leech"),
            processed: 512 * 1024,
            size: 1024 * 1024,
            speed: 2048,
            eta: Some(256),
            progress: ProgressMode::Value(50.0),
            refreshable: false,
            refresh_fails: false,
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.ctx.user_id = user_id;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.ctx.tag = tag.to_string();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.ctx.started_at = started_at;
        self
    }

    pub fn progress(mut self, mode: ProgressMode) -> Self {
        self.progress = mode;
        self
    }

    pub fn refreshable(mut self, fails: bool) -> Self {
        self.refreshable = true;
        self.refresh_fails = fails;
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferTask for FakeTask {
    fn gid(&self) -> String {
        self.gid.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn status(&self) -> String {
        self.status.clone()
    }

    fn processed_bytes(&self) -> u64 {
        self.processed
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn speed(&self) -> u64 {
        self.speed
    }

    fn eta(&self) -> Option<u64> {
        self.eta
    }

    fn engine(&self) -> &str {
        "fake"
    }

    fn context(&self) -> &TaskContext {
        &self.ctx
    }

    async fn progress(&self) -> Result<f64> {
        match self.progress {
            ProgressMode::Value(v) => Ok(v),
            ProgressMode::Fail => Err(StatusError::Progress {
                gid: self.gid.clone(),
                reason: "engine offline".to_string(),
            }),
            ProgressMode::Hang => std::future::pending().await,
        }
    }

    fn as_refresh(&self) -> Option<&dyn Refresh> {
        if self.refreshable { Some(self) } else { None }
    }
}

#[async_trait]
impl Refresh for FakeTask {
    async fn refresh(&self) -> Result<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fails {
            return Err(StatusError::Refresh {
                gid: self.gid.clone(),
                reason: "rpc error".to_string(),
            });
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------

pub struct FixedSampler {
    pub started_at: DateTime<Utc>,
}

impl FixedSampler {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now() - Duration::hours(1),
        }
    }

    pub fn started_ago(secs: i64) -> Self {
        Self {
            started_at: Utc::now() - Duration::seconds(secs),
        }
    }
}

#[async_trait]
impl ResourceSampler for FixedSampler {
    async fn sample(&self) -> Result<ResourceSnapshot> {
        Ok(ResourceSnapshot {
            cpu_percent: 12.5,
            disk_free: 10 * 1024 * 1024 * 1024,
            memory_percent: 40.0,
            started_at: self.started_at,
        })
    }
}

pub struct FailingSampler;

#[async_trait]
impl ResourceSampler for FailingSampler {
    async fn sample(&self) -> Result<ResourceSnapshot> {
        Err(StatusError::Sampler("psutil unavailable".to_string()))
    }
}

// -----------------------------------------------------------------------------------------------

pub fn test_config(status_limit: usize) -> AppConfig {
    AppConfig {
        status_limit,
        accessor_timeout_secs: 1,
        ..AppConfig::default()
    }
}

pub async fn registry_with(tasks: Vec<FakeTask>) -> TaskRegistry {
    let registry = TaskRegistry::new(std::time::Duration::from_secs(1));
    for task in tasks {
        registry.insert(Arc::new(task)).await.unwrap();
    }
    registry
}

pub async fn numbered_tasks(count: usize) -> TaskRegistry {
    registry_with((0..count).map(|i| FakeTask::new(&format!("gid{:03}", i))).collect()).await
}

pub fn view_with(registry: TaskRegistry, config: AppConfig) -> StatusView {
    StatusView::new(registry, Arc::new(FixedSampler::new()), config)
}
