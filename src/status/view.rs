use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::buttons::{ButtonMaker, ButtonPosition, ControlAction, ControlLayout};
use super::category::{StatusCategory, TaskStatus};
use super::error::Result;
use super::filter::matches_category;
use super::pager::{Page, PageState, PageStates, paginate};
use super::registry::TaskRegistry;
use super::render::{RenderOptions, render_task};
use crate::common::config::AppConfig;
use crate::common::units::{get_readable_file_size, get_readable_time};
use crate::system::{ResourceSampler, ResourceSnapshot};

const RESTART_WARNING_SECS: i64 = 3600;

/// 组装好的状态消息
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub controls: ControlLayout,
    pub page: Page,
    pub task_count: usize,
}

/// 按钮操作的处理结果
#[derive(Debug, Clone)]
pub enum ActionReply {
    /// 重新渲染后的状态视图，None 表示没有可显示的任务
    Status(Option<StatusMessage>),
    Overview(String),
    Stats(String),
}

pub struct StatusView {
    registry: TaskRegistry,
    sampler: Arc<dyn ResourceSampler>,
    config: AppConfig,
    pages: PageStates,
}

impl StatusView {
    pub fn new(registry: TaskRegistry, sampler: Arc<dyn ResourceSampler>, config: AppConfig) -> Self {
        Self {
            registry,
            sampler,
            config,
            pages: PageStates::new(),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn pages(&self) -> &PageStates {
        &self.pages
    }

    /// 生成状态报告；`All` 分类下没有任务时返回 None，调用方应不显示任何内容
    pub async fn compose(
        &self,
        viewer_id: i64,
        is_user: bool,
        page_no: i64,
        category: StatusCategory,
        page_step: i64,
    ) -> Result<Option<StatusMessage>> {
        let limit = self.config.status_limit;
        let page_step = page_step.max(1);
        let tasks = self
            .registry
            .tasks_for(category, is_user.then_some(viewer_id))
            .await;
        let task_count = tasks.len();

        let page = paginate(task_count, limit, page_no);
        if page.wrapped {
            debug!("viewer {} 页码 {} 回绕到 {}", viewer_id, page_no, page.page_no);
        }

        let opts = RenderOptions {
            category,
            now: Utc::now(),
            accessor_timeout: self.registry.accessor_timeout(),
            cancel_command: self.config.cancel_command.clone(),
        };
        let blocks = try_join_all(
            tasks
                .iter()
                .skip(page.start)
                .take(limit)
                .enumerate()
                .map(|(i, task)| render_task(task.as_ref(), page.start + i + 1, &opts)),
        )
        .await
        .inspect_err(|e| warn!("状态渲染失败: {}", e))?;

        // 渲染成功后才保存翻页状态
        self.pages.record(
            viewer_id,
            PageState {
                page_no: page.page_no,
                page_step,
                category,
                is_user,
            },
        );

        let mut text = match &self.config.header {
            Some(header) => format!("{}\n\n", header),
            None => String::new(),
        };
        if blocks.is_empty() {
            if category == StatusCategory::All {
                return Ok(None);
            }
            text.push_str(&format!("No Active {} Tasks!\n\n", category.label()));
        } else {
            text.extend(blocks);
        }

        let mut buttons = ButtonMaker::new();
        if is_user {
            buttons.action_button("ʀᴇғʀᴇsʜ", viewer_id, ControlAction::Refresh, ButtonPosition::Header);
        } else {
            buttons.action_button("ɪɴғᴏ\n🧩", viewer_id, ControlAction::Overview, ButtonPosition::Footer);
            buttons.action_button("sʏsᴛᴇᴍ\n⚡", viewer_id, ControlAction::Stats, ButtonPosition::Footer);
        }

        if task_count > limit {
            text.push_str(&format!("Tasks: {} | Step: {}\n", task_count, page_step));
            buttons.action_button("⫷", viewer_id, ControlAction::Prev, ButtonPosition::Header);
            buttons.action_button(
                format!("ᴘᴀɢᴇs\n{}/{}", page.page_no, page.pages),
                viewer_id,
                ControlAction::Refresh,
                ButtonPosition::Header,
            );
            buttons.action_button("⫸", viewer_id, ControlAction::Next, ButtonPosition::Header);
            if task_count > self.config.page_size_threshold {
                for step in &self.config.page_steps {
                    buttons.action_button(
                        step.to_string(),
                        viewer_id,
                        ControlAction::PageStep(*step),
                        ButtonPosition::Body,
                    );
                }
            }
        }

        if category != StatusCategory::All && task_count > self.config.category_threshold {
            for shortcut in StatusCategory::shortcuts()
                .take(self.config.category_shortcuts)
                .filter(|c| *c != category)
            {
                buttons.action_button(
                    shortcut.code(),
                    viewer_id,
                    ControlAction::Category(shortcut),
                    ButtonPosition::Body,
                );
            }
        }
        let controls = buttons.build_menu(self.config.menu_columns);

        let snapshot = self.sampler.sample().await?;
        text.push_str(&self.metrics_line(&snapshot));
        if let Some(notice) = self.restart_notice(&snapshot) {
            text.push_str("\n\n");
            text.push_str(&notice);
        }

        Ok(Some(StatusMessage {
            text,
            controls,
            page,
            task_count,
        }))
    }

    /// 按查看者保存的翻页状态重新生成
    pub async fn refresh(&self, viewer_id: i64, is_user: bool) -> Result<Option<StatusMessage>> {
        let state = self.pages.get_or_create(viewer_id, is_user);
        self.compose(viewer_id, state.is_user, state.page_no, state.category, state.page_step)
            .await
    }

    /// 处理按钮回调数据，无法解析时返回 None
    pub async fn handle_action(&self, data: &str) -> Result<Option<ActionReply>> {
        let Some((viewer_id, action)) = ControlAction::parse(data) else {
            debug!("无法解析的按钮数据: {}", data);
            return Ok(None);
        };
        // 未知的查看者按普通用户处理
        let state = self.pages.get_or_create(viewer_id, true);

        match action {
            ControlAction::Refresh => {}
            ControlAction::Next => {
                self.pages.next_page(viewer_id);
            }
            ControlAction::Prev => {
                self.pages.prev_page(viewer_id);
            }
            ControlAction::PageStep(step) => self.pages.set_step(viewer_id, step),
            ControlAction::Category(category) => self.pages.set_category(viewer_id, category),
            ControlAction::Overview => {
                let text = self.overview(viewer_id, state.is_user).await;
                return Ok(Some(ActionReply::Overview(text)));
            }
            ControlAction::Stats => {
                let text = self.stats().await?;
                return Ok(Some(ActionReply::Stats(text)));
            }
        }

        // 渲染失败时恢复操作前的翻页状态
        let message = self
            .refresh(viewer_id, state.is_user)
            .await
            .inspect_err(|_| self.pages.record(viewer_id, state))?;
        Ok(Some(ActionReply::Status(message)))
    }

    /// 各分类的任务数量
    pub async fn overview(&self, viewer_id: i64, is_user: bool) -> String {
        let tasks = self
            .registry
            .tasks_for(StatusCategory::All, is_user.then_some(viewer_id))
            .await;
        let statuses: Vec<String> = tasks.iter().map(|t| t.status()).collect();

        let mut text = String::from("<b>Tasks Overview</b>\n\n");
        for status in TaskStatus::ALL {
            let count = statuses
                .iter()
                .filter(|raw| matches_category(raw, StatusCategory::Only(status)))
                .count();
            if count > 0 {
                text.push_str(&format!("{}: {}\n", status.label(), count));
            }
        }
        text.push_str(&format!("\nTotal: {}", tasks.len()));
        text
    }

    pub async fn stats(&self) -> Result<String> {
        let snapshot = self.sampler.sample().await?;
        Ok(format!(
            "<b>System Stats</b>\n\n\
             CPU: {:.1}%\n\
             RAM: {:.1}%\n\
             Free Disk: {}\n\
             Uptime: {}\n\
             Active Tasks: {}",
            snapshot.cpu_percent,
            snapshot.memory_percent,
            get_readable_file_size(snapshot.disk_free),
            get_readable_time(uptime_secs(&snapshot) as u64),
            self.registry.len().await,
        ))
    }

    fn metrics_line(&self, snapshot: &ResourceSnapshot) -> String {
        format!(
            "{}\n🖥️CPU: {:.1}% | 💿FREE: {}\n💾RAM: {:.1}% | 🕒UPTM: {}",
            "▬".repeat(19),
            snapshot.cpu_percent,
            get_readable_file_size(snapshot.disk_free),
            snapshot.memory_percent,
            get_readable_time(uptime_secs(snapshot) as u64),
        )
    }

    fn restart_notice(&self, snapshot: &ResourceSnapshot) -> Option<String> {
        if self.config.restart_interval_secs == 0 {
            return None;
        }
        let remaining = self.config.restart_interval_secs as i64 - uptime_secs(snapshot);
        if remaining >= RESTART_WARNING_SECS {
            return None;
        }
        if remaining > 0 {
            Some(format!(
                "<b><i>Restarts In: {}</i></b>",
                get_readable_time(remaining as u64)
            ))
        } else {
            Some("<b><i>⚠️ ALERT: RESTART IMMINENT ⚠️</i></b>".to_string())
        }
    }
}

fn uptime_secs(snapshot: &ResourceSnapshot) -> i64 {
    Utc::now()
        .signed_duration_since(snapshot.started_at)
        .num_seconds()
        .max(0)
}
