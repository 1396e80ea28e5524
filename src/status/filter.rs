use std::sync::Arc;

use super::category::{StatusCategory, TaskStatus};
use super::task::TaskHandle;

/// 判断任务的原始状态是否属于某个分类
///
/// 无法识别的状态统一归入 `Download`，避免引擎上报的临时状态让任务从视图中消失。
pub fn matches_category(raw_status: &str, category: StatusCategory) -> bool {
    match category {
        StatusCategory::All => true,
        StatusCategory::Only(status) => {
            raw_status == status.label()
                || (status == TaskStatus::Downloading && TaskStatus::from_label(raw_status).is_none())
        }
    }
}

pub fn filter_tasks(
    tasks: &[TaskHandle],
    category: StatusCategory,
    user_id: Option<i64>,
) -> Vec<TaskHandle> {
    tasks
        .iter()
        .filter(|task| user_id.is_none_or(|uid| task.context().user_id == uid))
        .filter(|task| match category {
            StatusCategory::All => true,
            _ => matches_category(&task.status(), category),
        })
        .map(Arc::clone)
        .collect()
}
