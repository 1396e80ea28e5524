use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use super::category::StatusCategory;

/// 分页计算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 归一化后的页码，始终在 [1, pages] 内
    pub page_no: i64,
    pub pages: i64,
    /// 当前页第一个任务在列表中的下标
    pub start: usize,
    /// 请求页码越界、发生了回绕
    pub wrapped: bool,
}

pub fn total_pages(count: usize, limit: usize) -> i64 {
    let limit = limit.max(1);
    count.max(1).div_ceil(limit) as i64
}

/// 计算页边界，越界页码按循环方式回绕
pub fn paginate(count: usize, limit: usize, requested: i64) -> Page {
    let limit = limit.max(1);
    let pages = total_pages(count, limit);

    let (page_no, wrapped) = if requested > pages {
        ((requested - 1) % pages + 1, true)
    } else if requested < 1 {
        (pages - (requested.unsigned_abs() % pages as u64) as i64, true)
    } else {
        (requested, false)
    };

    Page {
        page_no,
        pages,
        start: (page_no as usize - 1) * limit,
        wrapped,
    }
}

// -----------------------------------------------------------------------------------------------

/// 每个查看者的翻页状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub page_no: i64,
    pub page_step: i64,
    pub category: StatusCategory,
    pub is_user: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_no: 1,
            page_step: 1,
            category: StatusCategory::All,
            is_user: false,
        }
    }
}

/// viewer id -> 翻页状态
///
/// 写入都是幂等的标量覆盖，并发下最多读到旧页码，不会损坏。
#[derive(Debug, Default)]
pub struct PageStates {
    states: DashMap<i64, PageState>,
}

impl PageStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, viewer_id: i64) -> Option<PageState> {
        self.states.get(&viewer_id).map(|s| *s)
    }

    /// 首次查看时创建
    pub fn get_or_create(&self, viewer_id: i64, is_user: bool) -> PageState {
        *self.states.entry(viewer_id).or_insert_with(|| PageState {
            is_user,
            ..PageState::default()
        })
    }

    pub fn record(&self, viewer_id: i64, state: PageState) {
        self.states.insert(viewer_id, state);
    }

    pub fn set_page(&self, viewer_id: i64, page_no: i64) {
        self.states.entry(viewer_id).or_default().page_no = page_no;
    }

    pub fn set_step(&self, viewer_id: i64, step: i64) {
        self.states.entry(viewer_id).or_default().page_step = step.max(1);
    }

    // 切换分类后回到第一页
    pub fn set_category(&self, viewer_id: i64, category: StatusCategory) {
        let mut state = self.states.entry(viewer_id).or_default();
        state.category = category;
        state.page_no = 1;
    }

    // 页码只做饱和加减，越界交给 paginate 回绕
    pub fn next_page(&self, viewer_id: i64) -> i64 {
        let mut state = self.states.entry(viewer_id).or_default();
        let step = state.page_step;
        state.page_no = state.page_no.saturating_add(step);
        debug!("viewer {} 下一页: {}", viewer_id, state.page_no);
        state.page_no
    }

    pub fn prev_page(&self, viewer_id: i64) -> i64 {
        let mut state = self.states.entry(viewer_id).or_default();
        let step = state.page_step;
        state.page_no = state.page_no.saturating_sub(step);
        debug!("viewer {} 上一页: {}", viewer_id, state.page_no);
        state.page_no
    }

    pub fn remove(&self, viewer_id: i64) -> Option<PageState> {
        self.states.remove(&viewer_id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
