use serde::Serialize;

use super::category::StatusCategory;

const CALLBACK_PREFIX: &str = "status";

/// 状态视图按钮对应的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Refresh,
    Prev,
    Next,
    Overview,
    Stats,
    Category(StatusCategory),
    PageStep(i64),
}

impl ControlAction {
    pub fn keyword(&self) -> &'static str {
        match self {
            ControlAction::Refresh => "ref",
            ControlAction::Prev => "pre",
            ControlAction::Next => "nex",
            ControlAction::Overview => "ov",
            ControlAction::Stats => "stats",
            ControlAction::Category(_) => "st",
            ControlAction::PageStep(_) => "ps",
        }
    }

    /// 编码为 `status <viewer_id> <keyword> [param]`
    pub fn encode(&self, viewer_id: i64) -> String {
        match self {
            ControlAction::Category(category) => {
                format!("{} {} {} {}", CALLBACK_PREFIX, viewer_id, self.keyword(), category.code())
            }
            ControlAction::PageStep(step) => {
                format!("{} {} {} {}", CALLBACK_PREFIX, viewer_id, self.keyword(), step)
            }
            _ => format!("{} {} {}", CALLBACK_PREFIX, viewer_id, self.keyword()),
        }
    }

    /// `encode` 的逆操作，格式不对返回 None
    pub fn parse(data: &str) -> Option<(i64, ControlAction)> {
        let mut parts = data.split_whitespace();
        if parts.next()? != CALLBACK_PREFIX {
            return None;
        }
        let viewer_id = parts.next()?.parse().ok()?;
        let action = match parts.next()? {
            "ref" => ControlAction::Refresh,
            "pre" => ControlAction::Prev,
            "nex" => ControlAction::Next,
            "ov" => ControlAction::Overview,
            "stats" => ControlAction::Stats,
            "st" => ControlAction::Category(StatusCategory::parse(parts.next()?)?),
            "ps" => {
                let step: i64 = parts.next()?.parse().ok()?;
                if step < 1 {
                    return None;
                }
                ControlAction::PageStep(step)
            }
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((viewer_id, action))
    }
}

// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPosition {
    Header,
    Body,
    Footer,
}

/// 按钮网格，逐行排列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlLayout {
    pub rows: Vec<Vec<Button>>,
}

impl ControlLayout {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn contains_data(&self, data: &str) -> bool {
        self.buttons().any(|b| b.data == data)
    }

    pub fn labels(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|b| b.label.clone()).collect())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ButtonMaker {
    header: Vec<Button>,
    body: Vec<Button>,
    footer: Vec<Button>,
}

impl ButtonMaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_button(&mut self, label: impl Into<String>, data: impl Into<String>, position: ButtonPosition) {
        let button = Button {
            label: label.into(),
            data: data.into(),
        };
        match position {
            ButtonPosition::Header => self.header.push(button),
            ButtonPosition::Body => self.body.push(button),
            ButtonPosition::Footer => self.footer.push(button),
        }
    }

    pub fn action_button(&mut self, label: impl Into<String>, viewer_id: i64, action: ControlAction, position: ButtonPosition) {
        self.data_button(label, action.encode(viewer_id), position);
    }

    /// header 单独占第一行，body 按 `columns` 分行，footer 占最后一行
    pub fn build_menu(self, columns: usize) -> ControlLayout {
        let mut rows = Vec::new();
        if !self.header.is_empty() {
            rows.push(self.header);
        }
        rows.extend(self.body.chunks(columns.max(1)).map(|chunk| chunk.to_vec()));
        if !self.footer.is_empty() {
            rows.push(self.footer);
        }
        ControlLayout { rows }
    }
}
