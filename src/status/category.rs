use std::fmt;

use serde::Serialize;

/// 引擎可上报的暂停标签，不属于任何分类（归入下载中）
pub const PAUSED_LABEL: &str = "Paused ⛔️";

// 任务状态，label 是引擎上报的原始字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskStatus {
    Downloading,
    Uploading,
    QueuedDownload,
    QueuedUpload,
    Archiving,
    Extracting,
    Seeding,
    Converting,
    Cloning,
    Splitting,
    Checking,
    SampleVideo,
    Metadata,
}

impl TaskStatus {
    // 顺序即分类快捷按钮的顺序
    pub const ALL: [TaskStatus; 13] = [
        TaskStatus::Downloading,
        TaskStatus::Uploading,
        TaskStatus::QueuedDownload,
        TaskStatus::QueuedUpload,
        TaskStatus::Archiving,
        TaskStatus::Extracting,
        TaskStatus::Seeding,
        TaskStatus::Converting,
        TaskStatus::Cloning,
        TaskStatus::Splitting,
        TaskStatus::Checking,
        TaskStatus::SampleVideo,
        TaskStatus::Metadata,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Downloading => "Download 📥",
            TaskStatus::Uploading => "Upload 📤",
            TaskStatus::QueuedDownload => "QueueDL ⏳",
            TaskStatus::QueuedUpload => "QueueUL ⏳",
            TaskStatus::Archiving => "Archive 🛠",
            TaskStatus::Extracting => "Extract 📂",
            TaskStatus::Seeding => "Seed 🌧",
            TaskStatus::Converting => "Convert ♻️",
            TaskStatus::Cloning => "Clone 🔃",
            TaskStatus::Splitting => "Split ✂️",
            TaskStatus::Checking => "CheckUp ⏱",
            TaskStatus::SampleVideo => "SampleVid 🎬",
            TaskStatus::Metadata => "Metadata 📝",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TaskStatus::Downloading => "DL",
            TaskStatus::Uploading => "UP",
            TaskStatus::QueuedDownload => "QD",
            TaskStatus::QueuedUpload => "QU",
            TaskStatus::Archiving => "AR",
            TaskStatus::Extracting => "EX",
            TaskStatus::Seeding => "SD",
            TaskStatus::Converting => "CM",
            TaskStatus::Cloning => "CL",
            TaskStatus::Splitting => "SP",
            TaskStatus::Checking => "CK",
            TaskStatus::SampleVideo => "SV",
            TaskStatus::Metadata => "PA",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 状态视图的筛选分类：全部，或单个状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum StatusCategory {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusCategory {
    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::All => "All",
            StatusCategory::Only(status) => status.label(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StatusCategory::All => "ALL",
            StatusCategory::Only(status) => status.code(),
        }
    }

    /// 接受代码（`DL`）或完整标签（`Download 📥`）
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("ALL") {
            return Some(StatusCategory::All);
        }
        TaskStatus::from_code(text)
            .or_else(|| TaskStatus::from_label(text))
            .map(StatusCategory::Only)
    }

    /// ALL 在前，随后是全部状态
    pub fn shortcuts() -> impl Iterator<Item = StatusCategory> {
        std::iter::once(StatusCategory::All).chain(TaskStatus::ALL.into_iter().map(StatusCategory::Only))
    }
}

impl From<TaskStatus> for StatusCategory {
    fn from(status: TaskStatus) -> Self {
        StatusCategory::Only(status)
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
