pub mod buttons;
pub mod category;
pub mod error;
pub mod filter;
pub mod pager;
pub mod registry;
pub mod render;
pub mod task;
pub mod view;

pub use buttons::{ButtonMaker, ControlAction, ControlLayout};
pub use category::{StatusCategory, TaskStatus};
pub use error::StatusError;
pub use registry::TaskRegistry;
pub use task::{Refresh, ReportedStats, TaskContext, TaskHandle, TransferTask};
pub use view::{ActionReply, StatusMessage, StatusView};
