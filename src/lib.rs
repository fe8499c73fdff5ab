//! 列表/表格视图的选区模型。
//!
//! - [`RangeSelection`]：有序、互不相交的闭区间集合，支持合并插入、拆分删除，
//!   以及底层序列插入/删除时的下标平移。
//! - [`ListenerList`] 与 [`broadcast`]：监听器登记和同步广播。
//! - [`ListView`]：持有数据序列，把数据变化同步到选区并通知监听器。

mod listener;
mod range;
mod selection;
mod view;

use thiserror::Error;

pub use listener::{ListenerList, broadcast};
pub use range::IndexRange;
pub use selection::RangeSelection;
pub use view::{
    DisabledFilter, ListView, ListViewListener, RowListener, SelectMode, SelectionListener,
};

/// 监听器回调返回的错误。
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// 监听器回调失败，本次广播的剩余监听器未被通知。
    #[error(transparent)]
    Listener(BoxError),
}
