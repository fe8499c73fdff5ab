//! 持有数据序列并维护选区的列表视图。
//!
//! [`ListView`] 拥有底层的 `Vec<T>`，数据的插入、删除、清空、排序都会先同步到
//! [`RangeSelection`]，再通知已注册的监听器。每次修改都在通知之前完成，
//! 所以回调里看到的视图状态总是一致的。

use std::{cmp::Ordering, fmt, mem};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    BoxError, Error, IndexRange, RangeSelection,
    listener::{ListenerList, broadcast},
};

/// 选择模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// 禁止选择。
    None,
    /// 同一时刻最多选中一个下标。
    #[default]
    Single,
    /// 可以同时选中多个区间。
    Multi,
}

/// 判断某一行是否被禁用。
pub type DisabledFilter<T> = Box<dyn Fn(&T) -> bool>;

/// 视图本身的属性变化。所有方法都有空实现，只需覆盖关心的事件。
pub trait ListViewListener<T> {
    /// 底层数据被整体替换，`previous` 是替换前的数据。
    fn items_changed(&self, _view: &ListView<T>, _previous: &[T]) -> Result<(), BoxError> {
        Ok(())
    }

    fn disabled_filter_changed(
        &self,
        _view: &ListView<T>,
        _previous: Option<&dyn Fn(&T) -> bool>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn select_mode_changed(
        &self,
        _view: &ListView<T>,
        _previous: SelectMode,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 底层数据序列的结构变化。
pub trait RowListener<T> {
    fn row_inserted(&self, _view: &ListView<T>, _index: usize) -> Result<(), BoxError> {
        Ok(())
    }

    fn rows_removed(&self, _view: &ListView<T>, _index: usize, _count: usize) -> Result<(), BoxError> {
        Ok(())
    }

    fn row_updated(&self, _view: &ListView<T>, _index: usize) -> Result<(), BoxError> {
        Ok(())
    }

    fn rows_cleared(&self, _view: &ListView<T>) -> Result<(), BoxError> {
        Ok(())
    }

    fn rows_sorted(&self, _view: &ListView<T>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 选区变化。
///
/// 增量修改（`add_selected_*` / `remove_selected_*`）按子区间逐个触发
/// `selected_range_added` / `selected_range_removed`；整体替换或清空触发
/// `selected_ranges_changed`，参数是替换前的选区。
pub trait SelectionListener<T> {
    fn selected_range_added(&self, _view: &ListView<T>, _range: IndexRange) -> Result<(), BoxError> {
        Ok(())
    }

    fn selected_range_removed(
        &self,
        _view: &ListView<T>,
        _range: IndexRange,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn selected_ranges_changed(
        &self,
        _view: &ListView<T>,
        _previous: &[IndexRange],
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

pub struct ListView<T> {
    items: Vec<T>,
    selection: RangeSelection,
    select_mode: SelectMode,
    disabled_filter: Option<DisabledFilter<T>>,
    view_listeners: ListenerList<dyn ListViewListener<T>>,
    row_listeners: ListenerList<dyn RowListener<T>>,
    selection_listeners: ListenerList<dyn SelectionListener<T>>,
}

impl<T: fmt::Debug> fmt::Debug for ListView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("items", &self.items)
            .field("selection", &self.selection)
            .field("select_mode", &self.select_mode)
            .field("disabled_filter", &self.disabled_filter.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    pub fn from_items(items: Vec<T>) -> Self {
        ListView {
            items,
            selection: RangeSelection::new(),
            select_mode: SelectMode::default(),
            disabled_filter: None,
            view_listeners: ListenerList::new(),
            row_listeners: ListenerList::new(),
            selection_listeners: ListenerList::new(),
        }
    }

    #[must_use]
    pub fn with_select_mode(mut self, select_mode: SelectMode) -> Self {
        self.select_mode = select_mode;
        self
    }

    pub fn view_listeners(&self) -> &ListenerList<dyn ListViewListener<T>> {
        &self.view_listeners
    }

    pub fn row_listeners(&self) -> &ListenerList<dyn RowListener<T>> {
        &self.row_listeners
    }

    pub fn selection_listeners(&self) -> &ListenerList<dyn SelectionListener<T>> {
        &self.selection_listeners
    }

    // ---- 数据 ----

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }

    pub fn push(&mut self, item: T) -> Result<(), Error> {
        self.insert(self.items.len(), item)
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<(), Error> {
        if index > self.items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, item);
        self.item_inserted(index)
    }

    /// 从 `index` 开始移除 `count` 项并返回它们。
    pub fn remove(&mut self, index: usize, count: usize) -> Result<Vec<T>, Error> {
        let end = index
            .checked_add(count)
            .filter(|&end| end <= self.items.len())
            .ok_or(Error::IndexOutOfBounds {
                index: index.saturating_add(count),
                len: self.items.len(),
            })?;
        let removed: Vec<T> = self.items.drain(index..end).collect();
        self.items_removed(index, count)?;
        Ok(removed)
    }

    /// 替换 `index` 处的元素，返回旧值。选区不变。
    pub fn set(&mut self, index: usize, item: T) -> Result<T, Error> {
        self.check_index(index)?;
        let previous = mem::replace(&mut self.items[index], item);
        trace!(index, "row updated");
        self.fire_rows(|l, view| l.row_updated(view, index))?;
        Ok(previous)
    }

    /// 整体替换底层数据并返回旧数据。原有下标全部失效，选区被直接清空（不触发选区事件）。
    pub fn set_items(&mut self, items: Vec<T>) -> Result<Vec<T>, Error> {
        let previous = mem::replace(&mut self.items, items);
        self.selection.clear();
        debug!(
            previous_len = previous.len(),
            len = self.items.len(),
            "items replaced, selection cleared"
        );
        self.fire_view(|l, view| l.items_changed(view, &previous))?;
        Ok(previous)
    }

    pub fn clear(&mut self) -> Result<(), Error> {
        self.items.clear();
        self.list_cleared()
    }

    /// 排序会使原有下标失效，选区被直接清空（不触发选区事件）。
    pub fn sort_by<F>(&mut self, compare: F) -> Result<(), Error>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(compare);
        self.selection.clear();
        debug!(len = self.items.len(), "rows sorted, selection cleared");
        self.fire_rows(|l, view| l.rows_sorted(view))
    }

    fn item_inserted(&mut self, index: usize) -> Result<(), Error> {
        self.selection.insert_index(index);
        trace!(index, selection = ?self.selection, "row inserted");
        self.fire_rows(|l, view| l.row_inserted(view, index))
    }

    fn items_removed(&mut self, index: usize, count: usize) -> Result<(), Error> {
        self.selection.remove_indexes(index, count);
        trace!(index, count, selection = ?self.selection, "rows removed");
        self.fire_rows(|l, view| l.rows_removed(view, index, count))
    }

    fn list_cleared(&mut self) -> Result<(), Error> {
        self.selection.clear();
        debug!("rows cleared, selection cleared");
        self.fire_rows(|l, view| l.rows_cleared(view))
    }

    // ---- 选区 ----

    pub fn select_mode(&self) -> SelectMode {
        self.select_mode
    }

    /// 切换选择模式。模式变化时先清空选区。
    pub fn set_select_mode(&mut self, select_mode: SelectMode) -> Result<(), Error> {
        let previous_mode = self.select_mode;
        if previous_mode == select_mode {
            return Ok(());
        }
        let previous = mem::take(&mut self.selection).to_vec();
        self.select_mode = select_mode;
        debug!(?previous_mode, ?select_mode, "select mode changed");
        if !previous.is_empty() {
            self.fire_ranges_changed(&previous)?;
        }
        self.fire_view(|l, view| l.select_mode_changed(view, previous_mode))
    }

    /// `filter` 返回 true 的行视为禁用。
    pub fn is_disabled(&self, index: usize) -> Result<bool, Error> {
        self.check_index(index)?;
        Ok(self
            .disabled_filter
            .as_ref()
            .is_some_and(|filter| filter(&self.items[index])))
    }

    /// 设置或移除禁用过滤器，返回旧的过滤器。两者都为 `None` 时不触发事件。
    pub fn set_disabled_filter(
        &mut self,
        filter: Option<DisabledFilter<T>>,
    ) -> Result<Option<DisabledFilter<T>>, Error> {
        let previous = mem::replace(&mut self.disabled_filter, filter);
        if previous.is_none() && self.disabled_filter.is_none() {
            return Ok(None);
        }
        debug!(enabled = self.disabled_filter.is_some(), "disabled filter changed");
        self.fire_view(|l, view| {
            let previous = previous.as_ref().map(|filter| &**filter as &dyn Fn(&T) -> bool);
            l.disabled_filter_changed(view, previous)
        })?;
        Ok(previous)
    }

    /// 选区的只读视图，不复制。
    pub fn selection(&self) -> &RangeSelection {
        &self.selection
    }

    /// 当前选区的快照。
    pub fn selected_ranges(&self) -> Vec<IndexRange> {
        self.selection.to_vec()
    }

    pub fn first_selected_index(&self) -> Option<usize> {
        self.selection.first_index()
    }

    pub fn last_selected_index(&self) -> Option<usize> {
        self.selection.last_index()
    }

    /// 单选模式下当前选中的下标。
    pub fn selected_index(&self) -> Result<Option<usize>, Error> {
        if self.select_mode != SelectMode::Single {
            return Err(Error::IllegalState("view is not in single-select mode".into()));
        }
        Ok(self.selection.first_index())
    }

    /// `None` 清空选区。
    pub fn set_selected_index(&mut self, index: Option<usize>) -> Result<(), Error> {
        match index {
            Some(index) => self.set_selected_range(index, index).map(|_| ()),
            None => self.clear_selection(),
        }
    }

    pub fn set_selected_range(&mut self, start: usize, end: usize) -> Result<Vec<IndexRange>, Error> {
        let rng = IndexRange::try_new(start, end)?;
        self.set_selected_ranges(&[rng])
    }

    /// 用 `ranges` 整体替换当前选区，返回规整后的新选区。
    pub fn set_selected_ranges(&mut self, ranges: &[IndexRange]) -> Result<Vec<IndexRange>, Error> {
        match self.select_mode {
            SelectMode::None => {
                return Err(Error::IllegalState("selection is not enabled".into()));
            }
            SelectMode::Single => {
                if ranges.len() > 1 {
                    return Err(Error::InvalidArgument(
                        "selection length is greater than 1".into(),
                    ));
                }
                if ranges.first().is_some_and(|rng| rng.len() > 1) {
                    return Err(Error::InvalidArgument(
                        "selected range length is greater than 1".into(),
                    ));
                }
            }
            SelectMode::Multi => {}
        }

        let mut selection = RangeSelection::new();
        for rng in ranges {
            self.check_index(rng.end())?;
            selection.add_range(rng.start(), rng.end())?;
        }
        let previous = mem::replace(&mut self.selection, selection).to_vec();
        debug!(selection = ?self.selection, "selected ranges replaced");
        self.fire_ranges_changed(&previous)?;
        Ok(self.selection.to_vec())
    }

    /// 以 `[{"start": 0, "end": 2}, ...]` 形式设置选区。
    pub fn set_selected_ranges_json(&mut self, json: &str) -> Result<Vec<IndexRange>, Error> {
        let ranges: Vec<IndexRange> = serde_json::from_str(json)?;
        self.set_selected_ranges(&ranges)
    }

    pub fn selected_ranges_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.selection)?)
    }

    pub fn add_selected_index(&mut self, index: usize) -> Result<bool, Error> {
        self.add_selected_range(index, index)
            .map(|added| !added.is_empty())
    }

    /// 多选模式下把 `[start, end]` 加入选区，返回新加入的子区间。
    pub fn add_selected_range(&mut self, start: usize, end: usize) -> Result<Vec<IndexRange>, Error> {
        self.require_multi()?;
        let rng = IndexRange::try_new(start, end)?;
        self.check_index(rng.end())?;
        let added = self.selection.add_range(rng.start(), rng.end())?;
        trace!(?rng, ?added, "selected range added");
        for &sub in &added {
            self.fire_selection(|l, view| l.selected_range_added(view, sub))?;
        }
        Ok(added)
    }

    pub fn remove_selected_index(&mut self, index: usize) -> Result<bool, Error> {
        self.remove_selected_range(index, index)
            .map(|removed| !removed.is_empty())
    }

    /// 多选模式下把 `[start, end]` 移出选区，返回真正被移除的子区间。
    pub fn remove_selected_range(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<Vec<IndexRange>, Error> {
        self.require_multi()?;
        let rng = IndexRange::try_new(start, end)?;
        self.check_index(rng.end())?;
        let removed = self.selection.remove_range(rng.start(), rng.end())?;
        trace!(?rng, ?removed, "selected range removed");
        for &sub in &removed {
            self.fire_selection(|l, view| l.selected_range_removed(view, sub))?;
        }
        Ok(removed)
    }

    pub fn select_all(&mut self) -> Result<(), Error> {
        match self.items.len() {
            0 => self.clear_selection(),
            len => self.set_selected_range(0, len - 1).map(|_| ()),
        }
    }

    pub fn clear_selection(&mut self) -> Result<(), Error> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let previous = mem::take(&mut self.selection).to_vec();
        debug!("selection cleared");
        self.fire_ranges_changed(&previous)
    }

    pub fn is_selected(&self, index: usize) -> Result<bool, Error> {
        self.check_index(index)?;
        Ok(self.selection.contains_index(index))
    }

    /// 按下标升序返回所有被选中的元素。
    pub fn selected_items(&self) -> Vec<&T> {
        self.selection
            .ranges()
            .flat_map(|rng| rng.start()..=rng.end())
            .filter_map(|index| self.items.get(index))
            .collect()
    }

    /// 单选模式下当前选中的元素。
    pub fn selected_item(&self) -> Result<Option<&T>, Error> {
        Ok(self.selected_index()?.and_then(|index| self.items.get(index)))
    }

    fn require_multi(&self) -> Result<(), Error> {
        if self.select_mode != SelectMode::Multi {
            return Err(Error::IllegalState("view is not in multi-select mode".into()));
        }
        Ok(())
    }

    fn fire_view<F>(&self, mut notify: F) -> Result<(), Error>
    where
        F: FnMut(&dyn ListViewListener<T>, &Self) -> Result<(), BoxError>,
    {
        broadcast(&self.view_listeners, |l| notify(l, self))
    }

    fn fire_rows<F>(&self, mut notify: F) -> Result<(), Error>
    where
        F: FnMut(&dyn RowListener<T>, &Self) -> Result<(), BoxError>,
    {
        broadcast(&self.row_listeners, |l| notify(l, self))
    }

    fn fire_selection<F>(&self, mut notify: F) -> Result<(), Error>
    where
        F: FnMut(&dyn SelectionListener<T>, &Self) -> Result<(), BoxError>,
    {
        broadcast(&self.selection_listeners, |l| notify(l, self))
    }

    fn fire_ranges_changed(&self, previous: &[IndexRange]) -> Result<(), Error> {
        self.fire_selection(|l, view| l.selected_ranges_changed(view, previous))
    }
}

impl<T: PartialEq> ListView<T> {
    fn index_of(&self, item: &T) -> Result<usize, Error> {
        self.items
            .iter()
            .position(|candidate| candidate == item)
            .ok_or_else(|| Error::InvalidArgument("item is not a valid selection".into()))
    }

    /// `None` 清空选区。
    pub fn set_selected_item(&mut self, item: Option<&T>) -> Result<(), Error> {
        let index = item.map(|item| self.index_of(item)).transpose()?;
        self.set_selected_index(index)
    }

    pub fn set_selected_items(&mut self, items: &[T]) -> Result<Vec<IndexRange>, Error> {
        let ranges = items
            .iter()
            .map(|item| self.index_of(item).map(IndexRange::single))
            .collect::<Result<Vec<_>, _>>()?;
        self.set_selected_ranges(&ranges)
    }
}
