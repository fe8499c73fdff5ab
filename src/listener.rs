//! 监听器注册表与广播。
//!
//! [`ListenerList`] 只负责登记（按注册顺序保存、增删、快照），
//! [`broadcast`] 负责把一次事件同步地分发给快照中的每个监听器。
//! 两者分开，注册表本身不实现任何监听器接口。

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use tracing::trace;

use crate::{BoxError, Error};

struct Entry<L: ?Sized> {
    listener: Rc<L>,
    // 快照与登记项共享，移除时置位
    removed: Rc<Cell<bool>>,
}

/// 按注册顺序保存的监听器列表。
///
/// 允许重复注册同一个监听器，重复注册的监听器会收到重复的通知；
/// 避免重复添加是调用方的责任。
///
/// 所有方法只需要 `&self`，因此监听器可以在回调中增删自身或其他监听器。
/// 非线程安全，只在单一线程（UI 线程）上使用。
pub struct ListenerList<L: ?Sized> {
    entries: RefCell<Vec<Entry<L>>>,
}

impl<L: ?Sized> Default for ListenerList<L> {
    fn default() -> Self {
        ListenerList {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<L: ?Sized> fmt::Debug for ListenerList<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

impl<L: ?Sized> ListenerList<L> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&self, listener: Rc<L>) {
        self.entries.borrow_mut().push(Entry {
            listener,
            removed: Rc::new(Cell::new(false)),
        });
    }

    /// 移除第一个与 `listener` 指向同一对象的登记项。不存在时返回 false。
    pub fn remove(&self, listener: &Rc<L>) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries
            .iter()
            .position(|entry| same_listener(&entry.listener, listener))
        {
            Some(pos) => {
                entries.remove(pos).removed.set(true);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, listener: &Rc<L>) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| same_listener(&entry.listener, listener))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn snapshot(&self) -> Vec<(Rc<Cell<bool>>, Rc<L>)> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| (Rc::clone(&entry.removed), Rc::clone(&entry.listener)))
            .collect()
    }
}

#[inline]
fn same_listener<L: ?Sized>(a: &Rc<L>, b: &Rc<L>) -> bool {
    // 只比较数据指针，不比较 vtable
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// 把一次事件按注册顺序同步分发给 `list` 中的监听器。
///
/// 分发的对象是调用开始时的快照：回调中新注册的监听器要到下一次广播才会收到通知；
/// 轮到之前已被移除的监听器会被跳过。
///
/// 任一回调返回错误时立即中止，剩余监听器不再收到本次通知，错误以
/// [`Error::Listener`] 返回给调用方。监听器之间没有隔离。
pub fn broadcast<L, F>(list: &ListenerList<L>, mut notify: F) -> Result<(), Error>
where
    L: ?Sized,
    F: FnMut(&L) -> Result<(), BoxError>,
{
    let snapshot = list.snapshot();
    trace!(listeners = snapshot.len(), "broadcast");
    for (removed, listener) in snapshot {
        if removed.get() {
            continue;
        }
        notify(&*listener).map_err(Error::Listener)?;
    }
    Ok(())
}
