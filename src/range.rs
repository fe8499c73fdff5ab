use std::ops;

use serde::{Deserialize, Serialize};

use crate::Error;

/// inclusive
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct IndexRange {
    start: usize,
    end: usize,
}

impl IndexRange {
    /// 调用方保证 `start <= end`。外部输入请用 [`IndexRange::try_new`]。
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        IndexRange { start, end }
    }

    pub fn try_new(start: usize, end: usize) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidArgument(format!(
                "range start {start} is greater than end {end}"
            )));
        }
        Ok(IndexRange { start, end })
    }

    /// 单个下标 `[index, index]`。
    #[inline]
    pub fn single(index: usize) -> Self {
        IndexRange {
            start: index,
            end: index,
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains_index(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// 检查此范围是否 **完全包含** 另一个范围 `other`。
    ///
    /// 示例: `[10, 30].contains(&[15, 25])` -> `true`
    ///       `[10, 20].contains(&[15, 25])` -> `false`
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// 两个范围至少共享一个下标时返回 true（边缘接触也算）。
    ///
    /// 示例: `[10, 20].intersects(&[20, 30])` -> `true`
    ///       `[10, 20].intersects(&[21, 30])` -> `false`
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// 重叠或紧邻（`end + 1 == other.start`）都视为可合并。
    #[inline]
    pub(crate) fn intersects_or_adjacent(&self, other: &Self) -> bool {
        self.start <= other.end.saturating_add(1) && self.end.saturating_add(1) >= other.start
    }

    /// 求交集；不相交时返回 `None`。
    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other)
            .then(|| IndexRange::new(self.start.max(other.start), self.end.min(other.end)))
    }

    /// 如果两个范围重叠或相邻，则合并成一个能覆盖两者的最小范围，否则返回 `None`。
    #[inline]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        self.intersects_or_adjacent(other).then(|| {
            let start = self.start.min(other.start);
            let end = self.end.max(other.end);
            IndexRange::new(start, end)
        })
    }
}

impl TryFrom<ops::RangeInclusive<usize>> for IndexRange {
    type Error = Error;

    fn try_from(rng: ops::RangeInclusive<usize>) -> Result<Self, Self::Error> {
        IndexRange::try_new(*rng.start(), *rng.end())
    }
}

impl From<(usize, usize)> for IndexRange {
    #[inline]
    fn from(rng: (usize, usize)) -> Self {
        IndexRange::new(rng.0, rng.1)
    }
}

impl From<IndexRange> for ops::RangeInclusive<usize> {
    #[inline]
    fn from(rng: IndexRange) -> Self {
        rng.start..=rng.end
    }
}

/// 反序列化时的未校验形式，`{"start": n, "end": m}`。
#[derive(Deserialize)]
struct RawRange {
    start: usize,
    end: usize,
}

impl TryFrom<RawRange> for IndexRange {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        IndexRange::try_new(raw.start, raw.end)
    }
}
