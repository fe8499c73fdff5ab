use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq};

use crate::{Error, IndexRange};

/// 有序、互不重叠且互不相邻的闭区间集合。
///
/// 键为区间起点，值为区间终点。任意相邻两项满足 `prev.end + 1 < next.start`。
#[derive(Default, Clone, PartialEq, Eq)]
pub struct RangeSelection(BTreeMap<usize, usize>);

impl fmt::Debug for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set_builder = f.debug_set();
        for (&start, &end) in &self.0 {
            set_builder.entry(&(start..=end));
        }
        set_builder.finish()
    }
}

impl RangeSelection {
    pub fn new() -> Self {
        Default::default()
    }

    /// 被选中的下标总数。
    pub fn len(&self) -> usize {
        self.0.iter().map(|(start, end)| end - start + 1).sum()
    }

    pub fn range_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.0.first_key_value().map(|(&start, _)| start)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last_key_value().map(|(_, &end)| end)
    }

    pub fn contains_index(&self, index: usize) -> bool {
        if let Some((_, end)) = self.0.range(..=index).next_back() {
            return index <= *end;
        }
        false
    }

    /// 检查一个完整的区间是否被集合完全覆盖。
    pub fn contains_range(&self, range: &IndexRange) -> bool {
        if let Some((_, end)) = self.0.range(..=range.start()).next_back() {
            return range.end() <= *end;
        }
        false
    }

    /// 升序遍历当前区间，不复制。
    pub fn ranges(&self) -> impl DoubleEndedIterator<Item = IndexRange> + ExactSizeIterator + '_ {
        self.0.iter().map(|(&start, &end)| IndexRange::new(start, end))
    }

    /// 当前区间的快照，后续修改不会反映到返回值中。
    pub fn to_vec(&self) -> Vec<IndexRange> {
        self.ranges().collect()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// 与 `rng` 重叠或相邻的所有已有区间，按起点升序。
    fn touching(&self, rng: &IndexRange) -> Vec<IndexRange> {
        // 起点在 rng.start 之前的区间最多只有一个可能与之接触
        let lower = self
            .0
            .range(..rng.start())
            .next_back()
            .map(|(&start, &end)| IndexRange::new(start, end))
            .filter(|prev| prev.intersects_or_adjacent(rng))
            .map_or(rng.start(), |prev| prev.start());
        self.0
            .range(lower..)
            .map(|(&start, &end)| IndexRange::new(start, end))
            .take_while(|next| next.intersects_or_adjacent(rng))
            .collect()
    }

    /// 合并插入。若 `rng` 已被完全覆盖则不做修改并返回 false。
    fn insert_range(&mut self, rng: &IndexRange) -> bool {
        let touching = self.touching(rng);
        if let [only] = touching.as_slice()
            && only.contains(rng)
        {
            return false;
        }
        let mut merged = *rng;
        for existing in touching {
            self.0.remove(&existing.start());
            // touching 中的每一项都与 rng 重叠或相邻
            merged = IndexRange::new(
                merged.start().min(existing.start()),
                merged.end().max(existing.end()),
            );
        }
        self.0.insert(merged.start(), merged.end());
        true
    }

    /// 把 `[start, end]` 加入集合，与重叠或相邻的区间合并。
    ///
    /// 返回此前未被覆盖、本次新加入的子区间（升序）。
    pub fn add_range(&mut self, start: usize, end: usize) -> Result<Vec<IndexRange>, Error> {
        let rng = IndexRange::try_new(start, end)?;
        let touching = self.touching(&rng);

        // 在 rng 内部找出未被 touching 覆盖的空隙
        let mut added = Vec::new();
        let mut next_uncovered = Some(rng.start());
        for existing in &touching {
            let Some(cursor) = next_uncovered else { break };
            if existing.start() > cursor && cursor <= rng.end() {
                added.push(IndexRange::new(cursor, (existing.start() - 1).min(rng.end())));
            }
            if existing.end() >= cursor {
                next_uncovered = existing.end().checked_add(1);
            }
        }
        if let Some(cursor) = next_uncovered
            && cursor <= rng.end()
        {
            added.push(IndexRange::new(cursor, rng.end()));
        }

        if !added.is_empty() {
            self.insert_range(&rng);
        }
        Ok(added)
    }

    /// 从集合中移除 `[start, end]`，跨越边界的区间会被拆成至多两段。
    ///
    /// 返回真正被移除的子区间（请求区间与原有覆盖的交集，升序）。
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<Vec<IndexRange>, Error> {
        let rng = IndexRange::try_new(start, end)?;
        Ok(self.remove_covered(&rng))
    }

    fn remove_covered(&mut self, rng: &IndexRange) -> Vec<IndexRange> {
        let lower = self
            .0
            .range(..rng.start())
            .next_back()
            .filter(|&(_, &prev_end)| prev_end >= rng.start())
            .map_or(rng.start(), |(&prev_start, _)| prev_start);
        let overlapping: Vec<IndexRange> = self
            .0
            .range(lower..=rng.end())
            .map(|(&s, &e)| IndexRange::new(s, e))
            .collect();

        let mut removed = Vec::with_capacity(overlapping.len());
        for existing in overlapping {
            self.0.remove(&existing.start());
            if let Some(cut) = existing.intersection(rng) {
                removed.push(cut);
            }
            if existing.start() < rng.start() {
                self.0.insert(existing.start(), rng.start() - 1);
            }
            if existing.end() > rng.end() {
                self.0.insert(rng.end() + 1, existing.end());
            }
        }
        removed
    }

    /// 底层序列在 `index` 处插入了一项。
    ///
    /// 起点 `>= index` 的区间整体右移一位；内部跨越 `index` 的区间
    /// （`start < index <= end`）终点加一。被挤出 `usize::MAX` 的下标直接丢弃。
    pub fn insert_index(&mut self, index: usize) {
        if let Some((_, end)) = self.0.range_mut(..index).next_back()
            && *end >= index
            && let Some(next) = end.checked_add(1)
        {
            *end = next;
        }
        let tail = self.0.split_off(&index);
        for (start, end) in tail {
            let Some(start) = start.checked_add(1) else {
                continue;
            };
            let end = end.checked_add(1).unwrap_or(usize::MAX);
            self.insert_range(&IndexRange::new(start, end));
        }
    }

    /// 底层序列从 `index` 开始移除了 `count` 项。
    ///
    /// 落在被删窗口内的部分被丢弃，窗口之后的区间左移 `count` 位，
    /// 因左移而变得相邻的区间会被合并。
    pub fn remove_indexes(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let last = index.saturating_add(count - 1);
        self.remove_covered(&IndexRange::new(index, last));
        let tail = self.0.split_off(&index);
        for (start, end) in tail {
            self.insert_range(&IndexRange::new(start - count, end - count));
        }
    }
}

impl<T: Into<IndexRange>> FromIterator<T> for RangeSelection {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = RangeSelection::new();
        for item in iter {
            set.insert_range(&item.into());
        }
        set
    }
}

impl Serialize for RangeSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for rng in self.ranges() {
            seq.serialize_element(&rng)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RangeSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rngs = Vec::<IndexRange>::deserialize(deserializer)?;
        Ok(rngs.into_iter().collect())
    }
}
