use alloc::{boxed::Box, vec::Vec};

use smallvec::SmallVec;

use crate::task::TaskId;

struct SleepEntry {
    owner: TaskId,
    duration_us: u64,
    /// 上一次观察到的时钟读数，第一次看到这个条目时才记录
    last_seen: Option<u32>,
    elapsed_us: u64,
    next: Option<usize>,
}

/// 按到达顺序排列的睡眠队列，链接用的是任务槽下标
pub struct SleepQueue {
    entries: Box<[Option<SleepEntry>]>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl SleepQueue {
    pub fn new(capacity: usize) -> Self {
        let entries: Vec<Option<SleepEntry>> = (0..capacity).map(|_| None).collect();
        Self {
            entries: entries.into_boxed_slice(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, owner: TaskId) -> bool {
        self.entries[owner.slot()]
            .as_ref()
            .is_some_and(|entry| entry.owner == owner)
    }

    /// 追加到队尾。同一个任务至多有一个条目
    pub fn push(&mut self, owner: TaskId, duration_us: u64) {
        let slot = owner.slot();
        assert!(
            self.entries[slot].is_none(),
            "task {owner} is already asleep"
        );
        self.entries[slot] = Some(SleepEntry {
            owner,
            duration_us,
            last_seen: None,
            elapsed_us: 0,
            next: None,
        });
        match self.tail {
            Some(tail) => self.link_mut(tail).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    /// 从任意位置摘除某个任务的条目。条目不存在时返回 `false`
    pub fn remove(&mut self, owner: TaskId) -> bool {
        if !self.contains(owner) {
            return false;
        }
        let mut prev = None;
        let mut curr = self.head;
        while let Some(slot) = curr {
            if slot == owner.slot() {
                self.unlink(prev, slot);
                return true;
            }
            prev = curr;
            curr = self.link(slot).next;
        }
        unreachable!("entry of {owner} is not linked")
    }

    /// 时钟中断到来时扫描一遍队列，返回应该被唤醒的任务，先到者在前。
    ///
    /// `is_live` 判为已经不存在的任务，其条目被悄悄摘掉
    pub fn expire(&mut self, now_us: u32, is_live: impl Fn(TaskId) -> bool) -> SmallVec<[TaskId; 4]> {
        let mut woken = SmallVec::new();
        let mut prev = None;
        let mut curr = self.head;
        while let Some(slot) = curr {
            let entry = self.link_mut(slot);
            let next = entry.next;
            if let Some(last) = entry.last_seen {
                entry.elapsed_us += u64::from(now_us.wrapping_sub(last));
            }
            entry.last_seen = Some(now_us);

            let owner = entry.owner;
            let due = entry.elapsed_us >= entry.duration_us;
            if !is_live(owner) {
                trace!("drop sleep entry of dead task {owner}");
                self.unlink(prev, slot);
            } else if due {
                self.unlink(prev, slot);
                woken.push(owner);
            } else {
                prev = curr;
            }
            curr = next;
        }
        woken
    }

    fn unlink(&mut self, prev: Option<usize>, slot: usize) {
        let next = self.entries[slot].take().and_then(|entry| entry.next);
        match prev {
            Some(prev) => self.link_mut(prev).next = next,
            None => self.head = next,
        }
        if self.tail == Some(slot) {
            self.tail = prev;
        }
        self.len -= 1;
    }

    fn link(&self, slot: usize) -> &SleepEntry {
        self.entries[slot]
            .as_ref()
            .expect("linked slot must hold an entry")
    }

    fn link_mut(&mut self, slot: usize) -> &mut SleepEntry {
        self.entries[slot]
            .as_mut()
            .expect("linked slot must hold an entry")
    }
}

#[cfg(test)]
mod tests {
    use super::SleepQueue;
    use crate::task::TaskTable;

    #[test]
    fn wakes_in_arrival_order_on_ties() {
        let table = TaskTable::with_capacity(4);
        let (a, b, c) = (
            table.admit().unwrap(),
            table.admit().unwrap(),
            table.admit().unwrap(),
        );
        let mut queue = SleepQueue::new(4);
        queue.push(c, 40);
        queue.push(a, 20);
        queue.push(b, 40);

        // 第一次观察只记录起点
        assert!(queue.expire(100, |_| true).is_empty());
        assert_eq!(queue.expire(120, |_| true).as_slice(), [a]);
        assert_eq!(queue.expire(140, |_| true).as_slice(), [c, b]);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_duration_wakes_on_first_tick() {
        let table = TaskTable::with_capacity(1);
        let a = table.admit().unwrap();
        let mut queue = SleepQueue::new(1);
        queue.push(a, 0);
        assert_eq!(queue.expire(7, |_| true).as_slice(), [a]);
    }

    #[test]
    fn elapsed_survives_counter_wraparound() {
        let table = TaskTable::with_capacity(1);
        let a = table.admit().unwrap();
        let mut queue = SleepQueue::new(1);
        queue.push(a, 30);
        assert!(queue.expire(u32::MAX - 9, |_| true).is_empty());
        assert!(queue.expire(9, |_| true).is_empty());
        assert_eq!(queue.expire(20, |_| true).as_slice(), [a]);
    }

    #[test]
    fn remove_from_middle_and_tail() {
        let table = TaskTable::with_capacity(3);
        let ids: Vec<_> = (0..3).map(|_| table.admit().unwrap()).collect();
        let mut queue = SleepQueue::new(3);
        for &id in &ids {
            queue.push(id, 10);
        }
        assert!(queue.remove(ids[1]));
        assert!(!queue.remove(ids[1]));
        assert!(queue.remove(ids[2]));
        assert_eq!(queue.len(), 1);

        // 尾指针要跟着回退，否则新条目会挂到被摘掉的节点后面
        queue.push(ids[2], 0);
        queue.expire(0, |_| true);
        assert_eq!(queue.expire(10, |_| true).as_slice(), [ids[0]]);
        assert!(queue.is_empty());
    }

    #[test]
    fn dead_tasks_are_unlinked_silently() {
        let table = TaskTable::with_capacity(2);
        let (a, b) = (table.admit().unwrap(), table.admit().unwrap());
        let mut queue = SleepQueue::new(2);
        queue.push(a, 0);
        queue.push(b, 0);
        assert_eq!(queue.expire(0, |id| id != a).as_slice(), [b]);
        assert!(queue.is_empty());
    }
}
