#![cfg_attr(not(test), no_std)]

use alloc::vec::Vec;

extern crate alloc;

/// 基于回收的分配器，即用 vector 收集释放的 id
///
/// 分配出的 id 总在 `[0, limit)` 之内，用完时 `alloc` 返回 `None`
#[derive(Clone)]
pub struct RecycleAllocator {
    current: usize,
    limit: usize,
    recycled: Vec<usize>,
}

impl RecycleAllocator {
    pub const fn new(limit: usize) -> Self {
        RecycleAllocator {
            current: 0,
            limit,
            recycled: Vec::new(),
        }
    }

    pub fn alloc(&mut self) -> Option<usize> {
        if let Some(id) = self.recycled.pop() {
            return Some(id);
        }
        if self.current == self.limit {
            return None;
        }
        self.current += 1;
        Some(self.current - 1)
    }

    pub fn dealloc(&mut self, id: usize) {
        debug_assert!(id < self.current);
        debug_assert!(!self.recycled.iter().any(|i| *i == id), "id {id} has been deallocated!",);
        self.recycled.push(id);
    }

    /// 正在使用中的 id 数量
    pub fn in_use(&self) -> usize {
        self.current - self.recycled.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::RecycleAllocator;

    #[test]
    fn alloc_until_exhausted() {
        let mut ids = RecycleAllocator::new(3);
        assert_eq!(ids.alloc(), Some(0));
        assert_eq!(ids.alloc(), Some(1));
        assert_eq!(ids.alloc(), Some(2));
        assert_eq!(ids.alloc(), None);
        assert_eq!(ids.in_use(), 3);
    }

    #[test]
    fn recycled_ids_come_back_first() {
        let mut ids = RecycleAllocator::new(4);
        let a = ids.alloc().unwrap();
        let b = ids.alloc().unwrap();
        ids.dealloc(a);
        assert_eq!(ids.in_use(), 1);
        assert_eq!(ids.alloc(), Some(a));
        assert_eq!(ids.alloc(), Some(2));
        ids.dealloc(b);
        assert_eq!(ids.alloc(), Some(b));
    }
}
