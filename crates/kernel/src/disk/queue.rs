use alloc::{boxed::Box, vec::Vec};

use super::request::DiskRequest;
use crate::task::TaskId;

struct DiskNode {
    owner: TaskId,
    request: DiskRequest,
    next: Option<usize>,
}

/// 一个磁盘单元的准入队列
///
/// 按 (track, sector) 非降序排列，相同位置按到达先后。另有一个轮转游标指向下一个要服务的节点：
/// 出队取游标处的节点，游标移到它的后继，走到末尾就回到队首。
/// 节点存放在以任务槽为下标的数组里，链接保存的是下标。
pub struct DiskQueue {
    nodes: Box<[Option<DiskNode>]>,
    head: Option<usize>,
    cursor: Option<usize>,
    len: usize,
}

impl DiskQueue {
    pub fn new(capacity: usize) -> Self {
        let nodes: Vec<Option<DiskNode>> = (0..capacity).map(|_| None).collect();
        Self {
            nodes: nodes.into_boxed_slice(),
            head: None,
            cursor: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, owner: TaskId, request: DiskRequest) {
        let slot = owner.slot();
        assert!(
            self.nodes[slot].is_none(),
            "task {owner} already has a disk request queued"
        );
        let key = request.position();
        let mut prev = None;
        let mut curr = self.head;
        while let Some(index) = curr {
            let node = self.node(index);
            if node.request.position() > key {
                break;
            }
            prev = curr;
            curr = node.next;
        }
        self.nodes[slot] = Some(DiskNode {
            owner,
            request,
            next: curr,
        });
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.len += 1;
    }

    /// 按轮转游标取出下一个请求
    pub fn dequeue(&mut self) -> Option<(TaskId, DiskRequest)> {
        let target = self.cursor.or(self.head)?;
        self.cursor = self.node(target).next.or(self.head);
        let node = self.unlink(target);
        Some((node.owner, node.request))
    }

    /// 摘除某个任务尚未被服务的请求
    pub fn remove(&mut self, owner: TaskId) -> Option<DiskRequest> {
        let node = self.nodes[owner.slot()].as_ref()?;
        if node.owner != owner {
            return None;
        }
        Some(self.unlink(owner.slot()).request)
    }

    /// 当前排队顺序中的各请求位置，从队首开始
    pub fn positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::with_capacity(self.len);
        let mut curr = self.head;
        while let Some(index) = curr {
            let node = self.node(index);
            positions.push(node.request.position());
            curr = node.next;
        }
        positions
    }

    fn unlink(&mut self, slot: usize) -> DiskNode {
        let mut prev = None;
        let mut curr = self.head;
        while let Some(index) = curr {
            if index == slot {
                break;
            }
            prev = curr;
            curr = self.node(index).next;
        }
        assert_eq!(curr, Some(slot), "disk node {slot} is not linked");

        let node = self.nodes[slot]
            .take()
            .expect("linked slot must hold a node");
        match prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        if self.cursor == Some(slot) {
            self.cursor = self.head;
        }
        self.len -= 1;
        node
    }

    fn node(&self, slot: usize) -> &DiskNode {
        self.nodes[slot]
            .as_ref()
            .expect("linked slot must hold a node")
    }

    fn node_mut(&mut self, slot: usize) -> &mut DiskNode {
        self.nodes[slot]
            .as_mut()
            .expect("linked slot must hold a node")
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::DiskQueue;
    use crate::{
        disk::request::{DiskOp, DiskRequest},
        task::{TaskId, TaskTable},
    };

    fn request(track: usize, first: usize) -> DiskRequest {
        DiskRequest {
            op: DiskOp::Read,
            track,
            first,
            sectors: 1,
            data: Vec::new(),
        }
    }

    fn ids(n: usize) -> (TaskTable, Vec<TaskId>) {
        let table = TaskTable::with_capacity(n);
        let ids = (0..n).map(|_| table.admit().unwrap()).collect();
        (table, ids)
    }

    fn drain(queue: &mut DiskQueue) -> Vec<(usize, usize)> {
        core::iter::from_fn(|| queue.dequeue())
            .map(|(_, request)| request.position())
            .collect()
    }

    #[test]
    fn sorted_by_track_then_sector() {
        let (_table, ids) = ids(3);
        let mut queue = DiskQueue::new(3);
        queue.insert(ids[0], request(3, 0));
        queue.insert(ids[1], request(1, 2));
        queue.insert(ids[2], request(1, 0));
        assert_eq!(queue.positions(), [(1, 0), (1, 2), (3, 0)]);
        assert_eq!(drain(&mut queue), [(1, 0), (1, 2), (3, 0)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn ties_keep_arrival_order() {
        let (_table, ids) = ids(3);
        let mut queue = DiskQueue::new(3);
        for &id in &ids {
            queue.insert(id, request(2, 1));
        }
        let owners: Vec<_> = core::iter::from_fn(|| queue.dequeue())
            .map(|(owner, _)| owner)
            .collect();
        assert_eq!(owners, ids);
    }

    #[test]
    fn cursor_keeps_rotating_past_new_arrivals() {
        let (_table, ids) = ids(4);
        let mut queue = DiskQueue::new(4);
        queue.insert(ids[0], request(2, 0));
        queue.insert(ids[1], request(4, 0));
        assert_eq!(queue.dequeue().map(|(_, r)| r.position()), Some((2, 0)));

        // 游标停在 (4, 0)，排在它前面的新请求要等游标转回队首
        queue.insert(ids[2], request(0, 0));
        queue.insert(ids[3], request(3, 0));
        assert_eq!(queue.positions(), [(0, 0), (3, 0), (4, 0)]);
        assert_eq!(drain(&mut queue), [(4, 0), (0, 0), (3, 0)]);
    }

    #[test]
    fn removing_the_cursor_node_retargets_head() {
        let (_table, ids) = ids(3);
        let mut queue = DiskQueue::new(3);
        queue.insert(ids[0], request(1, 0));
        queue.insert(ids[1], request(2, 0));
        queue.insert(ids[2], request(3, 0));
        queue.dequeue();
        // 游标此时指向 (2, 0)
        assert!(queue.remove(ids[1]).is_some());
        assert!(queue.remove(ids[1]).is_none());
        assert_eq!(drain(&mut queue), [(3, 0)]);
    }

    #[test]
    fn remove_ignores_other_generation() {
        let table = TaskTable::with_capacity(1);
        let old = table.admit().unwrap();
        table.release(old);
        let new = table.admit().unwrap();
        let mut queue = DiskQueue::new(1);
        queue.insert(new, request(0, 0));
        assert!(queue.remove(old).is_none());
        assert_eq!(queue.len(), 1);
    }
}
