//=========================================================================
// Index Lists
//=========================================================================
//
// Three doubly-linked lists threaded through one link record per slot.
//
//   links[i] = { list, prev, next }        heads[Free | Normal | Gui]
//
// A slot moves between lists in O(1) by index; no list allocates after
// construction. Outside of a pool operation in progress, every slot is
// on exactly one list.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::registry::Channel;

//=== ListId ==============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListId {
    Free,
    Normal,
    Gui,
}

impl ListId {
    const fn slot(self) -> usize {
        match self {
            Self::Free => 0,
            Self::Normal => 1,
            Self::Gui => 2,
        }
    }
}

impl From<Channel> for ListId {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Normal => Self::Normal,
            Channel::Gui => Self::Gui,
        }
    }
}

//=== Link / ListHead =====================================================

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    list: Option<ListId>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ListHead {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

//=== IndexLists ==========================================================

pub(crate) struct IndexLists {
    links: Vec<Link>,
    heads: [ListHead; 3],
}

impl IndexLists {
    /// Creates `capacity` links, all on the free list in index order.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut lists = Self {
            links: vec![Link::default(); capacity],
            heads: [ListHead::default(); 3],
        };
        lists.reset();
        lists
    }

    /// Puts every slot back on the free list in index order.
    pub(crate) fn reset(&mut self) {
        self.heads = [ListHead::default(); 3];
        for link in &mut self.links {
            *link = Link::default();
        }
        for index in 0..self.links.len() {
            self.push_back(ListId::Free, index);
        }
    }

    //--- Queries ----------------------------------------------------------

    pub(crate) fn len(&self, list: ListId) -> usize {
        self.heads[list.slot()].len
    }

    pub(crate) fn head(&self, list: ListId) -> Option<usize> {
        self.heads[list.slot()].head
    }

    pub(crate) fn next(&self, index: usize) -> Option<usize> {
        self.links[index].next
    }

    #[cfg(test)]
    pub(crate) fn list_of(&self, index: usize) -> Option<ListId> {
        self.links[index].list
    }

    pub(crate) fn iter(&self, list: ListId) -> ListIter<'_> {
        ListIter {
            lists: self,
            cursor: self.head(list),
        }
    }

    //--- Mutation ---------------------------------------------------------

    /// Detaches `index` from whatever list holds it. No-op if detached.
    pub(crate) fn unlink(&mut self, index: usize) {
        let Link { list, prev, next } = self.links[index];
        let Some(list) = list else {
            return;
        };

        let head = &mut self.heads[list.slot()];
        match prev {
            Some(p) => self.links[p].next = next,
            None => head.head = next,
        }
        match next {
            Some(n) => self.links[n].prev = prev,
            None => head.tail = prev,
        }
        head.len -= 1;

        self.links[index] = Link::default();
    }

    pub(crate) fn push_back(&mut self, list: ListId, index: usize) {
        self.unlink(index);

        let head = &mut self.heads[list.slot()];
        let old_tail = head.tail;
        head.tail = Some(index);
        if head.head.is_none() {
            head.head = Some(index);
        }
        head.len += 1;

        if let Some(t) = old_tail {
            self.links[t].next = Some(index);
        }
        self.links[index] = Link {
            list: Some(list),
            prev: old_tail,
            next: None,
        };
    }

    /// Inserts `index` immediately before `before`, which must be on `list`.
    pub(crate) fn insert_before(&mut self, list: ListId, before: usize, index: usize) {
        debug_assert_eq!(self.links[before].list, Some(list));
        self.unlink(index);

        let prev = self.links[before].prev;
        match prev {
            Some(p) => self.links[p].next = Some(index),
            None => self.heads[list.slot()].head = Some(index),
        }
        self.links[before].prev = Some(index);
        self.heads[list.slot()].len += 1;

        self.links[index] = Link {
            list: Some(list),
            prev,
            next: Some(before),
        };
    }

    pub(crate) fn pop_front(&mut self, list: ListId) -> Option<usize> {
        let index = self.head(list)?;
        self.unlink(index);
        Some(index)
    }
}

//=== ListIter ============================================================

pub(crate) struct ListIter<'a> {
    lists: &'a IndexLists,
    cursor: Option<usize>,
}

impl Iterator for ListIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.cursor?;
        self.cursor = self.lists.next(current);
        Some(current)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(lists: &IndexLists, list: ListId) -> Vec<usize> {
        lists.iter(list).collect()
    }

    #[test]
    fn new_lists_start_all_free_in_order() {
        let lists = IndexLists::new(4);
        assert_eq!(collect(&lists, ListId::Free), vec![0, 1, 2, 3]);
        assert_eq!(lists.len(ListId::Normal), 0);
        assert_eq!(lists.len(ListId::Gui), 0);
    }

    #[test]
    fn move_between_lists_keeps_totals() {
        let mut lists = IndexLists::new(4);
        lists.push_back(ListId::Normal, 2);
        lists.push_back(ListId::Gui, 0);

        assert_eq!(collect(&lists, ListId::Free), vec![1, 3]);
        assert_eq!(collect(&lists, ListId::Normal), vec![2]);
        assert_eq!(collect(&lists, ListId::Gui), vec![0]);
        assert_eq!(
            lists.len(ListId::Free) + lists.len(ListId::Normal) + lists.len(ListId::Gui),
            4
        );
        assert_eq!(lists.list_of(2), Some(ListId::Normal));
    }

    #[test]
    fn insert_before_head_and_middle() {
        let mut lists = IndexLists::new(4);
        lists.push_back(ListId::Normal, 0);
        lists.push_back(ListId::Normal, 1);

        lists.insert_before(ListId::Normal, 0, 2);
        assert_eq!(collect(&lists, ListId::Normal), vec![2, 0, 1]);

        lists.insert_before(ListId::Normal, 1, 3);
        assert_eq!(collect(&lists, ListId::Normal), vec![2, 0, 3, 1]);
        assert_eq!(lists.len(ListId::Normal), 4);
        assert_eq!(lists.len(ListId::Free), 0);
    }

    #[test]
    fn unlink_tail_and_pop_front() {
        let mut lists = IndexLists::new(3);
        lists.push_back(ListId::Gui, 0);
        lists.push_back(ListId::Gui, 1);
        lists.push_back(ListId::Gui, 2);

        lists.unlink(2);
        assert_eq!(collect(&lists, ListId::Gui), vec![0, 1]);
        assert_eq!(lists.list_of(2), None);

        assert_eq!(lists.pop_front(ListId::Gui), Some(0));
        assert_eq!(collect(&lists, ListId::Gui), vec![1]);

        // Re-push after a tail unlink must append correctly
        lists.push_back(ListId::Gui, 2);
        assert_eq!(collect(&lists, ListId::Gui), vec![1, 2]);
    }

    #[test]
    fn reset_returns_everything_to_free() {
        let mut lists = IndexLists::new(3);
        lists.push_back(ListId::Normal, 1);
        lists.push_back(ListId::Gui, 0);

        lists.reset();
        assert_eq!(collect(&lists, ListId::Free), vec![0, 1, 2]);
        assert_eq!(lists.len(ListId::Normal), 0);
    }
}
