//! Ordered, id-keyed collections kept in step with server pushes.
//!
//! Every list a view renders goes through [`SyncedList`]: insertion is
//! idempotent by record id, removal leaves a tombstone so a late push cannot
//! resurrect a deleted record, and an optional cap evicts from the front.

use std::collections::HashSet;
use std::hash::Hash;

use agora_shared::{ChatMessage, DirectMessage, DmId, MessageId, Post, PostId};

/// A record with a stable server-assigned identity.
pub trait Keyed {
    type Key: Eq + Hash + Copy;

    fn key(&self) -> Self::Key;
}

impl Keyed for ChatMessage {
    type Key = MessageId;

    fn key(&self) -> MessageId {
        self.id
    }
}

impl Keyed for DirectMessage {
    type Key = DmId;

    fn key(&self) -> DmId {
        self.id
    }
}

impl Keyed for Post {
    type Key = PostId;

    fn key(&self) -> PostId {
        self.id
    }
}

/// Bounded ordered list with id-keyed upserts and tombstoned removals.
#[derive(Debug)]
pub struct SyncedList<T: Keyed> {
    items: Vec<T>,
    cap: Option<usize>,
    tombstones: HashSet<T::Key>,
}

impl<T: Keyed> SyncedList<T> {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            cap,
            tombstones: HashSet::new(),
        }
    }

    /// Replace the whole list with a fresh server snapshot.
    ///
    /// The snapshot is authoritative, so tombstones from before it are
    /// forgotten. The cap still applies, keeping the newest tail.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.tombstones.clear();
        self.enforce_cap();
    }

    /// Append a record, newest last. Returns false when the record is a
    /// duplicate or was previously removed.
    pub fn push_back(&mut self, item: T) -> bool {
        if !self.admit(&item) {
            return false;
        }
        self.items.push(item);
        self.enforce_cap();
        true
    }

    /// Insert a record at the front, newest first. Same idempotency rules
    /// as [`push_back`](Self::push_back).
    pub fn prepend_unique(&mut self, item: T) -> bool {
        if !self.admit(&item) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Replace an existing record in place, keeping its position. Does
    /// nothing when the id is not present.
    pub fn replace_existing(&mut self, item: T) -> bool {
        let key = item.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Remove a record and remember its id so later pushes cannot bring
    /// it back.
    pub fn remove(&mut self, key: T::Key) -> bool {
        self.tombstones.insert(key);
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        self.items.len() != before
    }

    /// Apply a mutation to every record, e.g. a moderation patch on
    /// embedded author fragments.
    pub fn patch_all(&mut self, mut patch: impl FnMut(&mut T)) {
        for item in &mut self.items {
            patch(item);
        }
    }

    /// Drop records from the back until at most `len` remain.
    pub fn truncate_back(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn contains(&self, key: T::Key) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn admit(&self, item: &T) -> bool {
        let key = item.key();
        !self.tombstones.contains(&key) && !self.contains(key)
    }

    fn enforce_cap(&mut self) {
        if let Some(cap) = self.cap {
            if self.items.len() > cap {
                let excess = self.items.len() - cap;
                self.items.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::AuthorFragment;

    fn msg(id: i64) -> ChatMessage {
        ChatMessage {
            id: MessageId(id),
            user: AuthorFragment {
                user_id: agora_shared::UserId(1),
                username: "alice".into(),
                is_muted: false,
                is_banned: false,
            },
            text: format!("message {id}"),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_cap_keeps_newest_tail() {
        let mut list = SyncedList::new(Some(30));
        for id in 1..=35 {
            assert!(list.push_back(msg(id)));
        }
        assert_eq!(list.len(), 30);
        assert_eq!(list.items()[0].id, MessageId(6));
        assert_eq!(list.items()[29].id, MessageId(35));
    }

    #[test]
    fn test_push_back_is_idempotent() {
        let mut list = SyncedList::new(None);
        assert!(list.push_back(msg(1)));
        assert!(!list.push_back(msg(1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_tombstone_blocks_resurrection() {
        let mut list = SyncedList::new(None);
        list.push_back(msg(1));
        list.push_back(msg(2));
        assert!(list.remove(MessageId(1)));
        assert!(!list.push_back(msg(1)));
        assert!(!list.prepend_unique(msg(1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_before_arrival_still_tombstones() {
        let mut list: SyncedList<ChatMessage> = SyncedList::new(None);
        assert!(!list.remove(MessageId(9)));
        assert!(!list.push_back(msg(9)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_replace_all_clears_tombstones() {
        let mut list = SyncedList::new(None);
        list.push_back(msg(1));
        list.remove(MessageId(1));
        list.replace_all(vec![msg(1), msg(2)]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_replace_existing_keeps_position() {
        let mut list = SyncedList::new(None);
        list.push_back(msg(1));
        list.push_back(msg(2));
        list.push_back(msg(3));

        let mut edited = msg(2);
        edited.text = "edited".into();
        assert!(list.replace_existing(edited));
        assert_eq!(list.items()[1].text, "edited");

        assert!(!list.replace_existing(msg(99)));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_prepend_unique_orders_newest_first() {
        let mut list = SyncedList::new(None);
        list.prepend_unique(msg(1));
        list.prepend_unique(msg(2));
        assert_eq!(list.items()[0].id, MessageId(2));
    }

    #[test]
    fn test_patch_all_touches_every_record() {
        let mut list = SyncedList::new(None);
        list.push_back(msg(1));
        list.push_back(msg(2));
        list.patch_all(|m| m.user.is_muted = true);
        assert!(list.items().iter().all(|m| m.user.is_muted));
    }
}
