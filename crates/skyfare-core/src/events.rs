// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

/// Fan-out of state notifications to any number of channel receivers.
/// Receivers that have been dropped are pruned on the next publish.
pub struct Subscribers<T> {
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Subscribers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking subscriber elsewhere must not silence the list.
    fn senders(&self) -> MutexGuard<'_, Vec<Sender<T>>> {
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.senders().push(tx);
        rx
    }

    pub fn publish(&self, event: &T) {
        self.senders().retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
