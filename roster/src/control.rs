//! Synchronized control commands
//!
//! Decisions that every session member must apply at the same logical point
//! (such as removing a client) are not executed where they are made. They
//! are dispatched as control commands and applied later, in order, by every
//! member including the one that issued them.

use crate::ClientId;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Command applied identically by all session members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    ClientRemove { client_id: ClientId, reason: String },
}

/// How a control command is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Applied by every member at the same command position
    Sync,
}

/// Sink for control commands
pub trait ControlDispatch {
    fn dispatch(&mut self, command: ControlCommand, mode: DeliveryMode);
}

impl<T: ControlDispatch + ?Sized> ControlDispatch for Rc<RefCell<T>> {
    fn dispatch(&mut self, command: ControlCommand, mode: DeliveryMode) {
        self.borrow_mut().dispatch(command, mode);
    }
}

/// FIFO of dispatched commands waiting to be applied
#[derive(Debug, Default)]
pub struct ControlQueue {
    pending: VecDeque<(ControlCommand, DeliveryMode)>,
}

impl ControlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every pending command in dispatch order
    pub fn drain(&mut self) -> Vec<(ControlCommand, DeliveryMode)> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl ControlDispatch for ControlQueue {
    fn dispatch(&mut self, command: ControlCommand, mode: DeliveryMode) {
        debug!("Queued control {:?} ({:?})", command, mode);
        self.pending.push_back((command, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order() {
        let mut queue = ControlQueue::new();
        for id in [4, 2, 9] {
            queue.dispatch(
                ControlCommand::ClientRemove {
                    client_id: id,
                    reason: "kick".to_string(),
                },
                DeliveryMode::Sync,
            );
        }
        assert_eq!(queue.len(), 3);

        let ids: Vec<ClientId> = queue
            .drain()
            .into_iter()
            .map(|(ControlCommand::ClientRemove { client_id, .. }, _)| client_id)
            .collect();
        assert_eq!(ids, vec![4, 2, 9]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shared_queue_dispatch() {
        let queue = Rc::new(RefCell::new(ControlQueue::new()));
        let mut handle = Rc::clone(&queue);
        handle.dispatch(
            ControlCommand::ClientRemove {
                client_id: 1,
                reason: String::new(),
            },
            DeliveryMode::Sync,
        );
        assert_eq!(queue.borrow().len(), 1);
    }
}
