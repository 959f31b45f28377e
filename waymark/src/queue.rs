//! Strict-FIFO serialization of capture/restore operations.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Cooperative single-flight queue: operations run strictly in submission
/// order, each to completion (including its awaits) before the next starts.
/// A later-submitted, faster operation never completes before an
/// earlier-submitted, slower one.
///
/// Each operation takes a ticket; a turn future parks it until the serving
/// counter reaches its ticket; a drop guard advances the counter afterwards.
/// The guard also runs when the operation future is dropped mid-flight, so an
/// abandoned operation can never wedge the queue.
#[derive(Debug, Default)]
pub(crate) struct OperationQueue {
    inner: Rc<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    next_ticket: Cell<u64>,
    serving: Cell<u64>,
    wakers: RefCell<HashMap<u64, Waker>>,
    abandoned: RefCell<HashSet<u64>>,
}

impl QueueInner {
    // Move past `from`, skipping tickets whose operations were dropped while
    // still queued, and wake whoever is next.
    fn advance_past(&self, from: u64) {
        let mut next = from + 1;
        while self.abandoned.borrow_mut().remove(&next) {
            next += 1;
        }
        self.serving.set(next);
        if let Some(waker) = self.wakers.borrow_mut().remove(&next) {
            waker.wake();
        }
    }
}

impl OperationQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `op` once every previously submitted operation has fully
    /// completed.
    pub(crate) async fn run<T, F>(&self, label: &str, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let ticket = self.inner.next_ticket.get();
        self.inner.next_ticket.set(ticket + 1);

        let turn = Turn {
            queue: Rc::clone(&self.inner),
            ticket,
            reached: false,
        };
        turn.await;

        let _guard = Advance {
            queue: Rc::clone(&self.inner),
            ticket,
        };
        tracing::trace!(label, ticket, "operation running");
        op.await
    }
}

struct Turn {
    queue: Rc<QueueInner>,
    ticket: u64,
    reached: bool,
}

impl Future for Turn {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.queue.serving.get() == this.ticket {
            this.reached = true;
            Poll::Ready(())
        } else {
            this.queue
                .wakers
                .borrow_mut()
                .insert(this.ticket, cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if self.reached {
            return;
        }
        // Dropped while still waiting in line. If it is already our turn,
        // pass it on; otherwise leave a tombstone so the turn skips us.
        self.queue.wakers.borrow_mut().remove(&self.ticket);
        if self.queue.serving.get() == self.ticket {
            self.queue.advance_past(self.ticket);
        } else {
            self.queue.abandoned.borrow_mut().insert(self.ticket);
        }
    }
}

struct Advance {
    queue: Rc<QueueInner>,
    ticket: u64,
}

impl Drop for Advance {
    fn drop(&mut self) {
        self.queue.advance_past(self.ticket);
    }
}
