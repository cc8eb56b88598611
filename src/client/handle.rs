use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::task::{self, Task};


static CONNECTION_ID: AtomicUsize = AtomicUsize::new(0);

/// State shared between a connection and its `ConnectionRef`s
///
/// The connection holds the only strong reference, so a `ConnectionRef`
/// is alive exactly as long as the connection itself.
pub struct Control {
    id: usize,
    active: Cell<bool>,
    cancelled: Cell<bool>,
    task: RefCell<Option<Task>>,
}

/// A non-owning handle to a connection
///
/// It's passed to request writers and response handlers, and is stored
/// in the connection pool slots where `is_alive()` serves as a liveness
/// check.
#[derive(Clone)]
pub struct ConnectionRef {
    control: Weak<Control>,
    id: usize,
}

impl Control {
    pub fn new() -> Rc<Control> {
        Rc::new(Control {
            id: CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            active: Cell::new(false),
            cancelled: Cell::new(false),
            task: RefCell::new(None),
        })
    }
    pub fn id(&self) -> usize {
        self.id
    }
    pub fn reference(this: &Rc<Control>) -> ConnectionRef {
        ConnectionRef {
            control: Rc::downgrade(this),
            id: this.id,
        }
    }
    /// Marks start of a job, from now on `cancel()` takes effect
    pub fn activate(&self) {
        self.cancelled.set(false);
        self.active.set(true);
    }
    /// Marks end of a job, returns true if it has been cancelled
    pub fn deactivate(&self) -> bool {
        self.active.set(false);
        self.task.borrow_mut().take();
        self.cancelled.replace(false)
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
    /// Remembers current task to wake it up on cancellation
    pub fn park(&self) {
        *self.task.borrow_mut() = Some(task::current());
    }
}

impl ConnectionRef {
    /// Unique (within the process) identifier of the connection
    pub fn id(&self) -> usize {
        self.id
    }
    /// Returns false once the connection has been destroyed
    pub fn is_alive(&self) -> bool {
        self.control.upgrade().is_some()
    }
    /// Aborts the operation in progress
    ///
    /// The response handler of the current job receives
    /// `Error::Cancelled` when the connection is polled next time. Does
    /// nothing if there is no job running on the connection (including
    /// the time when the response handler itself is running).
    pub fn cancel(&self) {
        if let Some(control) = self.control.upgrade() {
            if control.active.get() {
                debug!("cancelling request on connection {}", self.id);
                control.cancelled.set(true);
                let task = control.task.borrow_mut().take();
                if let Some(task) = task {
                    task.notify();
                }
            }
        }
    }
}
