use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tokio_core::reactor::Handle;

use client::{Config, Connection, ConnectionRef, Error, Job, Response};
use client::{Encoder, Transport};


struct PoolState {
    slots: Vec<Option<ConnectionRef>>,
    queue: VecDeque<Job>,
}

/// A bounded set of connections to a single host
///
/// Jobs are started in submission order. Each slot holds at most one
/// connection, and a slot is free when it was never used or its
/// connection has been destroyed. A connection that finishes a job takes
/// the next one from the queue, so the queue only holds jobs submitted
/// while every slot was busy.
///
/// Dropping all clones of the pool drops the queued jobs (their handlers
/// are never called), connections finish the jobs they run.
#[derive(Clone)]
pub struct Pool<T: Transport + Clone> {
    transport: T,
    host: String,
    port: u16,
    config: Arc<Config>,
    handle: Handle,
    state: Rc<RefCell<PoolState>>,
}

fn next_job(state: &Weak<RefCell<PoolState>>) -> Option<Job> {
    state.upgrade().and_then(|state| state.borrow_mut().queue.pop_front())
}

impl<T: Transport + Clone> Pool<T> {
    /// Create a pool with `config.connection_limit` slots
    ///
    /// No connection is established until the first job is submitted.
    pub fn new(transport: T, host: &str, port: u16,
        config: &Arc<Config>, handle: &Handle)
        -> Pool<T>
    {
        Pool {
            transport: transport,
            host: host.to_string(),
            port: port,
            config: config.clone(),
            handle: handle.clone(),
            state: Rc::new(RefCell::new(PoolState {
                slots: vec![None; config.connection_limit],
                queue: VecDeque::new(),
            })),
        }
    }
    /// Submit a request
    ///
    /// See `Job::new` for the meaning of the arguments.
    pub fn submit<W, H>(&self, writer: W, handler: H)
        where W: FnOnce(&ConnectionRef, &mut Encoder, &str, u16) + 'static,
              H: FnOnce(&ConnectionRef, Option<Error>, Response) + 'static,
    {
        self.submit_job(Job::new(writer, handler))
    }
    /// Submit a prepared job
    ///
    /// Starts it right away if there is a free slot, otherwise the job waits
    /// for some connection to finish its current one. May be called from
    /// within a response handler.
    pub fn submit_job(&self, job: Job) {
        let (index, job) = {
            let mut state = self.state.borrow_mut();
            state.queue.push_back(job);
            let free = state.slots.iter().position(|slot| {
                slot.as_ref().map(|c| !c.is_alive()).unwrap_or(true)
            });
            match free {
                Some(index) => {
                    let job = state.queue.pop_front()
                        .expect("queue is not empty");
                    (index, job)
                }
                None => {
                    debug!("all {} connections to {}:{} are busy, \
                        {} jobs queued",
                        state.slots.len(), self.host, self.port,
                        state.queue.len());
                    return;
                }
            }
        };
        let mut conn = Connection::new(self.transport.clone(),
            &self.host, self.port, &self.config);
        let weak = Rc::downgrade(&self.state);
        conn.feed_from(move || next_job(&weak));
        let cref = conn.start(job, &self.handle);
        debug!("started connection {} to {}:{} in slot {}",
            cref.id(), self.host, self.port, index);
        self.state.borrow_mut().slots[index] = Some(cref);
    }
    /// Number of jobs waiting for a connection
    pub fn queued(&self) -> usize {
        self.state.borrow().queue.len()
    }
    /// Number of connections that are currently alive
    pub fn live(&self) -> usize {
        self.state.borrow().slots.iter()
            .filter(|slot| slot.as_ref().map(|c| c.is_alive()).unwrap_or(false))
            .count()
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use tokio_core::reactor::Core;

    use mock::MockTransport;
    use client::{get, Config, ConnectionRef, Error, Pool, Response};

    type Log = Rc<RefCell<Vec<(usize, String)>>>;

    fn ok(body: &str) -> String {
        format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(), body)
    }

    fn submit(pool: &Pool<MockTransport>, path: &str, log: &Log) {
        let log = log.clone();
        pool.submit(get(path, true),
            move |c: &ConnectionRef, e: Option<Error>, r: Response| {
                assert!(e.is_none());
                log.borrow_mut().push(
                    (c.id(), String::from_utf8_lossy(r.body()).to_string()));
            });
    }

    fn turn(core: &mut Core) {
        for _ in 0..10 {
            core.turn(Some(Duration::from_millis(1)));
        }
    }

    #[test]
    fn fifo_on_single_connection() {
        let mut core = Core::new().unwrap();
        let tr = MockTransport::new();
        let sock = tr.push_stream();
        sock.add_reply(ok("1"));
        sock.add_reply(ok("2"));
        sock.add_reply(ok("3"));
        let cfg = Config::new().connection_limit(1).done();
        let pool = Pool::new(tr.clone(), "example.com", 80, &cfg,
                             &core.handle());
        let log = Log::default();
        submit(&pool, "/1", &log);
        submit(&pool, "/2", &log);
        submit(&pool, "/3", &log);
        assert_eq!(pool.queued(), 2);
        assert_eq!(pool.live(), 1);
        turn(&mut core);
        let bodies = log.borrow().iter().map(|x| x.1.clone())
            .collect::<Vec<_>>();
        assert_eq!(bodies, vec!["1", "2", "3"]);
        assert_eq!(tr.connects(), 1);
        assert_eq!(pool.queued(), 0);
        assert_eq!(pool.live(), 0);
        let sent = String::from_utf8_lossy(&sock.output()).to_string();
        let first = sent.find("GET /1 ").unwrap();
        let second = sent.find("GET /2 ").unwrap();
        let third = sent.find("GET /3 ").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn bounded_connections() {
        let mut core = Core::new().unwrap();
        let tr = MockTransport::new();
        // either connection may end up running any number of the jobs
        for _ in 0..2 {
            let sock = tr.push_stream();
            for _ in 0..4 {
                sock.add_reply(ok("a"));
            }
        }
        let cfg = Config::new().connection_limit(2).done();
        let pool = Pool::new(tr.clone(), "example.com", 80, &cfg,
                             &core.handle());
        let log = Log::default();
        for i in 0..4 {
            submit(&pool, &format!("/{}", i), &log);
        }
        assert_eq!(pool.live(), 2);
        assert_eq!(pool.queued(), 2);
        turn(&mut core);
        assert_eq!(log.borrow().len(), 4);
        assert_eq!(tr.connects(), 2);
        let mut ids = log.borrow().iter().map(|x| x.0).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn expired_slot_is_reused() {
        let mut core = Core::new().unwrap();
        let tr = MockTransport::new();
        tr.push_stream().add_input(ok("first"));
        let cfg = Config::new().connection_limit(1).done();
        let pool = Pool::new(tr.clone(), "example.com", 80, &cfg,
                             &core.handle());
        let log = Log::default();
        submit(&pool, "/", &log);
        turn(&mut core);
        assert_eq!(pool.live(), 0);
        tr.push_stream().add_input(ok("second"));
        submit(&pool, "/", &log);
        assert_eq!(pool.queued(), 0);
        turn(&mut core);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].1, "second");
        assert!(log[0].0 != log[1].0);
        assert_eq!(tr.connects(), 2);
    }

    #[test]
    fn submit_from_handler() {
        let mut core = Core::new().unwrap();
        let tr = MockTransport::new();
        let sock = tr.push_stream();
        sock.add_reply(ok("outer"));
        sock.add_reply(ok("inner"));
        let cfg = Config::new().connection_limit(1).done();
        let pool = Pool::new(tr.clone(), "example.com", 80, &cfg,
                             &core.handle());
        let log = Log::default();
        let inner_pool = pool.clone();
        let inner_log = log.clone();
        pool.submit(get("/outer", true),
            move |_: &ConnectionRef, e: Option<Error>, r: Response| {
                assert!(e.is_none());
                assert_eq!(r.body(), b"outer");
                submit(&inner_pool, "/inner", &inner_log);
            });
        turn(&mut core);
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1, "inner");
        assert_eq!(tr.connects(), 1);
    }
}
