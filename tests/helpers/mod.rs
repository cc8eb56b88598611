//! Blocking HTTP server on a std listener, one thread per connection
#![allow(dead_code)]
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tokio_core::reactor::Core;


/// What the server writes in response to a single request
pub struct Reply {
    /// Written one by one with a short pause in between
    pub pieces: Vec<Vec<u8>>,
    /// Close the socket after the reply
    pub close: bool,
}

impl Reply {
    pub fn ok(body: &str) -> Reply {
        Reply {
            pieces: vec![format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                body.len(), body).into_bytes()],
            close: false,
        }
    }
    pub fn raw(data: &[u8], close: bool) -> Reply {
        Reply { pieces: vec![data.to_vec()], close: close }
    }
    pub fn fragmented(data: &[u8], piece: usize, close: bool) -> Reply {
        Reply {
            pieces: data.chunks(piece).map(|x| x.to_vec()).collect(),
            close: close,
        }
    }
}

#[derive(Default)]
struct Stats {
    accepted: AtomicUsize,
    current: AtomicUsize,
    max_concurrent: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

pub struct Server {
    addr: SocketAddr,
    stats: Arc<Stats>,
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => return None,
        Ok(_) => {}
    }
    let path = line.split_whitespace().nth(1).unwrap_or("").to_string();
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => return None,
            Ok(_) if header == "\r\n" => return Some(path),
            Ok(_) => continue,
        }
    }
}

fn serve<F>(sock: TcpStream, stats: Arc<Stats>, handler: Arc<F>)
    where F: Fn(&str) -> Reply
{
    let mut out = sock.try_clone().unwrap();
    let mut reader = BufReader::new(sock);
    while let Some(path) = read_request(&mut reader) {
        stats.paths.lock().unwrap().push(path.clone());
        let reply = handler(&path);
        let fragmented = reply.pieces.len() > 1;
        for piece in &reply.pieces {
            if out.write_all(piece).and_then(|()| out.flush()).is_err() {
                break;
            }
            if fragmented {
                thread::sleep(Duration::from_millis(2));
            }
        }
        if reply.close {
            break;
        }
    }
    stats.current.fetch_sub(1, Ordering::SeqCst);
}

impl Server {
    pub fn start<F>(handler: F) -> Server
        where F: Fn(&str) -> Reply + Send + Sync + 'static
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(Stats::default());
        let handler = Arc::new(handler);
        let st = stats.clone();
        thread::spawn(move || {
            for sock in listener.incoming() {
                let sock = match sock {
                    Ok(sock) => sock,
                    Err(_) => break,
                };
                st.accepted.fetch_add(1, Ordering::SeqCst);
                let cur = st.current.fetch_add(1, Ordering::SeqCst) + 1;
                st.max_concurrent.fetch_max(cur, Ordering::SeqCst);
                let st = st.clone();
                let handler = handler.clone();
                thread::spawn(move || serve(sock, st, handler));
            }
        });
        Server { addr: addr, stats: stats }
    }
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.addr.port(), path)
    }
    pub fn accepted(&self) -> usize {
        self.stats.accepted.load(Ordering::SeqCst)
    }
    pub fn max_concurrent(&self) -> usize {
        self.stats.max_concurrent.load(Ordering::SeqCst)
    }
    pub fn paths(&self) -> Vec<String> {
        self.stats.paths.lock().unwrap().clone()
    }
}

/// Turns the reactor until `done` returns true, panics after ten seconds
pub fn run_until<F: Fn() -> bool>(core: &mut Core, done: F) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        core.turn(Some(Duration::from_millis(10)));
    }
}
