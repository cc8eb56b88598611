extern crate tk_http_pool;
extern crate argparse;
extern crate env_logger;
extern crate tokio_core;
#[macro_use] extern crate log;

use std::cell::Cell;
use std::env;
use std::rc::Rc;
use std::time::{Duration, Instant};

use argparse::{ArgumentParser, Store, List};
use tokio_core::reactor::Core;

use tk_http_pool::client::{self, Config, Pool, TcpTransport};


pub fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init().unwrap();

    let mut host = "localhost".to_string();
    let mut port = 80u16;
    let mut connections = 4usize;
    let mut requests = 16usize;
    let mut paths = Vec::<String>::new();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Fetches paths from a single host using a pool \
            of keep-alive connections");
        ap.refer(&mut host)
            .add_option(&["--host"], Store, "Host to connect to");
        ap.refer(&mut port)
            .add_option(&["--port"], Store, "Port to connect to");
        ap.refer(&mut connections)
            .add_option(&["-c", "--connections"], Store,
                "Maximum number of simultaneous connections");
        ap.refer(&mut requests)
            .add_option(&["-n", "--requests"], Store,
                "Number of requests when no paths are given");
        ap.refer(&mut paths)
            .add_argument("path", List, "Paths to fetch");
        ap.parse_args_or_exit();
    }
    if paths.is_empty() {
        paths = vec!["/".to_string(); requests];
    }

    let mut lp = Core::new().expect("loop created");
    let handle = lp.handle();
    let config = Config::new().connection_limit(connections).done();
    let pool = Pool::new(TcpTransport::new(&handle),
        &host, port, &config, &handle);

    let start = Instant::now();
    let left = Rc::new(Cell::new(paths.len()));
    for path in &paths {
        let left = left.clone();
        let path = path.clone();
        pool.submit(client::get(&path, true), move |conn, err, response| {
            match err {
                Some(e) => error!("{}: {}", path, e),
                None => info!("{}: {:?} {} bytes (connection {})",
                    path, response.status(), response.body().len(),
                    conn.id()),
            }
            left.set(left.get() - 1);
        });
    }
    while left.get() > 0 {
        lp.turn(Some(Duration::from_millis(100)));
    }
    let elapsed = start.elapsed();
    info!("{} requests done in {}.{:03}s", paths.len(),
        elapsed.as_secs(), elapsed.subsec_nanos() / 1_000_000);
}
