extern crate url;
extern crate tk_http_pool;
extern crate argparse;
extern crate env_logger;
extern crate tokio_core;

use std::io::{self, Write};
use std::env;
use std::fs::File;
use std::path::{PathBuf, Path};
use std::process::exit;
use std::str::FromStr;

use url::Url;
use argparse::{ArgumentParser, Store, ParseOption};


pub struct Options {
    pub url: Url,
    pub dump_header: Option<PathBuf>,
}


pub fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init().unwrap();

    let mut opt = Options {
        url: Url::from_str("http://localhost").unwrap(),
        dump_header: None,
    };
    {
        let mut ap = ArgumentParser::new();
        ap.refer(&mut opt.url)
            .add_argument("url", Store, "
                Fetch specified url (http only)
            ").required();
        ap.refer(&mut opt.dump_header)
            .add_option(&["-D", "--dump-header"], ParseOption,
                "Write status and framing info into the file (`-` is stdout)");
        ap.parse_args_or_exit();
    }

    let mut lp = tokio_core::reactor::Core::new().expect("loop created");
    let handle = lp.handle();

    let response = match lp.run(
        tk_http_pool::client::fetch_once(&opt.url, &handle))
    {
        Ok(response) => response,
        Err(e) => {
            writeln!(&mut io::stderr(), "Error: {}", e).ok();
            exit(1);
        }
    };
    if let Some(filename) = opt.dump_header {
        let mut out: Box<io::Write> = if filename == Path::new("-") {
            Box::new(io::stdout())
        } else {
            Box::new(
                File::create(filename).expect("can't open file for headers"))
        };
        let version = response.version()
            .map(|v| v.to_string()).unwrap_or("HTTP/?".to_string());
        let status = response.status()
            .map(|s| s.to_string()).unwrap_or("???".to_string());
        writeln!(&mut out, "{} {}", version, status).unwrap();
        writeln!(&mut out, "{:?}", response.header()).unwrap();
        writeln!(&mut out, "").unwrap();
    }
    io::stdout().write_all(response.body()).unwrap();
}
