use anyhow::Context;
use hexc_drv::{parse_args, read_source_from_stdin, ArgOutcome, Session, USAGE};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let config = match parse_args(std::env::args().skip(1)) {
        ArgOutcome::Help => {
            eprintln!("{USAGE}");
            return Ok(1);
        }
        ArgOutcome::Run(config) => config,
    };

    let source = read_source_from_stdin().context("reading source from stdin")?;
    let mut session = Session::new(config);

    match session.compile(&source) {
        Ok(_) => {
            session.handler.print_all();
            Ok(0)
        }
        Err(err) => {
            session.handler.print_all();
            eprintln!("error: {err}");
            Ok(1)
        }
    }
}
