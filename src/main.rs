#[cfg(feature = "cli")]
mod cli;

#[cfg(feature = "cli")]
fn main() {
    match cli::run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("zeroshot-rs was built without the `cli` feature; rebuild with `--features cli`.");
    std::process::exit(2);
}
