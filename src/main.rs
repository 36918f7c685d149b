fn main() {
    if let Err(err) = limn::run() {
        eprintln!("limn failed to start: {err}");
        std::process::exit(1);
    }
}
