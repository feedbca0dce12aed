fn main() {
    if let Err(err) = sleeptracker_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
