//! platform CLI binary
//!
//! All logic is in the library; main.rs only invokes cli::run().

fn main() {
    // cli::run() prints its own errors and returns the exit code to use
    if let Err(code) = platform_engine::cli::run() {
        std::process::exit(code.as_i32());
    }
}
