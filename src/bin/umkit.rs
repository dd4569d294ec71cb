//! Command line runner for the `umkit` library.

#[cfg(not(feature = "for-testing"))]
#[quit::main]
fn main() {
    umkit::cli::run::run();
}

#[cfg(feature = "for-testing")]
fn main() {
    eprintln!("Warning: The `for-testing` feature is enabled, which will clutter error messages");
    umkit::cli::run::run();
}
