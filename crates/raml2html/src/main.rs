//! Guard for running the library crate directly.

const MESSAGE: &str = "This crate is meant to be used as a library. You probably want to run the raml2html binary from raml2html-cli if you're looking for a CLI.";

fn main() {
    println!("{MESSAGE}");
    std::process::exit(1);
}
