//! Developer scratch binary: dumps the token stream for a file given on
//! the command line. Not part of the published API.

use component_compiler_core::tokenizer::Tokenizer;
use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: dump_tokens <file>");
        return ExitCode::FAILURE;
    };

    let source = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut tokenizer = Tokenizer::new(&source);
    let mut count = 0;
    while let Some(token) = tokenizer.next_token() {
        println!("{:>6}..{:<6} {:?}", token.raw.start, token.raw.end, token.kind);
        count += 1;
    }
    eprintln!("{count} tokens, {} diagnostics", tokenizer.diagnostics.len());

    ExitCode::SUCCESS
}
