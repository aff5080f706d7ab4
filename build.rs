//! Build script for minifying the embedded render worker.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

/// Placeholders the runtime template substitutes; they must survive minification.
const WORKER_PLACEHOLDERS: [&str; 2] = ["__PRERENDER_REACT__", "__PRERENDER_SERVER__"];

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    minify_worker_js("src/embed/worker.js", &out_path.join("worker.min.js"));

    println!("cargo:rerun-if-changed=src/embed/worker.js");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::cjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_worker_js(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read worker.js");
    let minified = minify_js(&source);

    // Fall back to the readable source if minification dropped a placeholder.
    let code = if WORKER_PLACEHOLDERS.iter().all(|p| minified.contains(p)) {
        minified
    } else {
        source
    };

    fs::write(output, code).expect("Failed to write minified worker JS");
}
