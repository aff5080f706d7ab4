//! Finishing steps applied to serialized markup.

use std::sync::Arc;

use regex::Regex;

use crate::config::PostRenderRule;

/// Caller-supplied markup transform.
pub type PostRender = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Prefix `header` when the markup is a whole document.
pub fn inject_header(markup: String, header: &str) -> String {
    if markup.trim_start().starts_with("<html") {
        let mut out = String::with_capacity(header.len() + markup.len());
        out.push_str(header);
        out.push_str(&markup);
        out
    } else {
        markup
    }
}

/// Apply `transforms` in order.
pub fn post_render(markup: String, transforms: &[PostRender]) -> String {
    transforms.iter().fold(markup, |acc, f| f(acc))
}

/// Header injection followed by the transforms.
pub fn finish(markup: String, header: &str, transforms: &[PostRender]) -> String {
    post_render(inject_header(markup, header), transforms)
}

/// Transform replacing every match of `regex` with `replace`.
pub fn replace_all(regex: Regex, replace: String) -> PostRender {
    Arc::new(move |markup: String| regex.replace_all(&markup, replace.as_str()).into_owned())
}

/// Compile configured find/replace rules, preserving their order.
pub fn compile_rules(rules: &[PostRenderRule]) -> Result<Vec<PostRender>, regex::Error> {
    rules
        .iter()
        .map(|rule| Ok(replace_all(rule.compile()?, rule.replace.clone())))
        .collect()
}
