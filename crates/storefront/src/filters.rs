//! Filters used by the page shell in `base.html`.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::Datelike;

/// Stylesheet served when the build could not fingerprint `main.css`.
const PLAIN_STYLESHEET: &str = "/static/css/main.css";

/// Href of the fingerprinted stylesheet produced by `build.rs`.
///
/// Usage in templates: `{{ ""|stylesheet_href }}`
#[askama::filter_fn]
pub fn stylesheet_href(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(stylesheet_path(env!("STYLESHEET_DIGEST")))
}

fn stylesheet_path(digest: &str) -> String {
    if digest.is_empty() {
        PLAIN_STYLESHEET.to_string()
    } else {
        format!("/static/css/derived/main.{digest}.css")
    }
}

/// Year printed in the footer copyright line.
#[askama::filter_fn]
pub fn copyright_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    Ok(chrono::Utc::now().year())
}
