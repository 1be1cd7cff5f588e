//! Fingerprints the storefront stylesheet.
//!
//! `static/css/main.css` is copied to `static/css/derived/main.<digest>.css`
//! and the digest is exported as `STYLESHEET_DIGEST`; a changed stylesheet
//! always gets a new URL and can be served with immutable caching.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 digest kept in the file name.
const DIGEST_LEN: usize = 8;

fn main() -> Result<(), Box<dyn Error>> {
    let css_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("static/css");
    let source = css_dir.join("main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let digest = match fs::read(&source) {
        Ok(css) => fingerprint(&css, &source, &css_dir.join("derived"))?,
        Err(e) => {
            println!("cargo:warning=stylesheet not fingerprinted: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=STYLESHEET_DIGEST={digest}");
    Ok(())
}

/// Copy `source` into `out_dir` under its digested name; returns the digest.
fn fingerprint(css: &[u8], source: &Path, out_dir: &Path) -> Result<String, Box<dyn Error>> {
    let digest: String = format!("{:x}", Sha256::digest(css))
        .chars()
        .take(DIGEST_LEN)
        .collect();

    fs::create_dir_all(out_dir)?;
    fs::copy(source, out_dir.join(format!("main.{digest}.css")))?;
    Ok(digest)
}
