//! Build provenance, as stamped by `build.rs`.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Commit the binary was built from, or "unknown" outside a git checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

pub const BUILD_TIMESTAMP: &str = match option_env!("VERGEN_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

fn short_sha() -> &'static str {
    GIT_SHA.get(..7).unwrap_or(GIT_SHA)
}

/// `0.1.0+main.abc1234`, with a `.dirty` suffix for uncommitted builds.
pub fn version_string() -> String {
    let mut version = format!("{PKG_VERSION}+{GIT_BRANCH}.{}", short_sha());
    if git_dirty() {
        version.push_str(".dirty");
    }
    version
}

/// `User-Agent` sent with every provider request, e.g. `gridscrape/0.1.0 (abc1234)`.
pub(crate) fn user_agent() -> String {
    format!("gridscrape/{PKG_VERSION} ({})", short_sha())
}
