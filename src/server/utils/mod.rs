pub mod m3u;
pub mod manifest_rewriter;
pub mod proxy_target;
