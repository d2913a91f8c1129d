use playlist_proxy::server::utils::manifest_rewriter::{
    ManifestLine, classify_line, rewrite_manifest, rewrite_uri,
};
use playlist_proxy::server::utils::proxy_target::proxied_url;

const BASE: &str = "https://cdn.example.com/live/";
const ORIGIN: &str = "https://my.app";

#[test]
fn test_root_relative_segment() {
    let manifest = "#EXTM3U\n#EXTINF:-1,Channel One\n/media/chunk1.ts\n";

    assert_eq!(
        rewrite_manifest(manifest, BASE, ORIGIN),
        "#EXTM3U\n#EXTINF:-1,Channel One\nhttps://my.app/proxy/https/cdn.example.com/media/chunk1.ts\n"
    );
}

#[test]
fn test_relative_segments_resolve_against_directory() {
    assert_eq!(
        rewrite_uri("seg-1.ts", BASE, ORIGIN).as_deref(),
        Some("https://my.app/proxy/https/cdn.example.com/live/seg-1.ts")
    );
    assert_eq!(
        rewrite_uri("../other/seg.ts?part=2", BASE, ORIGIN).as_deref(),
        Some("https://my.app/proxy/https/cdn.example.com/other/seg.ts?part=2")
    );
    assert_eq!(
        rewrite_uri("//mirror.example.com/seg.ts", BASE, ORIGIN).as_deref(),
        Some("https://my.app/proxy/https/mirror.example.com/seg.ts")
    );
}

#[test]
fn test_relative_resolution_matches_url_join() {
    for relative in ["a/b.ts", "./c.ts", "../../d.m3u8", "/e.key", "f.ts?x=1&y=2"] {
        let joined = url::Url::parse(BASE).unwrap().join(relative).unwrap();
        assert_eq!(
            rewrite_uri(relative, BASE, ORIGIN),
            proxied_url(ORIGIN, joined.as_str()),
            "{}",
            relative
        );
    }
}

#[test]
fn test_absolute_urls_ignore_base() {
    let absolute = "http://other.host:8080/a/b.ts?x=1";
    let expected = Some("https://my.app/proxy/http/other.host:8080/a/b.ts?x=1".to_string());

    assert_eq!(rewrite_uri(absolute, BASE, ORIGIN), expected);
    assert_eq!(
        rewrite_uri(absolute, "http://somewhere.else/deep/dir/", ORIGIN),
        expected
    );
}

#[test]
fn test_key_uri_is_rewritten_in_place() {
    let manifest = "#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\",IV=0x1234\n";

    assert_eq!(
        rewrite_manifest(manifest, BASE, ORIGIN),
        "#EXT-X-KEY:METHOD=AES-128,URI=\"https://my.app/proxy/https/cdn.example.com/live/key.bin\",IV=0x1234\n"
    );
}

#[test]
fn test_other_directives_pass_through() {
    let manifest = "#EXTM3U\n\
                    #EXT-X-VERSION:7\n\
                    #EXT-X-MAP:URI=\"init.mp4\"\n\
                    #EXT-X-KEY:METHOD=NONE\n\
                    #EXT-X-KEY:METHOD=SAMPLE-AES,URI=\"skd://key42\",KEYFORMAT=\"com.apple.streamingkeydelivery\"\n\
                    \n";

    assert_eq!(rewrite_manifest(manifest, BASE, ORIGIN), manifest);
}

#[test]
fn test_unresolvable_lines_are_left_alone() {
    let manifest = "#EXTINF:4,\n//[not-an-ip/seg.ts\n#EXTINF:4,\nseg-2.ts\n";

    assert_eq!(
        rewrite_manifest(manifest, BASE, ORIGIN),
        "#EXTINF:4,\n//[not-an-ip/seg.ts\n#EXTINF:4,\nhttps://my.app/proxy/https/cdn.example.com/live/seg-2.ts\n"
    );
}

#[test]
fn test_rewriting_twice_changes_nothing() {
    let manifest = "#EXTM3U\n\
                    #EXT-X-KEY:METHOD=AES-128,URI=\"https://keys.example.com/k\"\n\
                    #EXT-X-STREAM-INF:BANDWIDTH=800000\n\
                    low/index.m3u8\n\
                    http://plain.example.com/high/index.m3u8\n";

    let once = rewrite_manifest(manifest, BASE, ORIGIN);
    let twice = rewrite_manifest(&once, BASE, ORIGIN);

    assert_ne!(once, manifest);
    assert_eq!(twice, once);
    assert_eq!(
        rewrite_uri("https://my.app/proxy/http/plain.example.com/x.ts", BASE, ORIGIN).as_deref(),
        Some("https://my.app/proxy/http/plain.example.com/x.ts")
    );
}

#[test]
fn test_line_endings_are_kept() {
    let manifest = "#EXTM3U\r\n#EXTINF:4,\r\nseg-1.ts\r\n#EXTINF:4,\r\nseg-2.ts";

    assert_eq!(
        rewrite_manifest(manifest, BASE, ORIGIN),
        "#EXTM3U\r\n#EXTINF:4,\r\nhttps://my.app/proxy/https/cdn.example.com/live/seg-1.ts\r\n#EXTINF:4,\r\nhttps://my.app/proxy/https/cdn.example.com/live/seg-2.ts"
    );
}

#[test]
fn test_line_classification() {
    assert_eq!(classify_line("   "), ManifestLine::Blank);
    assert_eq!(classify_line("#EXT-X-TARGETDURATION:6"), ManifestLine::Directive);
    assert_eq!(classify_line("#EXT-X-KEY:METHOD=NONE"), ManifestLine::Directive);
    assert_eq!(classify_line("  seg.ts "), ManifestLine::Uri("seg.ts"));

    let line = "#EXT-X-KEY:METHOD=AES-128,URI=\"k.bin\"";
    match classify_line(line) {
        ManifestLine::KeyUri { uri, start, end } => {
            assert_eq!(uri, "k.bin");
            assert_eq!(&line[start..end], "k.bin");
        }
        other => panic!("expected a key line, got {:?}", other),
    }
}
