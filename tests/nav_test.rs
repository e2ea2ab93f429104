use std::fs;
use std::path::Path;

use folio::{normalize_navigation, Error};
use tempfile::TempDir;

const BOOK_TITLE: &str = "Book Title";

const TOC_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
<head><meta name="dtb:depth" content="1" /></head>
<docTitle><text>Book Title</text></docTitle>
<navMap>
<navPoint id="navPoint-1"><navLabel><text>Book Title</text></navLabel><content src="text/title_page.xhtml" /></navPoint>
<navPoint id="navPoint-2"><navLabel><text>Chapter One</text></navLabel><content src="text/ch001.xhtml" /></navPoint>
<navPoint id="navPoint-3"><navLabel><text></text></navLabel><content src="text/ch002.xhtml" /></navPoint>
</navMap>
</ncx>"#;

const NAV_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Book Title</title></head>
<body>
<nav epub:type="toc" id="toc">
<h1>Table of Contents</h1>
<ol>
<li id="toc-li-1"><a href="text/title_page.xhtml">Book Title</a></li>
<li id="toc-li-2"><a href="text/ch001.xhtml">Chapter One</a></li>
<li id="toc-li-3"><a href="text/ch002.xhtml">Chapter Two</a></li>
</ol>
</nav>
</body>
</html>"#;

const CHAPTER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <title>Chapter One</title>
</head>
<body><h1>Chapter One</h1><p>Text.</p></body>
</html>"#;

/// Lay out an unpacked package directory with both TOC encodings and one
/// chapter file.
fn unpacked_package() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let epub = dir.path().join("EPUB");
    fs::create_dir_all(epub.join("text")).unwrap();
    fs::write(epub.join("toc.ncx"), TOC_NCX).unwrap();
    fs::write(epub.join("nav.xhtml"), NAV_XHTML).unwrap();
    fs::write(epub.join("text").join("ch001.xhtml"), CHAPTER_XHTML).unwrap();
    dir
}

fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}

#[test]
fn test_numbered_entries_filtered_and_renumbered() {
    let dir = unpacked_package();
    normalize_navigation(dir.path(), BOOK_TITLE).expect("normalize");

    let ncx = read(dir.path(), "EPUB/toc.ncx");
    // Title and empty-label entries are gone; the survivor is renumbered
    // densely from 1.
    assert_eq!(ncx.matches("<navPoint").count(), 1);
    assert!(ncx.contains(r#"id="navPoint-1""#));
    assert!(ncx.contains("Chapter One"));
    assert!(!ncx.contains("title_page.xhtml"));
    // The docTitle outside the navMap is untouched.
    assert!(ncx.contains("<docTitle><text>Book Title</text></docTitle>"));
}

#[test]
fn test_nested_list_filtered_and_renumbered() {
    let dir = unpacked_package();
    normalize_navigation(dir.path(), BOOK_TITLE).expect("normalize");

    let nav = read(dir.path(), "EPUB/nav.xhtml");
    assert_eq!(nav.matches("<li").count(), 2);
    assert!(nav.contains(r#"id="toc-li-1""#));
    assert!(nav.contains(r#"id="toc-li-2""#));
    assert!(!nav.contains(r#"id="toc-li-3""#));
    assert!(nav.contains("Chapter One"));
    assert!(nav.contains("Chapter Two"));
    assert!(!nav.contains("title_page.xhtml"));
}

#[test]
fn test_chapter_titles_rewritten() {
    let dir = unpacked_package();
    normalize_navigation(dir.path(), BOOK_TITLE).expect("normalize");

    let chapter = read(dir.path(), "EPUB/text/ch001.xhtml");
    assert!(chapter.contains("<title>Book Title</title>"));
    assert!(!chapter.contains("<title>Chapter One</title>"));
    // Body content is untouched.
    assert!(chapter.contains("<h1>Chapter One</h1>"));
}

#[test]
fn test_normalization_is_idempotent() {
    let dir = unpacked_package();
    normalize_navigation(dir.path(), BOOK_TITLE).expect("first pass");
    let ncx_once = read(dir.path(), "EPUB/toc.ncx");
    let nav_once = read(dir.path(), "EPUB/nav.xhtml");

    normalize_navigation(dir.path(), BOOK_TITLE).expect("second pass");
    assert_eq!(read(dir.path(), "EPUB/toc.ncx"), ncx_once);
    assert_eq!(read(dir.path(), "EPUB/nav.xhtml"), nav_once);
}

#[test]
fn test_absent_navigation_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("EPUB")).unwrap();
    normalize_navigation(dir.path(), BOOK_TITLE).expect("nothing to do is fine");
}

#[test]
fn test_missing_navmap_is_fatal() {
    let dir = TempDir::new().unwrap();
    let epub = dir.path().join("EPUB");
    fs::create_dir_all(&epub).unwrap();
    fs::write(
        epub.join("toc.ncx"),
        r#"<?xml version="1.0"?><ncx><docTitle><text>T</text></docTitle></ncx>"#,
    )
    .unwrap();

    match normalize_navigation(dir.path(), BOOK_TITLE) {
        Err(Error::MalformedNavigation(msg)) => assert!(msg.contains("navMap")),
        other => panic!("expected structural error, got {other:?}"),
    }
}

#[test]
fn test_missing_toc_nav_is_fatal() {
    let dir = TempDir::new().unwrap();
    let epub = dir.path().join("EPUB");
    fs::create_dir_all(&epub).unwrap();
    fs::write(
        epub.join("nav.xhtml"),
        r#"<html><body><nav id="landmarks"><ol><li><a href="x">X</a></li></ol></nav></body></html>"#,
    )
    .unwrap();

    match normalize_navigation(dir.path(), BOOK_TITLE) {
        Err(Error::MalformedNavigation(msg)) => assert!(msg.contains("nav")),
        other => panic!("expected structural error, got {other:?}"),
    }
}

#[test]
fn test_list_item_without_link_is_fatal() {
    let dir = TempDir::new().unwrap();
    let epub = dir.path().join("EPUB");
    fs::create_dir_all(&epub).unwrap();
    fs::write(
        epub.join("nav.xhtml"),
        r#"<html><body><nav id="toc"><ol><li id="toc-li-1">No link here</li></ol></nav></body></html>"#,
    )
    .unwrap();

    match normalize_navigation(dir.path(), BOOK_TITLE) {
        Err(Error::MalformedNavigation(msg)) => assert!(msg.contains("<a>")),
        other => panic!("expected structural error, got {other:?}"),
    }
}

#[test]
fn test_entity_labels_match_title() {
    // A title with an ampersand is escaped in the XML but must still be
    // compared against the plain book title.
    let dir = TempDir::new().unwrap();
    let epub = dir.path().join("EPUB");
    fs::create_dir_all(&epub).unwrap();
    fs::write(
        epub.join("toc.ncx"),
        r#"<?xml version="1.0"?><ncx><navMap>
<navPoint id="navPoint-1"><navLabel><text>Crime &amp; Punishment</text></navLabel><content src="text/title_page.xhtml" /></navPoint>
<navPoint id="navPoint-2"><navLabel><text>Part One</text></navLabel><content src="text/ch001.xhtml" /></navPoint>
</navMap></ncx>"#,
    )
    .unwrap();

    normalize_navigation(dir.path(), "Crime & Punishment").expect("normalize");
    let ncx = read(dir.path(), "EPUB/toc.ncx");
    assert_eq!(ncx.matches("<navPoint").count(), 1);
    assert!(ncx.contains("Part One"));
}
