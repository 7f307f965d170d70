//! Benchmarks for the conversion pipeline.
//!
//! Run with: cargo bench

use std::fmt::Write as _;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use bookbinder::admonition::reshape_admonitions;
use bookbinder::dom::{Dom, serialize::serialize_subtree};
use bookbinder::epub::{NAV_FILE, write_package};
use bookbinder::links::{IdentifierMap, rewrite_links};
use bookbinder::split::split_sections;
use bookbinder::toc::build_toc;
use bookbinder::{Metadata, Package};

const SECTIONS: usize = 30;
const PARAGRAPHS: usize = 40;

/// Generate a rendered book of the shape the converter expects.
fn synthetic_book() -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><title>Bench Book</title></head><body>\n<div id=\"toc\">\n<ul>\n",
    );
    for s in 1..=SECTIONS {
        let _ = writeln!(
            html,
            "<li><a href=\"#_ch{s}\">Chapter {s}</a>\n<ul><li><a href=\"#_ch{s}_detail\">Detail</a></li></ul>\n</li>"
        );
    }
    html.push_str("</ul>\n</div>\n");

    for s in 1..=SECTIONS {
        let _ = writeln!(html, "<div class=\"sect1\">\n<h2 id=\"_ch{s}\">Chapter {s}</h2>");
        let _ = writeln!(html, "<h3 id=\"_ch{s}_detail\">Detail</h3>");
        for p in 0..PARAGRAPHS {
            let target = (s % SECTIONS) + 1;
            let _ = writeln!(
                html,
                "<p id=\"_ch{s}_p{p}\">Lorem ipsum dolor sit amet, \
                 <a href=\"#_ch{target}\">see chapter {target}</a>.</p>"
            );
        }
        html.push_str(
            "<div class=\"admonitionblock note\">\n<table><tr>\
             <td class=\"icon\">i</td>\n<td class=\"content\">A note body</td>\n</tr>\n</table>\n</div>\n",
        );
        html.push_str("</div>\n");
    }
    html.push_str("</body></html>\n");
    html
}

/// Run the pipeline up to serialized, link-rewritten section markup.
fn split_and_rewrite(html: &str) -> Vec<String> {
    let mut dom = Dom::parse(html);
    let toc_root = dom.element_by_id("toc").unwrap();
    let mut map = IdentifierMap::new();
    let entries = build_toc(&dom, toc_root, &mut map).unwrap();
    let sections = split_sections(&mut dom, &entries, &mut map).unwrap();
    sections
        .into_iter()
        .map(|section| reshape_admonitions(&rewrite_links(&section.markup, &map)))
        .collect()
}

// ============================================================================
// Parse and split
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let html = synthetic_book();

    c.bench_function("parse", |b| {
        b.iter(|| Dom::parse(&html));
    });
}

fn bench_split_sections(c: &mut Criterion) {
    let html = synthetic_book();

    c.bench_function("split_sections", |b| {
        b.iter(|| {
            let mut dom = Dom::parse(&html);
            let toc_root = dom.element_by_id("toc").unwrap();
            let mut map = IdentifierMap::new();
            let entries = build_toc(&dom, toc_root, &mut map).unwrap();
            split_sections(&mut dom, &entries, &mut map).unwrap()
        });
    });
}

fn bench_serialize(c: &mut Criterion) {
    let html = synthetic_book();
    let dom = Dom::parse(&html);
    let body = dom.find_by_tag("body").unwrap();

    c.bench_function("serialize", |b| {
        b.iter(|| serialize_subtree(&dom, body));
    });
}

// ============================================================================
// Text transforms
// ============================================================================

fn bench_rewrite_links(c: &mut Criterion) {
    let html = synthetic_book();
    let mut dom = Dom::parse(&html);
    let toc_root = dom.element_by_id("toc").unwrap();
    let mut map = IdentifierMap::new();
    let entries = build_toc(&dom, toc_root, &mut map).unwrap();
    let sections = split_sections(&mut dom, &entries, &mut map).unwrap();

    c.bench_function("rewrite_links", |b| {
        b.iter(|| {
            for section in &sections {
                rewrite_links(&section.markup, &map);
            }
        });
    });
}

fn bench_reshape_admonitions(c: &mut Criterion) {
    let html = synthetic_book();
    let mut dom = Dom::parse(&html);
    let toc_root = dom.element_by_id("toc").unwrap();
    let mut map = IdentifierMap::new();
    let entries = build_toc(&dom, toc_root, &mut map).unwrap();
    let sections = split_sections(&mut dom, &entries, &mut map).unwrap();

    c.bench_function("reshape_admonitions", |b| {
        b.iter(|| {
            for section in &sections {
                reshape_admonitions(&section.markup);
            }
        });
    });
}

// ============================================================================
// Container output
// ============================================================================

fn bench_write_package(c: &mut Criterion) {
    let html = synthetic_book();
    let markups = split_and_rewrite(&html);

    let mut pkg = Package::new();
    pkg.metadata = Metadata::new("Bench Book").with_author("Bench Author");
    for (i, markup) in markups.iter().enumerate() {
        let href = format!("section_{:02}.xhtml", i + 1);
        pkg.add_resource(&href, markup.clone().into_bytes(), "application/xhtml+xml");
        pkg.spine.push(href);
    }
    pkg.spine.insert(0, NAV_FILE.to_string());

    c.bench_function("write_package", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            write_package(&pkg, Cursor::new(&mut buf)).unwrap();
            buf
        });
    });
}

criterion_group!(
    benches,
    // Parse and split
    bench_parse,
    bench_split_sections,
    bench_serialize,
    // Text transforms
    bench_rewrite_links,
    bench_reshape_admonitions,
    // Container output
    bench_write_package,
);
criterion_main!(benches);
