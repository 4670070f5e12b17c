//! Benchmarks for page reconstruction and excerpt location.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use ppa_excerpt::{
    AlignConfig, Aligner, Document, ExcerptLocator, LocatorConfig, TcpPageText, locate_span,
};

const ART_OF_POETRY: &str = include_str!("../tests/fixtures/art_of_poetry.xml");
const THREE_HUNDRED_PAGES: &str = include_str!("../tests/fixtures/three_hundred_pages.xml");

const OCR_PAGE: &str = "Of all the Inſtitutions of Learning, Poetry * is the moſt
ancient. As the Poet ſings,
For God's ſake, let us ſit upon the ground,
And tell ſad ſtories of the death of Kings;";

// ============================================================================
// Segmentation Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_300_pages", |b| {
        b.iter(|| Document::parse(THREE_HUNDRED_PAGES).unwrap());
    });
}

fn bench_pages(c: &mut Criterion) {
    let doc = Document::parse(THREE_HUNDRED_PAGES).unwrap();

    c.bench_function("reconstruct_300_pages", |b| {
        b.iter(|| doc.pages());
    });
}

// ============================================================================
// Alignment Benchmarks
// ============================================================================

fn bench_locate_exact(c: &mut Criterion) {
    let excerpt = "For God's ſake, let us ſit upon the ground,";

    c.bench_function("locate_exact", |b| {
        b.iter(|| locate_span(excerpt, OCR_PAGE));
    });
}

fn bench_locate_pattern(c: &mut Criterion) {
    let excerpt = "For God's sake, let us sit upon the ground,\nAnd tell sad stories of the death of Kings;";
    let aligner = Aligner::with_config(AlignConfig::default().with_lenient_s(true));

    c.bench_function("locate_pattern", |b| {
        b.iter(|| aligner.locate(excerpt, OCR_PAGE));
    });
}

fn bench_locate_work(c: &mut Criterion) {
    let doc = Document::parse(ART_OF_POETRY).unwrap();
    let pages = TcpPageText::new(&doc);

    c.bench_function("locate_work", |b| {
        b.iter(|| ExcerptLocator::new(&doc, &pages, LocatorConfig::new("A12345")).run());
    });
}

criterion_group!(
    benches,
    // Segmentation
    bench_parse,
    bench_pages,
    // Alignment
    bench_locate_exact,
    bench_locate_pattern,
    bench_locate_work,
);
criterion_main!(benches);
