//! Benchmark the open-and-analyze pipeline on a dense synthetic page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream, dictionary};
use textpage::Document;

/// A page filled with a grid of short words.
fn dense_page_pdf(rows: usize, cols: usize) -> Vec<u8> {
    let mut content = String::from("BT /F1 10 Tf ");
    for row in 0..rows {
        let y = 760 - row * 14;
        for col in 0..cols {
            let x = 40 + col * 55;
            content.push_str(&format!("1 0 0 1 {x} {y} Tm (word{col}) Tj "));
        }
    }
    content.push_str("ET");

    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save bench PDF");
    buf
}

fn bench_open(c: &mut Criterion) {
    let bytes = dense_page_pdf(50, 10);
    c.bench_function("open_dense_page", |b| {
        b.iter(|| {
            let doc = Document::open(black_box(&bytes), None).unwrap();
            black_box(doc.page_text(false, 0));
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let bytes = dense_page_pdf(50, 10);
    let mut doc = Document::open(&bytes, None).unwrap();
    c.bench_function("search_dense_page", |b| {
        b.iter(|| {
            let hits = doc.search(black_box("word5"), true, 0);
            black_box(hits.len());
        })
    });
}

criterion_group!(benches, bench_open, bench_search);
criterion_main!(benches);
