//! Build throwaway PDFs on disk for CLI tests.

use std::path::PathBuf;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Write a single-page PDF with the given content stream into a temp
/// directory, returning its path. The caller's test name keeps paths
/// unique.
pub fn write_pdf(test_name: &str, content: &str) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.as_bytes().to_vec(),
    ));
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

    let path = std::env::temp_dir().join(format!("textpage-cli-{test_name}.pdf"));
    doc.save(&path).expect("failed to write test PDF");
    path
}
