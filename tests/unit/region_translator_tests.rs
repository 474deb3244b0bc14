/*!
 * Tests for the translation of a single text region
 */

use std::sync::Arc;
use layoutlingo::errors::{RegionError, SkipReason};
use layoutlingo::layout::{BoundingBox, RegionLabel};
use layoutlingo::pipeline::{RegionOutcome, RegionTranslator};
use layoutlingo::providers::mock::{MockDetector, MockOcr, MockTranslator};
use crate::common::{self, PageBuilder, WHITE};

const RED: [u8; 3] = [200, 40, 40];
const TEXT_BOX: [u32; 4] = [100, 100, 700, 300];
const BLACK: [u8; 3] = [0, 0, 0];

fn page_with_text_block() -> image::RgbImage {
    PageBuilder::new([1, 0, 0]).block(TEXT_BOX, RED).build()
}

#[tokio::test]
async fn test_process_withTwoLines_shouldRepaintExpandedBox() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["First line of text.", "Second line."]));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    let RegionOutcome::Repainted(repainted) = outcome else {
        panic!("region should be repainted");
    };
    assert_eq!(repainted.bounds, BoundingBox::new(80, 90, 720, 310));
    assert_eq!(repainted.image.dimensions(), (640, 220));
    assert!(!repainted.used_source_text);
    assert_eq!(translator.received(), vec!["First line of text. Second line.".to_string()]);
    assert_eq!(common::pixel(&repainted.image, 0, 0), BLACK);
    assert_eq!(common::pixel(&repainted.image, 630, 210), WHITE);
}

#[tokio::test]
async fn test_process_withSingleLine_shouldSkipWithoutTranslating() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["Figure 3"]));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Skipped(SkipReason::TooFewLines(1))));
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_process_withUrlChunk_shouldKeepItVerbatim() {
    let ocr = Arc::new(MockOcr::new().with_region(
        RED,
        &["Code is available at https://example.org/code", "under the MIT license."],
    ));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Repainted(ref r) if !r.used_source_text));
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_translate_text_withUrlInOneChunk_shouldTranslateTheOthers() {
    let body = "The model is trained on a large corpus of scientific text. ".repeat(9);
    let link = "Code and data are at https://example.org/paper for reuse.";
    let ocr = Arc::new(MockOcr::new().with_region(RED, &[body.as_str(), link]));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);
    let region_translator = RegionTranslator::new(&ctx);

    let unit = region_translator.extract(&region, &page_with_text_block()).await.unwrap().unwrap();
    let translated = region_translator.translate_text(&unit).await.unwrap();

    assert!(unit.contains_url);
    assert!(translator.calls() >= 1);
    assert!(translator.received().iter().all(|chunk| !chunk.contains("http")));
    assert!(translated.starts_with("TR:The model"));
    assert!(translated.contains("https:  example.org paper"));
}

#[tokio::test]
async fn test_translate_text_withoutUrl_shouldTranslateEveryChunk() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["No links in here.", "Just plain prose."]));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);
    let region_translator = RegionTranslator::new(&ctx);

    let unit = region_translator.extract(&region, &page_with_text_block()).await.unwrap().unwrap();
    let translated = region_translator.translate_text(&unit).await.unwrap();

    assert!(!unit.contains_url);
    assert_eq!(translator.calls(), 1);
    assert_eq!(translated, "TR:No links in here. Just plain prose.");
}

#[tokio::test]
async fn test_translate_text_withLongText_shouldSendBoundedChunksInOrder() {
    let sentence = "The model is trained on a large corpus of scientific text. ";
    let first = sentence.repeat(6);
    let second = sentence.repeat(6);
    let ocr = Arc::new(MockOcr::new().with_region(RED, &[first.as_str(), second.as_str()]));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr, translator.clone(), "fr");
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);
    let region_translator = RegionTranslator::new(&ctx);

    let unit = region_translator.extract(&region, &page_with_text_block()).await.unwrap().unwrap();
    let translated = region_translator.translate_text(&unit).await.unwrap();

    let received = translator.received();
    assert!(received.len() > 1);
    assert!(received.iter().all(|chunk| chunk.chars().count() < 450));
    assert_eq!(received.concat().split_whitespace().collect::<Vec<_>>(), unit.text.split_whitespace().collect::<Vec<_>>());
    assert!(translated.starts_with("TR:The model"));
}

#[tokio::test]
async fn test_extract_shouldReplaceTableAndCitationNoise() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["Results | see", "Table [1]"]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::working()),
        "fr",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let unit = RegionTranslator::new(&ctx)
        .extract(&region, &page_with_text_block())
        .await
        .unwrap()
        .unwrap();

    assert!(!unit.text.contains('|'));
    assert!(!unit.text.contains('['));
    assert!(!unit.contains_url);
    assert_eq!(unit.text.split_whitespace().collect::<Vec<_>>(), vec!["Results", "see", "Table", "1"]);
}

#[tokio::test]
async fn test_process_withDegenerateTranslation_shouldDrawSourceText() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["A normal sentence.", "Another one."]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::degenerate()),
        "fr",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Repainted(ref r) if r.used_source_text));
}

#[tokio::test]
async fn test_process_withLatinOutputForJapanese_shouldSkipRegion() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["A normal sentence.", "Another one."]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::working()),
        "ja",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Skipped(SkipReason::ScriptMismatch)));
}

#[tokio::test]
async fn test_process_withJapaneseOutput_shouldRepaint() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["A normal sentence.", "Another one."]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::custom(|_| "これは普通の文です。もう一つの文です。".to_string())),
        "ja",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Repainted(ref r) if !r.used_source_text));
}

#[tokio::test]
async fn test_process_withOnlyEngineBoilerplate_shouldSkipAsEmpty() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["A normal sentence.", "Another one."]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::custom(|_| "「この版は翻訳です」".to_string())),
        "ja",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let outcome = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Skipped(SkipReason::EmptyTranslation)));
}

#[tokio::test]
async fn test_process_withFailingOcr_shouldReturnOcrError() {
    let ocr = Arc::new(MockOcr::new().failing_on(RED));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::working()),
        "fr",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let result = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await;

    assert!(matches!(result, Err(RegionError::Ocr(_))));
}

#[tokio::test]
async fn test_process_withFailingTranslator_shouldReturnTranslationError() {
    let ocr = Arc::new(MockOcr::new().with_region(RED, &["A normal sentence.", "Another one."]));
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        ocr,
        Arc::new(MockTranslator::failing()),
        "fr",
    );
    let region = common::region(TEXT_BOX, RegionLabel::Text, 0);

    let result = RegionTranslator::new(&ctx).process(&region, &page_with_text_block()).await;

    assert!(matches!(result, Err(RegionError::Translation(_))));
}
