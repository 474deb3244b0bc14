/*!
 * Tests for page processing and the section state machine
 */

use std::sync::Arc;
use layoutlingo::layout::RegionLabel;
use layoutlingo::pipeline::{PageProcessor, PipelineState, SectionState};
use layoutlingo::providers::mock::{MockDetector, MockOcr, MockTranslator};
use crate::common::{self, PageBuilder, WHITE};

const MARKER: [u8; 3] = [1, 0, 0];
const RED: [u8; 3] = [200, 40, 40];
const GREEN: [u8; 3] = [40, 160, 40];
const BLUE: [u8; 3] = [40, 40, 200];

const UPPER_TEXT: [u32; 4] = [100, 100, 700, 300];
const HEADING: [u32; 4] = [100, 400, 700, 440];
const LOWER_TEXT: [u32; 4] = [100, 500, 700, 700];

fn ocr_with_heading(heading: &str) -> MockOcr {
    MockOcr::new()
        .with_region(RED, &["Upper paragraph, first line.", "Upper paragraph, second line."])
        .with_region(GREEN, &["Lower paragraph, first line.", "Lower paragraph, second line."])
        .with_region(BLUE, &[heading])
}

fn two_paragraph_page() -> image::RgbImage {
    PageBuilder::new(MARKER)
        .block(UPPER_TEXT, RED)
        .block(HEADING, BLUE)
        .block(LOWER_TEXT, GREEN)
        .build()
}

fn regions() -> Vec<layoutlingo::layout::Region> {
    vec![
        common::region(UPPER_TEXT, RegionLabel::Text, 0),
        common::region(HEADING, RegionLabel::Title, 1),
        common::region(LOWER_TEXT, RegionLabel::Text, 2),
    ]
}

#[tokio::test]
async fn test_process_withOrdinaryHeading_shouldTranslateEverythingAndKeepScanning() {
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        Arc::new(ocr_with_heading("Introduction")),
        translator.clone(),
        "fr",
    );
    let page = common::page(0, two_paragraph_page());

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), PipelineState::default()).await;

    assert_eq!(outcome.state.section, SectionState::Scanning);
    assert_eq!(outcome.report.translated, 2);
    assert_eq!(translator.calls(), 2);
    assert_eq!(common::pixel(&outcome.image, 650, 290), WHITE);
    assert_eq!(common::pixel(&outcome.image, 650, 690), WHITE);
    // Titles are never repainted
    assert_eq!(common::pixel(&outcome.image, 400, 420), BLUE);
}

#[tokio::test]
async fn test_process_withReferencesHeading_shouldStopAfterIt() {
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        Arc::new(ocr_with_heading("References")),
        translator.clone(),
        "fr",
    );
    let page = common::page(0, two_paragraph_page());

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), PipelineState::default()).await;

    assert_eq!(outcome.state.section, SectionState::ReferencesReached);
    assert_eq!(outcome.report.translated, 1);
    assert_eq!(outcome.report.after_cutoff, 1);
    assert_eq!(translator.calls(), 1);
    assert_eq!(common::pixel(&outcome.image, 650, 290), WHITE);
    assert_eq!(common::pixel(&outcome.image, 650, 690), GREEN);
}

#[tokio::test]
async fn test_process_afterReferences_shouldLeavePageUntouched() {
    let ocr = Arc::new(ocr_with_heading("Introduction"));
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr.clone(), translator.clone(), "fr");
    let page = common::page(3, two_paragraph_page());
    let state = PipelineState { section: SectionState::ReferencesReached };

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), state).await;

    assert_eq!(outcome.state, state);
    assert_eq!(outcome.image, page.image);
    assert_eq!(ocr.calls(), 0);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_process_withAbstractHeading_shouldRestoreBandAboveIt() {
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        Arc::new(ocr_with_heading("Abstract")),
        translator.clone(),
        "fr",
    );
    let page = common::page(0, two_paragraph_page());

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), PipelineState::default()).await;

    assert_eq!(outcome.state.section, SectionState::Scanning);
    assert_eq!(translator.calls(), 2);
    // The title block above the abstract heading is the original
    assert_eq!(common::pixel(&outcome.image, 650, 290), RED);
    assert_eq!(common::pixel(&outcome.image, 650, 690), WHITE);
}

#[tokio::test]
async fn test_process_withLowConfidenceRegion_shouldIgnoreIt() {
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        Arc::new(ocr_with_heading("Introduction")),
        translator.clone(),
        "fr",
    );
    let page = common::page(0, two_paragraph_page());
    let mut regions = regions();
    regions[2].confidence = 0.5;

    let outcome = PageProcessor::new(&ctx).process(&page, &regions, PipelineState::default()).await;

    assert_eq!(outcome.report.translated, 1);
    assert_eq!(common::pixel(&outcome.image, 650, 690), GREEN);
}

#[tokio::test]
async fn test_process_withFailingRegion_shouldRecordIssueAndContinue() {
    let ocr = MockOcr::new()
        .failing_on(RED)
        .with_region(GREEN, &["Lower paragraph, first line.", "Lower paragraph, second line."])
        .with_region(BLUE, &["Method"]);
    let ctx = common::context(
        Arc::new(MockDetector::new()),
        Arc::new(ocr),
        Arc::new(MockTranslator::working()),
        "fr",
    );
    let page = common::page(0, two_paragraph_page());

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), PipelineState::default()).await;

    assert_eq!(outcome.report.failed, 1);
    assert_eq!(outcome.report.translated, 1);
    assert_eq!(outcome.report.issues.len(), 1);
    assert!(outcome.report.issues[0].starts_with("text region 0"));
    assert_eq!(common::pixel(&outcome.image, 650, 290), RED);
}

#[tokio::test]
async fn test_detect_withFailingBatch_shouldFallBackToSinglePages() {
    let other_marker = [2, 0, 0];
    let detector = Arc::new(
        MockDetector::new()
            .with_page(MARKER, vec![common::text(UPPER_TEXT), common::title(HEADING)])
            .failing_on(other_marker),
    );
    let ctx = common::context(
        detector.clone(),
        Arc::new(MockOcr::new()),
        Arc::new(MockTranslator::working()),
        "fr",
    );
    let first = common::page(0, two_paragraph_page());
    let second = common::page(1, PageBuilder::new(other_marker).build());

    let results = PageProcessor::new(&ctx).detect(&[&first, &second]).await;

    assert_eq!(results.len(), 2);
    let regions = results[0].as_ref().unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].label, RegionLabel::Text);
    assert_eq!(regions[1].label, RegionLabel::Title);
    assert_eq!(regions[1].order, 1);
    assert!(results[1].is_err());
    assert_eq!(detector.batch_calls(), 1);
    assert_eq!(detector.single_calls(), 2);
}

#[tokio::test]
async fn test_detect_withHealthyBatch_shouldUseOneCall() {
    let detector = Arc::new(MockDetector::new().with_page(MARKER, vec![common::text(UPPER_TEXT)]));
    let ctx = common::context(
        detector.clone(),
        Arc::new(MockOcr::new()),
        Arc::new(MockTranslator::working()),
        "fr",
    );
    let pages: Vec<_> = (0..3).map(|i| common::page(i, two_paragraph_page())).collect();
    let refs: Vec<_> = pages.iter().collect();

    let results = PageProcessor::new(&ctx).detect(&refs).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|regions| regions.len() == 1)));
    assert_eq!(detector.batch_calls(), 1);
    assert_eq!(detector.single_calls(), 0);
}

#[tokio::test]
async fn test_process_withPreservedRegions_shouldNeverOcrOrTranslateThem() {
    let ocr = Arc::new(
        MockOcr::new()
            .with_region(RED, &["Figure 1: attention weights", "for each head."])
            .with_region(BLUE, &["- first item of the list", "- second item of the list"])
            .with_region(GREEN, &["Model | BLEU", "Base | 27.3"]),
    );
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), ocr.clone(), translator.clone(), "fr");
    let page = common::page(0, two_paragraph_page());
    let regions = vec![
        common::region(UPPER_TEXT, RegionLabel::Figure, 0),
        common::region(HEADING, RegionLabel::List, 1),
        common::region(LOWER_TEXT, RegionLabel::Table, 2),
    ];

    let outcome = PageProcessor::new(&ctx).process(&page, &regions, PipelineState::default()).await;

    assert_eq!(outcome.report.preserved, 3);
    assert_eq!(outcome.report.translated, 0);
    assert_eq!(outcome.report.skipped, 0);
    assert_eq!(ocr.calls(), 0);
    assert_eq!(translator.calls(), 0);
    assert_eq!(outcome.image, page.image);
}

#[tokio::test]
async fn test_process_withFailingTitleOcr_shouldRecordIssueAndStillTranslate() {
    let ocr = MockOcr::new()
        .with_region(RED, &["Upper paragraph, first line.", "Upper paragraph, second line."])
        .with_region(GREEN, &["Lower paragraph, first line.", "Lower paragraph, second line."])
        .failing_on(BLUE);
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), Arc::new(ocr), translator.clone(), "fr");
    let page = common::page(0, two_paragraph_page());

    let outcome = PageProcessor::new(&ctx).process(&page, &regions(), PipelineState::default()).await;

    assert_eq!(outcome.state.section, SectionState::Scanning);
    assert_eq!(outcome.report.failed, 1);
    assert_eq!(outcome.report.issues.len(), 1);
    assert!(outcome.report.issues[0].starts_with("title region 1"));
    assert_eq!(outcome.report.translated, 2);
    assert_eq!(translator.calls(), 2);
    assert_eq!(common::pixel(&outcome.image, 650, 290), WHITE);
    assert_eq!(common::pixel(&outcome.image, 650, 690), WHITE);
}

#[tokio::test]
async fn test_process_withAbstractThenReferences_shouldRestoreBandAndStop() {
    const YELLOW: [u8; 3] = [200, 200, 40];
    const ABSTRACT_HEADING: [u32; 4] = [100, 320, 700, 360];
    let ocr = ocr_with_heading("References").with_region(YELLOW, &["Abstract"]);
    let translator = Arc::new(MockTranslator::working());
    let ctx = common::context(Arc::new(MockDetector::new()), Arc::new(ocr), translator.clone(), "fr");
    let image = PageBuilder::new(MARKER)
        .block(UPPER_TEXT, RED)
        .block(ABSTRACT_HEADING, YELLOW)
        .block(HEADING, BLUE)
        .block(LOWER_TEXT, GREEN)
        .build();
    let page = common::page(0, image);
    let regions = vec![
        common::region(UPPER_TEXT, RegionLabel::Text, 0),
        common::region(ABSTRACT_HEADING, RegionLabel::Title, 1),
        common::region(HEADING, RegionLabel::Title, 2),
        common::region(LOWER_TEXT, RegionLabel::Text, 3),
    ];

    let outcome = PageProcessor::new(&ctx).process(&page, &regions, PipelineState::default()).await;

    assert_eq!(outcome.state.section, SectionState::ReferencesReached);
    assert_eq!(outcome.report.translated, 1);
    assert_eq!(outcome.report.after_cutoff, 1);
    assert_eq!(translator.calls(), 1);
    // Band above the abstract heading is restored over the translated paragraph
    assert_eq!(common::pixel(&outcome.image, 650, 290), RED);
    assert_eq!(common::pixel(&outcome.image, 400, 340), YELLOW);
    assert_eq!(common::pixel(&outcome.image, 650, 690), GREEN);
}
