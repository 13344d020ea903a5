//! End-to-end tests against the live Gemini and Cloud Vision APIs.
//!
//! Gated behind `E2E_ENABLED` and `GEMINI_API_KEY` so they never run in CI
//! unless explicitly requested. Photos placed in `./test_cases/` are picked
//! up by the photo tests; the rest use an embedded 1x1 PNG.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_analyze_photo -- --nocapture

use itemlens::{analyze, AnalysisConfig, Extractor, ImageInput, ItemLensError, ResultRecord};
use std::path::PathBuf;

/// A valid 1x1 transparent PNG.
const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = test_cases_dir().join("output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip unless E2E_ENABLED and GEMINI_API_KEY are set; yields the key.
/// With a path argument, also skip when that file is missing.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_tracing();
        match std::env::var("GEMINI_API_KEY") {
            Ok(k) if !k.trim().is_empty() => k,
            _ => {
                println!("SKIP: GEMINI_API_KEY is not set");
                return;
            }
        }
    }};
    ($path:expr) => {{
        let key = e2e_skip_unless_ready!();
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test image not found: {}", p.display());
            return;
        }
        (key, p)
    }};
}

/// Invariants every record must satisfy, whatever the model said.
fn assert_record_shape(r: &ResultRecord, context: &str) {
    assert!(!r.name.trim().is_empty(), "[{context}] name is empty");
    assert!(
        !r.description.trim().is_empty(),
        "[{context}] description is empty"
    );
    assert!(r.confidence <= 100, "[{context}] confidence out of range");

    let lists = [
        &r.historical_context,
        &r.technical_details,
        &r.advantages,
        &r.disadvantages,
        &r.usage_applications,
        &r.market_information,
        &r.maintenance_care,
        &r.environmental_impact,
        &r.safety_considerations,
        &r.expert_tips,
        &r.product_links,
    ];
    for list in lists.into_iter().flatten() {
        assert!(!list.is_empty(), "[{context}] present list is empty");
        assert!(
            list.iter().all(|s| !s.trim().is_empty()),
            "[{context}] list holds a blank entry"
        );
    }
    for item in r.similar_items.iter().flatten() {
        assert!(!item.name.is_empty(), "[{context}] similar item without name");
        assert!(item.similarity <= 100, "[{context}] similarity out of range");
    }
    for link in r.product_links.iter().flatten() {
        assert!(
            link.starts_with("http://") || link.starts_with("https://"),
            "[{context}] product link is not a URL: {link}"
        );
    }
}

/// Route library logs to the test output; `RUST_LOG=itemlens=debug` for more.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("itemlens=info")),
        )
        .with_test_writer()
        .try_init();
}

fn config(key: &str) -> AnalysisConfig {
    AnalysisConfig::builder()
        .api_key(key)
        .max_retries(2)
        .build()
        .expect("valid config")
}

// ── Live analysis ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_tiny_png() {
    let key = e2e_skip_unless_ready!();
    let image = ImageInput::resolve(TINY_PNG).expect("embedded PNG decodes");

    let out = analyze(&image, &config(&key), &Extractor::default())
        .await
        .expect("analysis should succeed");

    assert_record_shape(&out.record, "tiny_png");
    assert!(!out.raw_text.trim().is_empty());
    assert!(out.stats.duration_ms > 0);
    println!("[tiny_png] {} ({:?} tokens out)", out.record.name, out.stats.output_tokens);
}

#[tokio::test]
async fn test_analyze_tiny_png_with_ocr() {
    let key = e2e_skip_unless_ready!();
    let image = ImageInput::resolve(TINY_PNG).expect("embedded PNG decodes");
    let config = AnalysisConfig::builder()
        .api_key(key)
        .ocr(true)
        .build()
        .expect("valid config");

    // A key without Cloud Vision enabled must still produce a record.
    let out = analyze(&image, &config, &Extractor::default())
        .await
        .expect("analysis should succeed even if OCR is unavailable");
    assert_record_shape(&out.record, "tiny_png_ocr");
}

#[tokio::test]
async fn test_analyze_photo() {
    let (key, path) = e2e_skip_unless_ready!(test_cases_dir().join("kettle.jpg"));
    let image = ImageInput::from_path(&path).expect("photo loads");

    let out = analyze(&image, &config(&key), &Extractor::builder().seed(1).build())
        .await
        .expect("analysis should succeed");

    assert_record_shape(&out.record, "kettle");
    assert!(out.record.has_name(), "a clear photo should be named");
    assert!(
        out.record.product_links.is_some(),
        "named item should carry links"
    );

    let json = serde_json::to_string_pretty(&out.record).expect("serialisable");
    let out_path = output_dir().join("kettle.json");
    std::fs::write(&out_path, &json).ok();
    println!("[kettle] Saved to {}", out_path.display());
    println!("--- BEGIN ANSWER ---\n{}\n--- END ANSWER ---", out.raw_text);
}

#[tokio::test]
async fn test_bad_key_is_upstream_status() {
    let _ = e2e_skip_unless_ready!();
    let image = ImageInput::resolve(TINY_PNG).expect("embedded PNG decodes");

    let err = analyze(&image, &config("not-a-real-key"), &Extractor::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ItemLensError::UpstreamStatus { status: 400 | 401 | 403, .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_unknown_model_is_upstream_status() {
    let key = e2e_skip_unless_ready!();
    let image = ImageInput::resolve(TINY_PNG).expect("embedded PNG decodes");
    let config = AnalysisConfig::builder()
        .api_key(key)
        .model("no-such-model-xyz")
        .build()
        .expect("valid config");

    let err = analyze(&image, &config, &Extractor::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ItemLensError::UpstreamStatus { status: 404, .. }),
        "unexpected error: {err}"
    );
}
