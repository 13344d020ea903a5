//! Extraction over realistic model answers.
//!
//! No network: every test feeds a saved or hand-written answer straight to
//! the extractor.

use itemlens::{
    extract, Extractor, Field, FixedSimilarity, HeadingSpec, HeadingTable, LinkKind, ResourceKind,
    ResultRecord,
};

const KETTLE: &str = include_str!("fixtures/kettle_answer.txt");

fn pinned() -> Extractor {
    Extractor::builder().sampler(FixedSimilarity(85)).build()
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

// ── Full template answer ─────────────────────────────────────────────────────

#[test]
fn test_full_answer_scalars() {
    let r = pinned().extract(Some(KETTLE));
    assert_eq!(r.name, "Stainless Steel Stovetop Kettle");
    assert_eq!(
        r.description,
        "A polished stainless steel whistling kettle with a black heat-resistant handle.\n\
         It sits on a gas hob and appears to hold around two litres."
    );
    assert_eq!(r.category.as_deref(), Some("Kitchen Appliance"));
    assert_eq!(r.extracted_text.as_deref(), Some("PRIMULA\n2.5 QT"));
    assert_eq!(r.confidence, 95);
}

#[test]
fn test_full_answer_lists() {
    let r = pinned().extract(Some(KETTLE));
    assert_eq!(
        r.technical_details,
        strings(&[
            "Capacity: roughly 2.5 quarts (2.4 L)",
            "Material: 18/8 stainless steel with an aluminium-clad base",
            "Manual: https://example.com/manuals/primula-kettle.pdf",
        ])
    );
    assert_eq!(
        r.usage_applications,
        strings(&[
            "Boiling water for tea, coffee and instant meals",
            "Camping on portable gas stoves",
        ])
    );
    assert_eq!(r.historical_context.as_ref().map(Vec::len), Some(2));
    assert_eq!(r.advantages.as_ref().map(Vec::len), Some(2));
    assert_eq!(r.disadvantages.as_ref().map(Vec::len), Some(2));
    assert_eq!(r.market_information.as_ref().map(Vec::len), Some(1));
    assert_eq!(r.maintenance_care.as_ref().map(Vec::len), Some(2));
    assert_eq!(r.environmental_impact.as_ref().map(Vec::len), Some(1));
    assert_eq!(r.safety_considerations.as_ref().map(Vec::len), Some(2));
    assert_eq!(
        r.expert_tips,
        strings(&["Fill only to the seam line to prevent spitting", "Warm the teapot first"])
    );
}

#[test]
fn test_full_answer_parsed_links_win_over_synthesis() {
    let r = pinned().extract(Some(KETTLE));
    let links = r.product_links.unwrap();
    assert_eq!(
        links,
        vec![
            "https://www.amazon.com/s?k=primula+kettle".to_string(),
            "https://www.primulaproducts.com/kettles".to_string(),
        ]
    );
    assert_eq!(LinkKind::classify(&links[0]), LinkKind::Amazon);
    assert_eq!(LinkKind::classify(&links[1]), LinkKind::External);
}

#[test]
fn test_full_answer_similar_items() {
    let r = pinned().extract(Some(KETTLE));
    let items = r.similar_items.unwrap();
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].name, "Cuisinart Aura Kettle");
    assert_eq!(items[0].price.as_deref(), Some("$34.95"));
    assert_eq!(
        items[0].purchase_url.as_deref(),
        Some("https://www.example.com/cuisinart-aura")
    );
    assert_eq!(items[0].similarity, 91);

    assert_eq!(items[1].price.as_deref(), Some("$29.99"));
    assert_eq!(
        items[1].purchase_url.as_deref(),
        Some("https://www.example.com/oxo-classic")
    );
    assert_eq!(items[1].similarity, 85);

    assert_eq!(items[2].name, "Generic enamel kettle");
    assert!(items[2].price.is_none());
    assert!(items[2].purchase_url.is_none());
}

#[test]
fn test_full_answer_resources() {
    let r = pinned().extract(Some(KETTLE));
    let res = r.educational_resources.unwrap();
    assert_eq!(res.len(), 3);
    assert_eq!(res[0].kind, ResourceKind::Article);
    assert_eq!(res[0].url, "https://example.com/history");
    assert_eq!(res[1].kind, ResourceKind::Video);
    assert_eq!(res[2].kind, ResourceKind::Article);
    assert_eq!(res[2].url, "N/A");
    assert_eq!(res[2].description, "");
}

#[test]
fn test_full_answer_json_is_snake_case() {
    let r = pinned().extract(Some(KETTLE));
    let json = serde_json::to_value(&r).unwrap();
    assert!(json.get("usage_applications").is_some());
    assert!(json.get("similar_items").is_some());
    assert_eq!(json["educational_resources"][1]["type"], "video");
    assert!(json.get("location_suggestions").is_none());

    let back: ResultRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, r);
}

// ── Drift and partial answers ────────────────────────────────────────────────

#[test]
fn test_markdown_drift() {
    let answer = "**Name:** Brass Compass\n\
                  ## Description:\n\
                  A pocket compass with a hinged lid.\n\
                  \n\
                  **Advantages**:\n\
                  * Needs no batteries\n\
                  * Waterproof\n\
                  \n\
                  Similar Products:\n\
                  - Silva Ranger | £45 | 88%\n";
    let r = pinned().extract(Some(answer));
    assert_eq!(r.name, "Brass Compass");
    assert_eq!(r.description, "A pocket compass with a hinged lid.");
    assert_eq!(r.advantages, strings(&["Needs no batteries", "Waterproof"]));
    let item = &r.similar_items.unwrap()[0];
    assert_eq!(item.price.as_deref(), Some("£45"));
    assert_eq!(item.similarity, 88);
}

#[test]
fn test_decimal_similarity_is_not_read_from_fraction() {
    let r = Extractor::builder()
        .sampler(FixedSimilarity(88))
        .build()
        .extract(Some(
            "Similar Items:\n- Widget A | $19.99 | https://example.com/a | 92.5%\n",
        ));
    assert_eq!(r.similar_items.unwrap()[0].similarity, 92);
}

#[test]
fn test_truncated_answer_keeps_what_arrived() {
    let cut = &KETTLE[..KETTLE.find("Disadvantages:").unwrap() + "Disadvantages:\n- Handle".len()];
    let r = pinned().extract(Some(cut));
    assert_eq!(r.disadvantages, strings(&["Handle"]));
    assert!(r.expert_tips.is_none());
    assert!(r.similar_items.is_none());
    assert_eq!(r.educational_resources.map(|v| v.len()), Some(3));
}

#[test]
fn test_name_only_answer() {
    let r = pinned().extract(Some("Name: Fern"));
    assert_eq!(r.name, "Fern");
    assert_eq!(r.description, "No description available");
    assert_eq!(r.product_links.map(|l| l.len()), Some(5));
    assert_eq!(r.educational_resources.map(|r| r.len()), Some(3));
    assert!(r.advantages.is_none());
}

#[test]
fn test_prose_only_answer() {
    let r = pinned().extract(Some("I'm sorry, I can't identify this image clearly."));
    assert_eq!(r.name, "Unknown Item");
    assert!(r.product_links.is_none());
    assert_eq!(r.confidence, 95);
}

#[test]
fn test_free_function_defaults() {
    assert_eq!(extract(None), ResultRecord::default());
    assert_eq!(extract(Some("")), ResultRecord::default());
}

#[test]
fn test_idempotent_apart_from_sampling() {
    let a = pinned().extract(Some(KETTLE));
    let b = pinned().extract(Some(KETTLE));
    assert_eq!(a, b);

    let mut x = Extractor::default().extract(Some(KETTLE));
    let mut y = Extractor::default().extract(Some(KETTLE));
    for r in [&mut x, &mut y] {
        for item in r.similar_items.iter_mut().flatten() {
            assert!((80..=100).contains(&item.similarity));
            item.similarity = 0;
        }
    }
    assert_eq!(x, y);
}

#[test]
fn test_pathological_input_terminates() {
    let noisy = format!(
        "{}\n{}\n{}",
        ":".repeat(10_000),
        "- | | | |".repeat(2_000),
        "Name:".repeat(5_000)
    );
    let r = Extractor::default().extract(Some(&noisy));
    assert!(r.confidence <= 100);
}

// ── Heading table as data ────────────────────────────────────────────────────

#[test]
fn test_heading_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headings.json");
    let table = HeadingTable::default()
        .with_entry(HeadingSpec::new(
            Field::UsageApplications,
            &["Usage & Applications", "Uses"],
        ))
        .unwrap();
    std::fs::write(&path, table.to_json().unwrap()).unwrap();

    let loaded = HeadingTable::from_json_file(&path).unwrap();
    let r = Extractor::builder()
        .headings(loaded)
        .build()
        .extract(Some("Name: Trowel\n\nUses:\n- Planting bulbs\n"));
    assert_eq!(r.usage_applications, strings(&["Planting bulbs"]));
}

#[test]
fn test_table_without_a_row_ignores_that_section() {
    let table = HeadingTable::new(1, vec![HeadingSpec::new(Field::Name, &["Name"])]).unwrap();
    let r = Extractor::builder()
        .headings(table)
        .build()
        .extract(Some(KETTLE));
    assert_eq!(r.name, "Stainless Steel Stovetop Kettle");
    assert!(r.category.is_none());
    assert!(r.similar_items.is_none());
}
