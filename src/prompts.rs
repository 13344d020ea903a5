//! Prompts sent to the vision model.
//!
//! The analysis prompt and [`crate::HeadingTable::default()`] describe the
//! same template from two sides: one asks the model for the sections, the
//! other recognises them. A unit test below keeps them in step.
//!
//! Callers can override the prompt via
//! [`crate::config::AnalysisConfig::system_prompt`]; the constant here is used
//! only when no override is provided. An override that renames sections
//! needs a matching heading table.

/// Default analysis prompt. Every heading below is recognised by the
/// default heading table.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r#"Analyze this image in detail and provide comprehensive information about what you see, including any text content. Format your response exactly like this, maintaining the exact structure:

Name: [Product/item name]
Description: [2-3 sentences describing what you see]
Category: [Main category]

Extracted Text:
[List any text found in the image]

Historical Context:
- [Key historical point 1]
- [Key historical point 2]
- [Key historical point 3]

Technical Details:
- [Specification 1]
- [Specification 2]
- [Specification 3]

Advantages:
- [Advantage 1]
- [Advantage 2]
- [Advantage 3]

Disadvantages:
- [Disadvantage 1]
- [Disadvantage 2]
- [Disadvantage 3]

Usage & Applications:
- [Usage 1]
- [Usage 2]
- [Usage 3]

Market Information:
- [Typical price range or availability]
- [Notable brands or sellers]

Product Links:
- [Purchase or reference URL]
- [Purchase or reference URL]

Maintenance & Care:
- [Care instruction 1]
- [Care instruction 2]

Environmental Impact:
- [Environmental consideration 1]
- [Environmental consideration 2]

Safety Considerations:
- [Safety point 1]
- [Safety point 2]

Expert Tips:
- [Expert tip 1]
- [Expert tip 2]
- [Expert tip 3]

Similar Items:
- [Similar product name] | [Price] | [Purchase URL] | [Similarity percentage]
- [Similar product name] | [Price] | [Purchase URL] | [Similarity percentage]
- [Similar product name] | [Price] | [Purchase URL] | [Similarity percentage]

Educational Resources:
- [Resource Title] | [Type: article/book/video/course] | [URL] | [Brief description]
- [Resource Title] | [Type: article/book/video/course] | [URL] | [Brief description]
- [Resource Title] | [Type: article/book/video/course] | [URL] | [Brief description]

Be specific and detailed in your analysis, especially regarding any text content found in the image."#;

/// Context part carrying the OCR pre-pass text to the model.
pub fn ocr_context(extracted_text: &str) -> String {
    format!("Additional context - Extracted text from image: {extracted_text}")
}
