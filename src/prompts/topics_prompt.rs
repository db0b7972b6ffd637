//! Topic extraction prompt
//!
//! Instructs the model to read the syllabus (typed, scanned or handwritten)
//! and return its headings as a fixed JSON shape.

/// Instruction sent with the syllabus to obtain a topic outline
pub const TOPIC_EXTRACTION_PROMPT: &str = r#"You are reading a course syllabus. It may be typed, scanned, photographed or handwritten.

Identify the course's topics and sub-topics:
- A TOPIC is a main heading: a unit or module title, a numbered chapter, or a line written larger, bolder or underlined.
- A SUB-TOPIC is a concept listed under a topic: an indented line, a bullet, a comma-separated item, or a numbered item inside a unit.
- Keep the order in which they appear in the document.
- Use the wording of the document. Fix obvious handwriting or OCR mistakes, but do not invent topics.

IGNORE:
- page numbers, headers and footers
- dates, hours, credits, marks and lecture counts
- equations, formulas and worked examples
- reference books, authors and publishers

OUTPUT CONTRACT:
Return ONLY a JSON object, with no commentary, in exactly this shape:
{"topics": [{"topic": "Topic name", "subtopics": ["Sub-topic one", "Sub-topic two"]}]}
If a topic has no sub-topics, use an empty list. If nothing can be found, return {"topics": []}."#;
