//! Tutoring system prompt
//!
//! The base instruction sent with every chat turn, plus the rendering of the
//! student's selected preferences.

use crate::preferences::PreferenceSelection;

/// Fixed base instruction for tutoring answers
pub const BASE_TUTOR_PROMPT: &str = "You are an expert math tutor called the Personalized Math Explainer. \
Your student is a first-year BCA student interested in Data Science. \
Your goal is to give a detailed, academic explanation of the math concept requested. \
Structure the response with Markdown headings (for example '## Explanation' and '## Formulas/Calculations'). \
Ground the explanation in the attached syllabus and pitch it at a college student's level. \
If the syllabus lacks a detail (such as merits or demerits), fall back on general mathematical knowledge for the topic, \
but always prefer the syllabus content. \
Include the following sections where they apply to the topic: \
1. **Explanation:** a detailed, conceptual overview. \
2. **Formulas/Calculations:** the core equations and a worked example where possible. \
**Write all math in LaTeX (inline: $...$, display: $$...$$).** \
3. **Applications (Data Science Focus):** how the concept is used in programming or data science. \
4. **Merits and Demerits/Caveats:** the advantages and limitations of the concept. \
If the syllabus does not cover the question at all, say that you cannot find the information in the syllabus.";

/// Header placed before the preference lines
pub const PREFERENCES_HEADER: &str = "ADDITIONAL USER PREFERENCES:";

/// Builds the system instruction for a chat turn
///
/// # Arguments
///
/// * `preferences` - The student's active preferences, in selection order
///
/// # Returns
///
/// The base prompt alone when nothing is selected; otherwise the base prompt,
/// a blank line, [`PREFERENCES_HEADER`] and one `- fragment` line per
/// preference.
///
/// # Examples
///
/// ```
/// use syllabus_tutor::preferences::{Preference, PreferenceSelection};
/// use syllabus_tutor::prompts::tutor_prompt::{build_tutor_instruction, BASE_TUTOR_PROMPT};
///
/// assert_eq!(build_tutor_instruction(&PreferenceSelection::new()), BASE_TUTOR_PROMPT);
///
/// let mut selection = PreferenceSelection::new();
/// selection.add(Preference::SimpleLanguage).unwrap();
/// let instruction = build_tutor_instruction(&selection);
/// assert!(instruction.ends_with("- Always use simple, easy-to-understand language without complex jargon."));
/// ```
pub fn build_tutor_instruction(preferences: &PreferenceSelection) -> String {
    if preferences.is_empty() {
        return BASE_TUTOR_PROMPT.to_string();
    }

    let lines = preferences
        .iter()
        .map(|p| format!("- {}", p.instruction()))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n{}\n{}", BASE_TUTOR_PROMPT, PREFERENCES_HEADER, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::Preference;

    #[test]
    fn test_no_preferences_is_base_prompt() {
        let instruction = build_tutor_instruction(&PreferenceSelection::new());
        assert_eq!(instruction, BASE_TUTOR_PROMPT);
        assert!(!instruction.contains(PREFERENCES_HEADER));
    }

    #[test]
    fn test_preferences_appended_in_selection_order() {
        let mut selection = PreferenceSelection::new();
        selection.add(Preference::DataScience).unwrap();
        selection.add(Preference::StepByStep).unwrap();

        let instruction = build_tutor_instruction(&selection);
        let suffix = instruction.strip_prefix(BASE_TUTOR_PROMPT).unwrap();
        assert_eq!(
            suffix,
            "\n\nADDITIONAL USER PREFERENCES:\n\
             - Always relate concepts to data science and machine learning applications.\n\
             - Break down explanations into very detailed step-by-step instructions."
        );
    }

    #[test]
    fn test_base_prompt_mentions_latex_and_syllabus() {
        assert!(BASE_TUTOR_PROMPT.contains("LaTeX"));
        assert!(BASE_TUTOR_PROMPT.contains("syllabus"));
    }
}
