//! Student preference catalog and selection
//!
//! Each preference maps to one instruction fragment appended to the tutoring
//! system prompt. At most [`MAX_PREFERENCES`] may be active at once.

use crate::error::TutorError;
use std::fmt;

/// Maximum number of simultaneously active preferences
pub const MAX_PREFERENCES: usize = 3;

/// A personalization option from the fixed catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    SimpleLanguage,
    RealWorldExamples,
    CodingApplications,
    StepByStep,
    VisualExplanations,
    DataScience,
}

impl Preference {
    /// Every catalog entry, in display order
    pub const ALL: [Preference; 6] = [
        Self::SimpleLanguage,
        Self::RealWorldExamples,
        Self::CodingApplications,
        Self::StepByStep,
        Self::VisualExplanations,
        Self::DataScience,
    ];

    /// Short tag used on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Self::SimpleLanguage => "simple-language",
            Self::RealWorldExamples => "real-world-examples",
            Self::CodingApplications => "coding-applications",
            Self::StepByStep => "step-by-step",
            Self::VisualExplanations => "visual",
            Self::DataScience => "data-science",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SimpleLanguage => "Use simple language",
            Self::RealWorldExamples => "Include real-world examples",
            Self::CodingApplications => "Focus on coding applications",
            Self::StepByStep => "Step-by-step breakdown",
            Self::VisualExplanations => "Visual explanations",
            Self::DataScience => "Connect to Data Science",
        }
    }

    /// Instruction fragment appended to the system prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::SimpleLanguage => {
                "Always use simple, easy-to-understand language without complex jargon."
            }
            Self::RealWorldExamples => "Always provide real-world examples and practical scenarios.",
            Self::CodingApplications => {
                "Emphasize how to implement concepts in Python or programming."
            }
            Self::StepByStep => {
                "Break down explanations into very detailed step-by-step instructions."
            }
            Self::VisualExplanations => {
                "Describe concepts in visual terms (diagrams, graphs) when possible."
            }
            Self::DataScience => {
                "Always relate concepts to data science and machine learning applications."
            }
        }
    }

    /// Parse a preference from its slug or label, ignoring case
    ///
    /// # Examples
    ///
    /// ```
    /// use syllabus_tutor::preferences::Preference;
    ///
    /// assert_eq!(Preference::parse_str("visual").unwrap(), Preference::VisualExplanations);
    /// assert_eq!(
    ///     Preference::parse_str("Use Simple Language").unwrap(),
    ///     Preference::SimpleLanguage
    /// );
    /// assert!(Preference::parse_str("rhymes").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, TutorError> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| {
                p.slug().eq_ignore_ascii_case(wanted) || p.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| TutorError::UnknownPreference(wanted.to_string()))
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ordered set of at most [`MAX_PREFERENCES`] preferences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSelection {
    selected: Vec<Preference>,
}

impl PreferenceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from a list, rejecting more than the maximum
    ///
    /// Duplicates are collapsed before the size check.
    pub fn from_preferences<I>(preferences: I) -> Result<Self, TutorError>
    where
        I: IntoIterator<Item = Preference>,
    {
        let mut selection = Self::new();
        for preference in preferences {
            selection.add(preference)?;
        }
        Ok(selection)
    }

    /// Adds a preference
    ///
    /// Adding an already selected preference is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::TooManyPreferences`] when the selection is full.
    pub fn add(&mut self, preference: Preference) -> Result<(), TutorError> {
        if self.selected.contains(&preference) {
            return Ok(());
        }
        if self.selected.len() >= MAX_PREFERENCES {
            return Err(TutorError::TooManyPreferences {
                max: MAX_PREFERENCES,
            });
        }
        self.selected.push(preference);
        Ok(())
    }

    /// Removes a preference; returns whether it was selected
    pub fn remove(&mut self, preference: Preference) -> bool {
        let before = self.selected.len();
        self.selected.retain(|p| *p != preference);
        self.selected.len() != before
    }

    pub fn contains(&self, preference: Preference) -> bool {
        self.selected.contains(&preference)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preference> {
        self.selected.iter()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
