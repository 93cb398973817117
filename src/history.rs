//! Prompt context built from what the run has produced so far.

use std::path::PathBuf;

use crate::parse::FunctionSummary;

const IDEAS_HEADER: &str = "You have already brainstormed the following ideas:\n";
const RESULTS_HEADER: &str = "\nYou have already identified the following results with the dataset: ";
const DATASET_HEADER: &str = "\nDataset Information: ";
const CODE_HEADER: &str =
    "\nYou have already written the following functions, feel free to use them:\n";

/// Results files this short or shorter are treated as empty.
const MIN_RESULTS_CHARS: usize = 10;

/// Which categories of history a prompt includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryScope {
    pub ideas: bool,
    pub results: bool,
    pub dataset: bool,
    pub code: bool,
}

impl HistoryScope {
    pub const SELECTION: Self = Self {
        ideas: true,
        results: true,
        dataset: true,
        code: false,
    };

    pub const BRAINSTORM: Self = Self {
        ideas: true,
        results: true,
        dataset: true,
        code: false,
    };

    pub const CODE: Self = Self {
        ideas: false,
        results: false,
        dataset: true,
        code: true,
    };

    pub const DIVIDE: Self = Self {
        ideas: true,
        results: true,
        dataset: true,
        code: false,
    };
}

/// Builds the history block shared by selection and take-action prompts.
#[derive(Debug, Clone)]
pub struct HistoryComposer {
    results_file: PathBuf,
}

impl HistoryComposer {
    pub fn new(results_file: impl Into<PathBuf>) -> Self {
        Self {
            results_file: results_file.into(),
        }
    }

    pub fn compose(
        &self,
        ideas: &[String],
        comments: &[FunctionSummary],
        dataset_info: &str,
        scope: HistoryScope,
    ) -> String {
        let mut prompt = String::new();

        if scope.ideas && !ideas.is_empty() {
            prompt.push_str(IDEAS_HEADER);
            prompt.push_str(&ideas.join("\n"));
        }

        if scope.results {
            if let Some(results) = self.read_results() {
                prompt.push_str(RESULTS_HEADER);
                prompt.push_str(&results);
            }
        }

        if scope.dataset {
            prompt.push_str(DATASET_HEADER);
            prompt.push_str(dataset_info);
        }

        if scope.code && !comments.is_empty() {
            prompt.push_str(CODE_HEADER);
            for comment in comments {
                if let Some(docstring) = &comment.docstring {
                    prompt.push_str(&comment.name);
                    prompt.push('\n');
                    prompt.push_str(docstring);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt
    }

    /// Contents of the results file, if it exists and says anything.
    fn read_results(&self) -> Option<String> {
        match std::fs::read_to_string(&self.results_file) {
            Ok(text) if text.chars().count() > MIN_RESULTS_CHARS => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(
                    "No results history at {}: {}",
                    self.results_file.display(),
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, docstring: Option<&str>) -> FunctionSummary {
        FunctionSummary {
            name: name.to_string(),
            description: String::new(),
            input: String::new(),
            output: String::new(),
            docstring: docstring.map(str::to_string),
        }
    }

    fn composer_without_results() -> (tempfile::TempDir, HistoryComposer) {
        let dir = tempfile::tempdir().unwrap();
        let composer = HistoryComposer::new(dir.path().join("results.txt"));
        (dir, composer)
    }

    #[test]
    fn selection_scope_has_ideas_and_dataset() {
        let (_dir, composer) = composer_without_results();
        let ideas = vec!["idea one".to_string(), "idea two".to_string()];
        let comments = vec![summary("fit", Some("Fit a model."))];
        let history = composer.compose(&ideas, &comments, "MT data", HistoryScope::SELECTION);
        assert_eq!(
            history,
            "You have already brainstormed the following ideas:\nidea one\nidea two\nDataset Information: MT data"
        );
    }

    #[test]
    fn code_scope_lists_documented_functions_after_dataset() {
        let (_dir, composer) = composer_without_results();
        let ideas = vec!["ignored".to_string()];
        let comments = vec![
            summary("fit", Some("Fit a model.")),
            summary("undocumented", None),
            summary("plot", Some("Plot it.")),
        ];
        let history = composer.compose(&ideas, &comments, "MT data", HistoryScope::CODE);
        assert_eq!(
            history,
            "\nDataset Information: MT data\nYou have already written the following functions, feel free to use them:\nfit\nFit a model.\n\nplot\nPlot it.\n\n"
        );
    }

    #[test]
    fn empty_ideas_and_comments_are_omitted() {
        let (_dir, composer) = composer_without_results();
        let all = HistoryScope {
            ideas: true,
            results: true,
            dataset: true,
            code: true,
        };
        assert_eq!(
            composer.compose(&[], &[], "info", all),
            "\nDataset Information: info"
        );
    }

    #[test]
    fn results_need_more_than_ten_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        let composer = HistoryComposer::new(&path);

        std::fs::write(&path, "0123456789").unwrap();
        assert_eq!(
            composer.compose(&[], &[], "info", HistoryScope::DIVIDE),
            "\nDataset Information: info"
        );

        std::fs::write(&path, "rates peak at depth 400um").unwrap();
        assert_eq!(
            composer.compose(&[], &[], "info", HistoryScope::DIVIDE),
            "\nYou have already identified the following results with the dataset: rates peak at depth 400um\nDataset Information: info"
        );
        assert_eq!(
            composer.compose(&[], &[], "info", HistoryScope::CODE),
            "\nDataset Information: info"
        );
    }
}
