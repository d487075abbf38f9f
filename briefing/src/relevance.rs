/// Coarse keyword gate for feed entries.
///
/// Accepts a text when any keyword occurs in it as a case-insensitive substring. There is no
/// scoring: the model downstream does the real selection, so false positives are fine.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    /// Lowercased, blank entries removed
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Tests the title and summary concatenated as-is, without a separator.
    pub fn matches_entry(&self, title: &str, summary: &str) -> bool {
        self.matches(&format!("{title}{summary}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> KeywordFilter {
        KeywordFilter::new(["Large Language Models", "Fintech", "RAG"])
    }

    #[test]
    fn matches_case_insensitively() {
        let f = filter();
        assert!(f.matches("New FINTECH unicorn raises $1B"));
        assert!(f.matches_entry("Scaling large language models", ""));
        assert!(f.matches_entry("Weekly notes", "we built a rag pipeline"));
        assert!(!f.matches_entry("Rust 1.80 released", "compiler improvements"));
    }

    #[test]
    fn empty_keyword_set_rejects_everything() {
        let f = KeywordFilter::new(Vec::<String>::new());
        assert!(f.is_empty());
        assert!(!f.matches(""));
        assert!(!f.matches("Large Language Models"));

        let blanks = KeywordFilter::new(["", "   "]);
        assert!(blanks.is_empty());
        assert!(!blanks.matches("anything"));
    }

    #[test]
    fn substring_semantics_accept_embedded_matches() {
        // "rag" is inside "storage": accepted, the model filters it out later
        assert!(filter().matches("Cheap object storage"));
    }

    #[test]
    fn concatenation_has_no_separator() {
        let f = KeywordFilter::new(["fintech"]);
        assert!(f.matches_entry("Fin", "tech weekly"));
    }

    #[test]
    fn acceptance_agrees_with_any_substring() {
        let keywords = ["Vector Database", "Supply Chain", "AI Agents"];
        let f = KeywordFilter::new(keywords);
        let texts = [
            "A new vector database benchmark",
            "supply chainS in 2025",
            "Agents of AI",
            "",
            "ai agents everywhere",
        ];
        for t in texts {
            let expected = keywords.iter().any(|k| t.to_lowercase().contains(&k.to_lowercase()));
            assert_eq!(f.matches(t), expected, "text: {t}");
        }
    }
}
