//! Slide view of a generated plan.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SLIDE_HEADING: Regex = Regex::new(r"(?m)^###\s").unwrap();
}

/// Split a plan into slides, one per `### ` heading.
///
/// Each slide starts with its heading. Text before the first heading forms
/// its own slide, and blank slides are dropped.
pub fn slides(markdown: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = SLIDE_HEADING.find_iter(markdown).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(markdown.len());
            &markdown[start..end]
        })
        .filter(|slide| !slide.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_splits_at_headings() {
        let plan = "### 1. Summary\nGoal.\n\n### 2. Roadmap\n#### Phase 1\nDiscovery.\n";
        let result = slides(plan);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], "### 1. Summary\nGoal.\n\n");
        assert!(result[1].starts_with("### 2. Roadmap"));
        assert!(result[1].contains("#### Phase 1\nDiscovery."));
    }

    #[test]
    fn test_preamble_is_kept() {
        let result = slides("Intro text\n### 1. Summary\nGoal.");
        assert_eq!(result, vec!["Intro text\n", "### 1. Summary\nGoal."]);
    }

    #[test]
    fn test_blank_input() {
        assert!(slides("").is_empty());
        assert!(slides("  \n\n").is_empty());
    }

    #[test]
    fn test_inline_hashes_do_not_split() {
        assert_eq!(slides("### Costs\nUse ### sparingly").len(), 1);
    }

    proptest! {
        #[test]
        fn prop_sections_survive_intact(
            bodies in prop::collection::vec("[a-z ]{1,20}", 1..6),
        ) {
            let plan: String = bodies
                .iter()
                .enumerate()
                .map(|(i, body)| format!("### {}. Title\n{}x\n", i + 1, body))
                .collect();

            let result = slides(&plan);
            prop_assert_eq!(result.len(), bodies.len());
            prop_assert_eq!(result.concat(), plan.clone());
            for (slide, body) in result.iter().zip(&bodies) {
                prop_assert!(slide.starts_with("### "));
                let expected = format!("{}x\n", body);
                prop_assert!(slide.ends_with(&expected));
            }
        }
    }
}
