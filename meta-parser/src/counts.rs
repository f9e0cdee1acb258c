//! Proximity mining of engagement counts from page text.

/// Keywords whose neighbourhood may carry a comment count.
pub const COMMENT_KEYWORDS: &[&str] = &["comments", "comment"];
/// Keywords whose neighbourhood may carry a reaction count.
pub const REACTION_KEYWORDS: &[&str] = &["likes", "reactions", "reacted"];

/// Characters kept on each side of a keyword occurrence.
const WINDOW_RADIUS: usize = 20;

/// Returns the largest integer found near the first occurrence of any keyword, or 0.
///
/// Only the first occurrence of each keyword is inspected. The window spans
/// [`WINDOW_RADIUS`] characters either side of where the keyword starts, is split on whitespace,
/// and every token that is all digits once `,` separators are removed is a candidate.
pub fn mine_count(text: &str, keywords: &[&str]) -> u64 {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .filter_map(|keyword| keyword_window(&lowered, &keyword.to_lowercase()))
        .flat_map(|window| numeric_tokens(&window))
        .max()
        .unwrap_or(0)
}

fn keyword_window(text: &str, keyword: &str) -> Option<String> {
    let byte_idx = text.find(keyword)?;
    let char_idx = text[..byte_idx].chars().count();
    let start = char_idx.saturating_sub(WINDOW_RADIUS);
    let end = char_idx + WINDOW_RADIUS;
    Some(text.chars().skip(start).take(end - start).collect())
}

fn numeric_tokens(window: &str) -> Vec<u64> {
    window
        .split_whitespace()
        .map(|token| token.replace(',', ""))
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|token| token.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn largest_token_in_first_window_wins() {
        let text = "Posted today. 1,200 comments and 340 comment threads";
        assert_eq!(mine_count(text, COMMENT_KEYWORDS), 1200);
    }

    #[test]
    fn later_occurrences_are_ignored() {
        let text = format!("5 comments{}9999 comments", " ".repeat(40));
        assert_eq!(mine_count(&text, COMMENT_KEYWORDS), 5);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(mine_count("You and 87 others REACTED", REACTION_KEYWORDS), 87);
        assert_eq!(mine_count("12 Likes · 3 Shares", REACTION_KEYWORDS), 12);
    }

    #[test]
    fn max_across_keywords() {
        let text = "40 likes here. ........................................ 310 reactions";
        assert_eq!(mine_count(text, REACTION_KEYWORDS), 310);
    }

    #[test]
    fn no_keyword_or_number_is_zero() {
        assert_eq!(mine_count("", COMMENT_KEYWORDS), 0);
        assert_eq!(mine_count("nothing to see", COMMENT_KEYWORDS), 0);
        assert_eq!(mine_count("view comments", COMMENT_KEYWORDS), 0);
        assert_eq!(mine_count("12k comments", COMMENT_KEYWORDS), 0);
    }

    #[test]
    fn window_is_measured_in_characters() {
        let text = "ééééé 7 comments";
        assert_eq!(mine_count(text, COMMENT_KEYWORDS), 7);
    }
}
