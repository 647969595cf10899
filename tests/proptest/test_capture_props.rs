//! Property-based tests for output cleaning and wire framing

use proptest::prelude::*;
use replsend::ansi::strip_control_sequences;
use replsend::capture::{clean, remove_echo, trim_trailing_blank, PromptRules};
use replsend::send::wire;

/// Printable text interleaved with the kinds of sequences terminals emit
fn terminal_line() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[ -~\t]{0,12}",
        Just("\x1b[0m".to_string()),
        Just("\x1b[1;32m".to_string()),
        Just("\x1b[2K".to_string()),
        Just("\x1b[?2004h".to_string()),
        Just("\x1b]0;title\x07".to_string()),
        Just("\r".to_string()),
        Just("\x08".to_string()),
        Just("\x07".to_string()),
    ];
    prop::collection::vec(piece, 0..8).prop_map(|pieces| pieces.concat())
}

fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|item| rest.any(|candidate| candidate == item))
}

proptest! {
    #[test]
    fn test_strip_leaves_no_controls(line in terminal_line()) {
        let stripped = strip_control_sequences(&line);
        prop_assert!(!stripped.chars().any(|c| c.is_control() && c != '\t'));
        prop_assert_eq!(strip_control_sequences(&stripped), stripped.clone());
    }

    #[test]
    fn test_strip_keeps_plain_text(line in "[ -~\t]{0,80}") {
        prop_assert_eq!(strip_control_sequences(&line), line);
    }

    #[test]
    fn test_echo_removal_is_bounded_subsequence(
        raw in prop::collection::vec("[abc]{0,2}", 0..20),
        sent in prop::collection::vec("[abc]{0,2}", 0..6),
    ) {
        let result = remove_echo(raw.clone(), &sent);
        prop_assert!(result.len() <= raw.len());
        prop_assert!(result.len() + sent.len() >= raw.len());
        prop_assert!(is_subsequence(&result, &raw));
    }

    #[test]
    fn test_exact_echo_prefix_is_removed(
        sent in prop::collection::vec("[a-z]{1,6}", 1..6),
        output in prop::collection::vec("[a-z0-9]{0,6}", 0..6),
    ) {
        let raw: Vec<String> = sent.iter().chain(output.iter()).cloned().collect();
        prop_assert_eq!(remove_echo(raw, &sent), output);
    }

    #[test]
    fn test_trim_trailing_blank(lines in prop::collection::vec("[ x]{0,3}", 0..12)) {
        let trimmed = trim_trailing_blank(lines.clone());
        prop_assert!(trimmed.last().is_none_or(|line| !line.trim().is_empty()));
        prop_assert_eq!(&lines[..trimmed.len()], &trimmed[..]);
        prop_assert!(lines[trimmed.len()..].iter().all(|line| line.trim().is_empty()));
    }

    #[test]
    fn test_clean_output_is_plain_and_prompt_free(
        raw in prop::collection::vec(terminal_line(), 0..12),
        sent in prop::collection::vec("[ -~]{0,10}", 0..4),
    ) {
        let rules = PromptRules::new();
        let cleaned = clean(raw, &sent, &rules);
        prop_assert!(cleaned.iter().all(|line| !line.contains('\x1b')));
        prop_assert!(cleaned.iter().all(|line| !rules.is_prompt(line)));
        prop_assert!(cleaned.last().is_none_or(|line| !line.trim().is_empty()));
    }

    #[test]
    fn test_wire_formats(
        payload in prop::collection::vec("[ -~]{0,20}", 1..8),
        terminator in prop_oneof![Just("\x04".to_string()), Just("--\n".to_string())],
    ) {
        let plain = wire::plain(&payload);
        prop_assert_eq!(&plain, &format!("{}\n", payload.join("\n")));
        prop_assert_eq!(plain.matches('\n').count(), payload.len());

        let body = wire::paste_body(&payload, &terminator);
        prop_assert!(body.starts_with(&plain));
        prop_assert!(body.ends_with(&terminator));
        prop_assert_eq!(body.len(), plain.len() + terminator.len());
    }
}
