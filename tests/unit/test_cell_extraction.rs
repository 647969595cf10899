//! Unit Tests for cell and range extraction

use replsend::cell::delimiter::DEFAULT_DELIMITER_PATTERNS;
use replsend::config::CellConfig;
use replsend::{extract_cell, extract_range, DelimiterRule, Error, Position, RangeUnit};

const SCRIPT: &[&str] = &[
    "import numpy as np",   // 1
    "",                     // 2
    "# %% Load",            // 3
    "data = np.arange(10)", // 4
    "",                     // 5
    "total = data.sum()",   // 6
    "",                     // 7
    "# %% [markdown]",      // 8
    "# Notes",              // 9
    "# %%",                 // 10
    "print(total)",         // 11
];

#[test]
fn test_cell_around_cursor() {
    let rule = DelimiterRule::new();
    for cursor in 4..=7 {
        let cell = extract_cell(SCRIPT, cursor, &rule).unwrap();
        assert_eq!(cell.lines, vec!["data = np.arange(10)", "", "total = data.sum()"]);
        assert_eq!((cell.start_line, cell.end_line), (4, 6));
        assert_eq!(cell.next_cell_start, Some(8));
    }
}

#[test]
fn test_preamble_before_first_delimiter_is_a_cell() {
    let cell = extract_cell(SCRIPT, 2, &DelimiterRule::new()).unwrap();
    assert_eq!(cell.text(), "import numpy as np");
    assert_eq!(cell.next_cell_start, Some(3));
}

#[test]
fn test_cursor_on_delimiter_selects_the_cell_it_opens() {
    let cell = extract_cell(SCRIPT, 3, &DelimiterRule::new()).unwrap();
    assert_eq!(cell.start_line, 4);
}

#[test]
fn test_last_cell_runs_to_end_of_text() {
    let cell = extract_cell(SCRIPT, 11, &DelimiterRule::new()).unwrap();
    assert_eq!(cell.text(), "print(total)");
    assert_eq!(cell.next_cell_start, None);
}

#[test]
fn test_text_without_delimiters_is_one_cell() {
    let text = ["", "x = 1", "y = 2", ""];
    let cell = extract_cell(&text, 1, &DelimiterRule::new()).unwrap();
    assert_eq!(cell.text(), "x = 1\ny = 2");
    assert_eq!((cell.start_line, cell.end_line), (2, 3));
}

#[test]
fn test_blank_cell_reports_cursor_line() {
    let text = ["# %%", "  ", "", "# %%", "x"];
    match extract_cell(&text, 3, &DelimiterRule::new()) {
        Err(Error::EmptyCell { line }) => assert_eq!(line, 3),
        other => panic!("expected EmptyCell, got {:?}", other),
    }
    assert!(Error::EmptyCell { line: 3 }.is_warning());
}

#[test]
fn test_cursor_outside_text() {
    let rule = DelimiterRule::new();
    assert!(matches!(
        extract_cell(SCRIPT, 0, &rule),
        Err(Error::InvalidRange { .. })
    ));
    assert!(matches!(
        extract_cell(SCRIPT, SCRIPT.len() + 1, &rule),
        Err(Error::InvalidRange { .. })
    ));
}

#[test]
fn test_default_delimiters_across_languages() {
    let rule = DelimiterRule::new();
    assert!(!DEFAULT_DELIMITER_PATTERNS.is_empty());
    for line in [
        "# %%",
        "#%% setup",
        "// %%",
        "-- %%",
        ";; %%",
        "% %%",
        "%%",
        "# In[3]:",
        "# In [ ]:",
        "```python",
    ] {
        assert!(rule.is_delimiter(line), "should delimit: {:?}", line);
    }
    for line in ["x = 1  # %% not at start", "# plain comment", "%%time", "print('%%')"] {
        assert!(!rule.is_delimiter(line), "should not delimit: {:?}", line);
    }
}

#[test]
fn test_configured_delimiters() {
    let config = CellConfig {
        delimiter_patterns: vec![r"^##\s*-{3,}".to_string()],
        replace_default_delimiters: true,
    };
    let rule = DelimiterRule::from_config(&config).unwrap();
    let text = ["a <- 1", "## ----", "b <- 2", "# %%", "c <- 3"];
    let cell = extract_cell(&text, 3, &rule).unwrap();
    assert_eq!(cell.lines, vec!["b <- 2", "# %%", "c <- 3"]);
}

#[test]
fn test_line_range() {
    let lines = extract_range(
        SCRIPT,
        Position::line_start(4),
        Position::new(6, 3),
        RangeUnit::Line,
    )
    .unwrap();
    assert_eq!(lines, vec!["data = np.arange(10)", "", "total = data.sum()"]);
}

#[test]
fn test_character_range_single_line() {
    let lines = extract_range(SCRIPT, Position::new(6, 8), Position::new(6, 17), RangeUnit::Character)
        .unwrap();
    assert_eq!(lines, vec!["data.sum()"]);
}

#[test]
fn test_character_range_spans_lines() {
    let lines = extract_range(SCRIPT, Position::new(4, 7), Position::new(6, 4), RangeUnit::Character)
        .unwrap();
    assert_eq!(lines, vec!["np.arange(10)", "", "total"]);
}

#[test]
fn test_character_range_counts_characters_not_bytes() {
    let text = ["naïve = 'café'"];
    let lines =
        extract_range(&text, Position::new(1, 9), Position::new(1, 12), RangeUnit::Character).unwrap();
    assert_eq!(lines, vec!["café"]);
}

#[test]
fn test_invalid_ranges() {
    let cases = [
        (Position::new(5, 0), Position::new(4, 0), RangeUnit::Line),
        (Position::new(1, 0), Position::new(99, 0), RangeUnit::Line),
        (Position::new(0, 0), Position::new(1, 0), RangeUnit::Line),
        (Position::new(4, 9), Position::new(4, 2), RangeUnit::Character),
        (Position::new(1, 100), Position::new(2, 0), RangeUnit::Character),
    ];
    for (start, end, unit) in cases {
        assert!(
            matches!(
                extract_range(SCRIPT, start, end, unit),
                Err(Error::InvalidRange { .. })
            ),
            "{:?}..{:?} should be invalid",
            start,
            end
        );
    }
}
