//! Formatter behaviour: rule order, literal leftovers, chunking invariance and
//! the incremental buffer matching a full re-format.

use ai_search_client::{format_answer, AnswerBuffer};

#[test]
fn formats_emphasis_code_and_newlines() {
    assert_eq!(
        format_answer("Use **cargo** to run `cargo test`\nthen relax."),
        "Use <strong>cargo</strong> to run <code>cargo test</code><br>then relax."
    );
}

#[test]
fn code_inside_emphasis_is_formatted_too() {
    assert_eq!(
        format_answer("**see `x`**"),
        "<strong>see <code>x</code></strong>"
    );
}

#[test]
fn unmatched_delimiters_stay_literal() {
    assert_eq!(format_answer("2 ** 3 and `open"), "2 ** 3 and `open");
}

#[test]
fn spans_do_not_cross_lines() {
    assert_eq!(format_answer("**a\nb**"), "**a<br>b**");
}

#[test]
fn reformatting_delimiter_free_output_changes_nothing() {
    let inputs = [
        "Hello **world**",
        "a `b` c\nd",
        "**x** and **y**\n\n`z`",
        "plain text",
    ];
    for input in inputs {
        let once = format_answer(input);
        assert!(!once.contains("**") && !once.contains('`') && !once.contains('\n'));
        assert_eq!(format_answer(&once), once, "input {input:?}");
    }
}

#[test]
fn result_does_not_depend_on_chunking() {
    let text = "Rust **ownership** means\n`Drop` runs **once**.\nDone `ok`";
    let expected = format_answer(text);

    for size in 1..=7 {
        let mut buffer = AnswerBuffer::new();
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(size) {
            let fragment: String = chunk.iter().collect();
            buffer.push(&fragment);
            assert_eq!(buffer.formatted(), format_answer(buffer.raw()));
        }
        assert_eq!(buffer.raw(), text);
        assert_eq!(buffer.formatted(), expected, "chunk size {size}");
    }
}

#[test]
fn delimiter_split_across_fragments_is_not_half_applied() {
    let mut buffer = AnswerBuffer::new();
    buffer.push("Hello *");
    assert_eq!(buffer.formatted(), "Hello *");
    buffer.push("*wor");
    assert_eq!(buffer.formatted(), "Hello **wor");
    buffer.push("ld*");
    buffer.push("*");
    assert_eq!(buffer.formatted(), "Hello <strong>world</strong>");
    assert_eq!(buffer.fragments().len(), 4);
}

#[test]
fn replace_discards_streamed_fragments() {
    let mut buffer = AnswerBuffer::new();
    assert!(buffer.is_empty());
    buffer.push("partial\nanswer");
    assert!(!buffer.is_empty());
    buffer.replace("**cached**\nanswer");
    assert_eq!(buffer.raw(), "**cached**\nanswer");
    assert_eq!(buffer.fragments(), ["**cached**\nanswer"]);
    assert_eq!(buffer.formatted(), "<strong>cached</strong><br>answer");
}
