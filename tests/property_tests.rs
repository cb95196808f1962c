use pressroom::RichTextEditor;
use pressroom::history::History;
use pressroom::richtext::format::FormatCommand;
use pressroom::richtext::markup_converter::{
    HIGHLIGHT_ANIMATED_OPEN, HIGHLIGHT_CLOSE, HIGHLIGHT_SIMPLE_OPEN, deserialize, serialize,
};
use pressroom::richtext::structured_document::*;
use proptest::prelude::*;

fn marks_strategy() -> impl Strategy<Value = MarkSet> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(bold, italic, underline, highlight_simple, highlight_animated)| MarkSet {
                bold,
                italic,
                underline,
                highlight_simple,
                highlight_animated,
            },
        )
}

// Text full of characters the markup gives meaning to
fn run_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,8}",
        "[a-z #>•*_<`/\"\\\\-]{1,8}",
        Just("---".to_string()),
        Just("</span>".to_string()),
        "[\u{00C0}-\u{00FF}\u{4E00}-\u{4E20}]{1,4}",
    ]
}

fn inline_strategy() -> impl Strategy<Value = InlineContent> {
    prop_oneof![
        4 => (run_text_strategy(), marks_strategy())
            .prop_map(|(text, marks)| InlineContent::Text(TextRun::new(text, marks))),
        1 => Just(InlineContent::LineBreak),
    ]
}

fn alignment_strategy() -> impl Strategy<Value = Alignment> {
    prop_oneof![
        3 => Just(Alignment::Left),
        1 => Just(Alignment::Center),
        1 => Just(Alignment::Right),
        1 => Just(Alignment::Justify),
    ]
}

fn text_kind_strategy() -> impl Strategy<Value = BlockType> {
    prop_oneof![
        Just(BlockType::Paragraph),
        Just(BlockType::Heading3),
        Just(BlockType::Quote),
        Just(BlockType::ListItem),
    ]
}

fn block_strategy() -> impl Strategy<Value = Block> {
    let url = "https://[a-z0-9./_-]{1,20}";
    let caption = "[a-zA-Z0-9 ]{0,12}";

    prop_oneof![
        6 => (
            text_kind_strategy(),
            prop::collection::vec(inline_strategy(), 0..6),
            alignment_strategy(),
        )
            .prop_map(|(block_type, content, alignment)| Block {
                block_type,
                alignment,
                content,
            }),
        1 => alignment_strategy().prop_map(|a| Block::separator().with_alignment(a)),
        1 => (url, caption, alignment_strategy()).prop_map(|(url, alt_text, a)| {
            Block::embed(Embed::Image { url, alt_text }).with_alignment(a)
        }),
        1 => (url, caption, alignment_strategy()).prop_map(|(url, title, a)| {
            Block::embed(Embed::Video { url, title }).with_alignment(a)
        }),
    ]
}

fn document_strategy() -> impl Strategy<Value = StructuredDocument> {
    prop::collection::vec(block_strategy(), 1..6).prop_map(StructuredDocument::from_blocks)
}

// Hand-edited or damaged values built from markup fragments
fn raw_markup_strategy() -> impl Strategy<Value = String> {
    let fragments: Vec<String> = [
        "**",
        "*",
        "__",
        HIGHLIGHT_SIMPLE_OPEN,
        HIGHLIGHT_ANIMATED_OPEN,
        HIGHLIGHT_CLOSE,
        "\n",
        "\n\n",
        "### ",
        "> ",
        "• ",
        "---",
        "\\",
        "```image\nsrc: a.png\n```",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let token = prop_oneof![
        2 => prop::sample::select(fragments),
        1 => "[a-z ]{1,4}",
    ];
    prop::collection::vec(token, 0..12).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn serialized_documents_round_trip(doc in document_strategy()) {
        let value = serialize(&doc);
        prop_assert_eq!(deserialize(&value), doc);
    }

    #[test]
    fn reserialization_is_idempotent(doc in document_strategy()) {
        let value = serialize(&doc);
        prop_assert_eq!(serialize(&deserialize(&value)), value);
    }

    #[test]
    fn any_value_normalizes_to_a_fixpoint(raw in raw_markup_strategy()) {
        let doc = deserialize(&raw);
        prop_assert!(doc.block_count() >= 1);
        let canonical = serialize(&doc);
        prop_assert_eq!(serialize(&deserialize(&canonical)), canonical);
    }

    #[test]
    fn history_never_exceeds_capacity(capacity in 1usize..20, pushes in 0usize..60) {
        let mut history = History::with_capacity(capacity);
        for i in 0..pushes {
            history.push(format!("v{}", i));
            prop_assert!(history.len() <= capacity);
        }
        prop_assert_eq!(history.len(), pushes.min(capacity));
    }

    #[test]
    fn undo_then_redo_restores_value(pushes in 1usize..30, steps in 0usize..30) {
        let mut history = History::new();
        for i in 0..pushes {
            history.push(format!("v{}", i));
        }
        let newest = history.current().map(|e| e.value.clone());

        let mut undone = 0;
        for _ in 0..steps {
            if history.undo().is_some() {
                undone += 1;
            }
        }
        prop_assert_eq!(undone, steps.min(pushes - 1));
        for _ in 0..undone {
            prop_assert!(history.redo().is_some());
        }
        prop_assert_eq!(history.current().map(|e| e.value.clone()), newest);
        prop_assert!(!history.can_redo());
    }

    #[test]
    fn editor_undo_walks_back_through_commits(
        ranges in prop::collection::vec((0usize..=11, 0usize..=11, 0usize..3), 1..12),
    ) {
        let mut editor = RichTextEditor::mount("Hello world", "");
        let mut values = vec![editor.value().to_string()];

        for (anchor, focus, which) in ranges {
            let mark = [Mark::Bold, Mark::Italic, Mark::Underline][which];
            editor.set_selection(DocumentPosition::new(0, anchor), DocumentPosition::new(0, focus));
            editor.apply(FormatCommand::ToggleMark(mark)).unwrap();
            if values.last().map(String::as_str) != Some(editor.value()) {
                values.push(editor.value().to_string());
            }
        }

        for expected in values.iter().rev().skip(1) {
            prop_assert!(editor.undo());
            prop_assert_eq!(editor.value(), expected.as_str());
        }
        prop_assert!(!editor.undo());

        for expected in values.iter().skip(1) {
            prop_assert!(editor.redo());
            prop_assert_eq!(editor.value(), expected.as_str());
        }
    }
}
