// Snapshot tests for the markup value and the HTML surface

use insta::assert_snapshot;
use pressroom::richtext::markup_converter::{deserialize, serialize};
use pressroom::richtext::render::render_html;
use pressroom::richtext::structured_document::*;

fn article() -> StructuredDocument {
    let bold = MarkSet::plain().with(Mark::Bold);
    let highlighted = MarkSet::plain().with(Mark::HighlightAnimated);

    StructuredDocument::from_blocks(vec![
        Block::heading3().with_plain_text("Election night"),
        Block::paragraph()
            .with_text("Polls", bold)
            .with_plain_text(" closed at 8pm.")
            .with_line_break()
            .with_text("Results", highlighted)
            .with_plain_text(" follow."),
        Block::quote()
            .with_plain_text("A historic turnout")
            .with_alignment(Alignment::Center),
        Block::separator(),
        Block::list_item().with_plain_text("North: 61%"),
        Block::list_item().with_plain_text("South: 58%"),
        Block::embed(Embed::Image {
            url: "https://cdn.example/queue.jpg".to_string(),
            alt_text: "Voters queue".to_string(),
        }),
    ])
}

#[test]
fn test_article_markup() {
    assert_snapshot!(serialize(&article()), @r#"
    ### Election night

    **Polls** closed at 8pm.
    <span class="highlight-animated">Results</span> follow.

    <div style="text-align: center">> A historic turnout</div>

    ---

    • North: 61%

    • South: 58%

    ```image
    src: https://cdn.example/queue.jpg
    alt: Voters queue
    ```
    "#);
}

#[test]
fn test_article_html() {
    let html = render_html(&article(), "");
    assert_snapshot!(html.trim_end(), @r#"
    <h3>Election night</h3>
    <p><strong>Polls</strong> closed at 8pm.<br><span class="highlight-animated">Results</span> follow.</p>
    <blockquote style="text-align: center">A historic turnout</blockquote>
    <hr>
    <ul>
    <li>North: 61%</li>
    <li>South: 58%</li>
    </ul>
    <figure><img src="https://cdn.example/queue.jpg" alt="Voters queue"></figure>
    "#);
}

#[test]
fn test_article_round_trips() {
    let doc = article();
    assert_eq!(deserialize(&serialize(&doc)), doc);
}

#[test]
fn test_pasted_symbols_stay_literal() {
    let doc = StructuredDocument::from_blocks(vec![
        Block::paragraph().with_plain_text("### not a heading * _x_ `code` \\"),
        Block::paragraph().with_plain_text("<span class=\"highlight-simple\">x</span>"),
    ]);
    let value = serialize(&doc);
    assert_snapshot!(value, @r#"
    \### not a heading \* \_x\_ \`code\` \\

    \<span class="highlight-simple">x\</span>
    "#);
    assert_eq!(deserialize(&value), doc);
}

#[test]
fn test_lenient_input_is_normalized() {
    let messy = "### Title\nstill title\n> quote\n---\n**never closed\n\n<span class=\"other\">x</span>";
    let doc = deserialize(messy);
    assert_snapshot!(doc.to_string().trim_end(), @r#"
    StructuredDocument (5 blocks):
      [0] Heading3: "Title\nstill title"
      [1] Quote: "quote"
      [2] Separator: ""
      [3] Paragraph: "never closed"
      [4] Paragraph: "<span class=\"other\">x</span>"
    "#);
    assert_snapshot!(serialize(&doc), @r#"
    ### Title
    still title

    > quote

    ---

    **never closed**

    \<span class="other">x\</span>
    "#);
}
