use pulldown_cmark::{Event, Parser, TagEnd};

/// Renders markdown to plain text: markup dropped, one block per line.
pub fn to_plain_text(input: &str) -> String {
    let mut output = String::new();

    for event in Parser::new(input) {
        match event {
            Event::Text(text) | Event::Code(text) => output.push_str(&text),
            Event::SoftBreak | Event::HardBreak => output.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableRow
                | TagEnd::TableHead,
            ) => output.push('\n'),
            Event::End(TagEnd::TableCell) => output.push(' '),
            _ => {}
        }
    }

    output.trim().to_string()
}
