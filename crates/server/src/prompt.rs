use rag_core::Document;

/// Context blocks separated by blank lines, then the question, then an open answer slot.
pub fn build_prompt(question: &str, context: &[Document]) -> String {
    let context_text = context
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "[Context]\n{}\n\n[Question]\n{}\n\n[Answer]",
        context_text, question
    )
}
