use docqa_core::types::RetrievedChunk;

/// Grounded prompt: retrieved chunk texts in the given order, separated by a
/// blank line, followed by the question.
pub fn build_prompt(question: &str, context: &[RetrievedChunk]) -> String {
    let joined = context.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    format!(
        "You are a helpful assistant answering questions based on the provided context.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Please provide a comprehensive answer based on the context above. \
         If the context doesn't contain relevant information, say so.",
        joined, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str) -> RetrievedChunk {
        RetrievedChunk { id: "d:0".into(), document: "d".into(), chunk_index: 0, text: text.into(), score: 1.0 }
    }

    #[test]
    fn context_precedes_question_in_order() {
        let p = build_prompt("What is AI?", &[hit("first chunk"), hit("second chunk")]);
        let first = p.find("first chunk").unwrap();
        let second = p.find("second chunk").unwrap();
        let question = p.find("Question: What is AI?").unwrap();
        assert!(first < second && second < question);
        assert!(p.contains("first chunk\n\nsecond chunk"));
    }
}
