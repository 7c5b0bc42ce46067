//! "Stuff" prompt: every retrieved chunk is pasted in full above the question.

use rag_store::SearchHit;

const PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Builds the single prompt sent to the chat model.
pub fn build_stuff_prompt(question: &str, hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{PREAMBLE}\n\n{context}\n\nQuestion: {}\nHelpful Answer:",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn hit(text: &str) -> SearchHit {
        SearchHit {
            score: 1.0,
            text: text.into(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn prompt_contains_context_in_order_then_question() {
        let p = build_stuff_prompt("  What is HNSW? ", &[hit("first chunk"), hit("second chunk")]);
        let first = p.find("first chunk").unwrap();
        let second = p.find("second chunk").unwrap();
        let question = p.find("Question: What is HNSW?\n").unwrap();
        assert!(p.starts_with(PREAMBLE));
        assert!(first < second && second < question);
        assert!(p.ends_with("Helpful Answer:"));
    }
}
