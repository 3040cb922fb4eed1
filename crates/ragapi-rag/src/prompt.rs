pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Use the provided CONTEXT strictly. \
                                      If the answer isn't in the context, say you don't know.";

/// Assemble the grounded prompt. Snippets are numbered from 1 in the order given.
pub fn build_prompt<S: AsRef<str>>(question: &str, snippets: &[S]) -> String {
    let context = snippets
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Snippet {}:\n{}", i + 1, s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("SYSTEM:\n{SYSTEM_INSTRUCTION}\n\nCONTEXT:\n{context}\n\nUSER QUESTION:\n{question}\n\nASSISTANT:")
}
