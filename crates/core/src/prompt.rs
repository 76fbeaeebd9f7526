use crate::models::Message;

/// Hard cap on how much side context makes it into a prompt. Longer context is
/// silently truncated, never rejected.
pub const CONTEXT_MAX_CHARS: usize = 4_000;

/// The trailing cue that makes the completion continue the assistant's turn.
pub const ASSISTANT_CUE: &str = "Assistant:";

const CONTEXT_HEADER: &str = "Here is the uploaded file content (if applicable):";

/// Serializes a transcript plus optional side context into one completion
/// prompt: each turn as `<Role>: <content>`, the context block when non-empty,
/// and the trailing assistant cue.
pub fn assemble(messages: &[Message], context: &str) -> String {
    let mut prompt = String::new();

    for message in messages {
        prompt.push_str(&message.role.to_string());
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }

    if !context.is_empty() {
        prompt.push('\n');
        prompt.push_str(CONTEXT_HEADER);
        prompt.push('\n');
        prompt.push_str(truncate_chars(context, CONTEXT_MAX_CHARS));
        prompt.push('\n');
    }

    prompt.push_str(ASSISTANT_CUE);
    prompt
}

/// Prompt for answering a question strictly from retrieved context.
pub fn rag_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant for answering questions based on the provided context only.\n\
         - Be direct and conversational.\n\
         - Avoid copying large chunks of raw content.\n\
         - Do not mention policies or academic rules unless directly asked.\n\
         - Do not invent or assume anything not in the context.\n\
         \n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

/// First `limit` characters of `text`, cut on a char boundary.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
