//! Prompt rendering for the hosted models.

/// Render the single-turn text-completion prompt
/// `"Human: <task>: <content>.\nAssistant:"`.
pub fn human_prompt(task: &str, content: &str) -> String {
    format!("Human: {}: {}.\nAssistant:", task, content)
}

/// Prompt asking for `language` code implementing `message`.
pub fn code_prompt(language: &str, message: &str) -> String {
    let task = format!("Write {} code for the following instructions", language);
    human_prompt(&task, message)
}

/// Prompt asking for a summary of `content`.
pub fn summary_prompt(instruction: &str, content: &str) -> String {
    human_prompt(instruction, content)
}

/// Text prompt list for the image model. The message is passed through untouched.
pub fn image_prompts(message: &str) -> Vec<String> {
    vec![message.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SUMMARY_INSTRUCTION;

    #[test]
    fn test_code_prompt_embeds_language_and_message() {
        let prompt = code_prompt("Python", "reverse a string");
        assert!(prompt.contains("Write Python code for the following instructions: reverse a string."));
        assert!(prompt.starts_with("Human: "));
        assert!(prompt.ends_with("\nAssistant:"));
    }

    #[test]
    fn test_code_prompt_keeps_message_verbatim() {
        let message = "parse \"quoted\" input\nacross lines";
        let prompt = code_prompt("Rust", message);
        assert!(prompt.contains(message));
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = summary_prompt(DEFAULT_SUMMARY_INSTRUCTION, "Hello world");
        assert_eq!(
            prompt,
            "Human: Summarize the main points made in the following document: Hello world.\nAssistant:"
        );
    }

    #[test]
    fn test_image_prompts_passthrough() {
        assert_eq!(image_prompts("a cat in space"), vec!["a cat in space".to_string()]);
    }
}
