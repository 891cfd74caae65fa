//! Relevance screening prompt for memory-decay abstracts.
//!
//! The model must answer with a label ("relevant" or "irrelevant") on the
//! first line and its rationale in a new paragraph; the reply is parsed by
//! [`crate::llm::split_label_rationale`].

/// System prompt for abstract relevance screening.
pub const SYSTEM_PROMPT: &str = "\
Human raters will be given a set of scientific articles, and they will have to categorize each \
article into four categories depending on how it relates to the concept of memory decay. The \
concept of memory decay in psychology describes the theory that memory traces are stored with an \
initial strength value and that this strength decays passively over time unless it is reactivated. \
The raters' instructions are: You will read an article about human memory and you should classify \
it depending on how it discusses the idea that the strength of memories decays passively over \
time. Assign one of four categories using these questions in order: Does the text disagree with \
the idea that memory decay exists or that it is the major cause of forgetting? If so, respond \
'against'; only assign this if the text explicitly rejects all forms of memory decay rather than \
just some version of it. Does the article implicitly assume that memory decay is true and build \
on it? If so, respond 'tacit_acceptance'; assign this if the text does not explicitly mention or \
discuss evidence for or against the general idea. Does the article explicitly agree with or \
provide evidence for the idea that memory decays over time? If so, respond 'support'; only assign \
this if the text specifically discusses evidence for the idea or explicitly agrees it is true. \
Does the text mention memory decay as one of several possibilities without discussing evidence \
or assuming it is true? If so, respond 'neutral'; only assign this if 'tacit_acceptance' does \
not fit.\n\n\
We first have to select which articles to present to the human raters. We only want to show them \
articles that can be categorized into one of the categories above; articles that cannot are \
irrelevant. Some articles are irrelevant because they study non-human animals, others because \
they never mention memory decay explicitly, others because they discuss degradation of memory in \
old age. You will be given an abstract; rate it as relevant or irrelevant for the human raters. \
Provide a clear category label (\"relevant\" or \"irrelevant\") on the first line, followed by \
your rationale in a new paragraph.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_both_labels() {
        assert!(SYSTEM_PROMPT.contains("\"relevant\""));
        assert!(SYSTEM_PROMPT.contains("\"irrelevant\""));
    }
}
