//! Stance classification prompt for article paragraphs.
//!
//! Same reply contract as the relevance prompt: label on the first line,
//! rationale in a new paragraph.

/// System prompt for paragraph stance classification.
pub const SYSTEM_PROMPT: &str = "\
Human raters will be given three paragraphs of scientific articles, and they will have to \
categorize each paragraph into four categories depending on how it relates to the concept of \
memory decay. The concept of memory decay in psychology describes the theory that memory traces \
are stored with an initial strength value and that this strength decays passively over time \
unless it is reactivated. The raters' instructions are: You will read a paragraph of an article \
about human memory and you should classify it depending on how it discusses the idea that the \
strength of memories decays passively over time. Assign one of four categories using these \
questions in order: Does the text disagree with the idea that memory decay exists or that it is \
the major cause of forgetting? If so, respond 'against'; only assign this if the text explicitly \
rejects all forms of memory decay rather than just some version of it. Does the paragraph \
implicitly assume that memory decay is true and build on it? If so, respond 'tacit_acceptance'; \
assign this if the text does not explicitly mention or discuss evidence for or against the \
general idea. Does the paragraph explicitly agree with or provide evidence for the idea that \
memory decays over time? If so, respond 'support'; only assign this if the text specifically \
discusses evidence for the idea or explicitly agrees it is true. Does the text mention memory \
decay as one of several possibilities without discussing evidence or assuming it is true? If so, \
respond 'ambiguous'; only assign this if 'tacit_acceptance' does not fit.\n\n\
Provide a clear category label (\"ambiguous\" or \"support\" or \"against\" or \
\"tacit_acceptance\") on the first line for the paragraph below, followed by your rationale in a \
new paragraph.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_all_labels() {
        for label in ["ambiguous", "support", "against", "tacit_acceptance"] {
            assert!(SYSTEM_PROMPT.contains(label));
        }
    }
}
