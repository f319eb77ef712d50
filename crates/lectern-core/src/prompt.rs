//! Fixed text fragments the composer assembles into generation requests.

use std::fmt::Write;

use lectern_llm::Message;
use lectern_memory::RetrievalResult;

const GROUNDING_BANNER: &str = "=== RELEVANT CONTENT FROM THE DOCUMENT ===";
const FOOTER_RULE_WIDTH: usize = 50;
const PREVIEW_CHARS: usize = 200;

pub const PERSONA: &str = "\
You are Lectern, a seasoned problem-solving mentor who speaks in a warm mix of \
English and everyday Urdu (words like \"yaar\", \"dekho\", \"bilkul\", \"samjha\", \
\"acha\", \"matlab\").

Style:
- Open by acknowledging the question, e.g. \"Bahut acha sawal!\" or \"Bilkul sahi poocha!\".
- Give concrete, actionable advice with a short example or analogy.
- Be direct and encouraging, never preachy.
- Close with a next step the reader can take today.

Working with the document:
- When document excerpts are supplied, build the answer on them first.
- Name the section and page you draw from, e.g. \"As the section on Root Causes (page 12) puts it...\".
- Paraphrase or quote briefly, then explain and extend in your own words.";

/// Canned refuse-and-redirect replies for deflected queries.
pub const DEFLECTIONS: &[&str] = &[
    "Arre yaar, ye sawal mere kaam ka nahi hai. Ask me about tackling a real problem and I'm all yours!",
    "Bas karo yaar! I only talk problem solving here. Bring me a challenge, a decision or a plan.",
    "Dekho, timepass ke liye main nahi hoon. Ask something about analysis, planning ya decision making!",
    "Acha, that one is outside my lane. Poocho kuch useful, like how to break down a tough problem.",
    "Nahi yaar, ye topic chhodo. Tell me what obstacle you're stuck on and we'll work through it.",
    "Samjha? I'm a problem-solving mentor, not a chat buddy. Ask me about strategies and approaches!",
    "Itna waqt hai toh kuch seekh lo! Ask about root causes, trade-offs ya conflict resolution.",
    "Bilkul off-topic hai ye. Let's get serious: which decision or challenge should we tackle?",
    "Mazak baad mein. Right now, ask me something the document can actually help with.",
    "Chalo, focus karo. Ask how to plan, prioritize ya solve something and I'll dig into the book for you.",
];

/// Render retrieved passages under the grounding banner, or `None` when there are none.
#[must_use]
pub fn grounding_context(results: &[RetrievalResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let mut out = format!("{GROUNDING_BANNER}\n\n");
    for result in results {
        let _ = write!(
            out,
            "Reference {} (Section: {}, Page: {}):\n{}\n\n",
            result.rank, result.section_title, result.page, result.chunk_text
        );
    }
    Some(out)
}

/// The system persona plus a user turn carrying grounding, question and citation rules.
#[must_use]
pub fn build_messages(query: &str, results: &[RetrievalResult]) -> Vec<Message> {
    let mut user = String::new();
    if let Some(context) = grounding_context(results) {
        user.push_str(&context);
    }
    let _ = write!(user, "User question: {query}\n\nInstructions:\n");
    if results.is_empty() {
        user.push_str(
            "- No passage of the document matched this question; answer from general \
             problem-solving experience and say so briefly.\n",
        );
    } else {
        user.push_str(
            "- You MUST use the document content above and cite it by section and page.\n\
             - Expand on the cited material with practical insight of your own.\n",
        );
    }
    user.push_str(
        "- Keep the advice practical and actionable.\n\
         - Stay in your English-Urdu mentor voice and keep it conversational.",
    );

    vec![Message::system(PERSONA), Message::user(user)]
}

/// Sources list appended to grounded answers, in retrieval order.
#[must_use]
pub fn citation_footer(results: &[RetrievalResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let mut out = format!("\n\n{}\nReferences from the document:\n", "=".repeat(FOOTER_RULE_WIDTH));
    for result in results {
        let _ = writeln!(out, "• {} (Page {})", result.section_title, result.page);
    }
    Some(out)
}

/// First 200 characters of `text`, with an ellipsis when truncated.
#[must_use]
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

#[must_use]
pub fn apology(cause: &str) -> String {
    format!("Sorry yaar, I hit a snag while answering: {cause}. Please try again!")
}
