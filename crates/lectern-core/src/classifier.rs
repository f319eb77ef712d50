//! Offline gate deciding whether a query is answered from the document or deflected.
//!
//! The decision is a fixed cascade over [`RULES`]: the first rule whose predicate
//! holds decides the verdict, and a query no rule claims is answerable.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Bumped whenever a vocabulary list or the rule order changes.
pub const RULESET_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeflectReason {
    Greeting,
    Abusive,
    OffTopic,
    Malformed,
}

impl std::fmt::Display for DeflectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Greeting => "greeting",
            Self::Abusive => "abusive",
            Self::OffTopic => "off-topic",
            Self::Malformed => "malformed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Answerable,
    Deflect(DeflectReason),
}

impl Verdict {
    #[must_use]
    pub fn is_answerable(self) -> bool {
        matches!(self, Self::Answerable)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Answerable => f.write_str("ANSWERABLE"),
            Self::Deflect(reason) => write!(f, "DEFLECT ({reason})"),
        }
    }
}

static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(hello|hi|hey|salam|assalam|namaste|adab|sat sri akal)\b",
        r"\b(good morning|good evening|good afternoon|good night)\b",
        r"\b(how are you|kaise ho|kya hal|sup|wassup|how r u)\b",
        r"\b(what.*your name|tumhara naam|aap ka naam|name kya hai)\b",
        r"\b(who are you|tum kaun|aap kaun|kaun ho)\b",
        r"\b(nice to meet|pleasure to meet|glad to meet)\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid greeting regex"))
    .collect()
});

const ABUSIVE_TERMS: &[&str] = &[
    "fuck", "shit", "damn", "hell", "bitch", "bastard", "asshole", "stupid", "idiot", "moron",
    "retard", "crazy", "mad", "loser", "suck", "sucks", "cunt", "dick", "penis", "vagina", "sex",
    "chutiya", "madarchod", "behenchod", "gandu", "randi", "saala", "kamina", "harami", "kutta",
    "kutti", "gadha", "ullu", "pagal", "bhenchod", "madarchodd", "randii", "gaandu", "lodu",
    "lawde", "bhosdike", "gaand", "lauda", "lund", "choot", "bhosda",
];

const DOMAIN_TERMS: &[&str] = &[
    // framing
    "problem", "solve", "solution", "issue", "challenge", "difficulty", "dilemma", "obstacle",
    "hurdle", "barrier", "bottleneck",
    // methodology
    "strategy", "approach", "method", "technique", "framework", "methodology", "process",
    "procedure", "system", "model",
    // analysis
    "analysis", "analyze", "evaluate", "assess", "examine", "investigate", "research", "study",
    "review", "consider",
    // decisions
    "decision", "choose", "select", "option", "alternative", "choice", "decide", "determine",
    "conclude", "judgment",
    // planning
    "plan", "planning", "goal", "objective", "target", "aim", "step", "steps", "phase", "stage",
    "milestone", "timeline",
    // skills
    "skill", "ability", "competence", "improve", "enhance", "develop", "learn", "master",
    "practice", "train",
    // optimization; "improve" and "enhance" appear in both groups and score twice
    "effective", "efficient", "optimize", "maximize", "minimize", "improve", "enhance", "better",
    "best", "optimal",
    // resolution
    "resolve", "overcome", "handle", "manage", "deal with", "tackle", "address", "fix", "repair",
    "correct",
    // thinking
    "creative", "innovation", "brainstorm", "idea", "concept", "thinking", "critical thinking",
    "logical", "rational",
    // collaboration
    "conflict", "negotiation", "communication", "leadership", "team", "collaboration",
    "productivity", "workflow", "project", "task", "deadline", "priority", "organize",
];

const OFF_TOPIC_TERMS: &[&str] = &[
    "stupid", "dumb", "idiot", "fool", "nonsense", "bullshit", "crap", "joke", "funny", "lol",
    "haha", "hehe", "lmao", "rofl", "lmfao",
    "what color", "favorite food", "favorite movie", "favorite song", "favorite book",
    "favorite actor", "favorite place", "best food",
    "weather", "movie", "song", "game", "sport", "celebrity", "actor", "actress", "singer",
    "cricket", "football", "drama", "tv show",
    "gossip", "love", "relationship", "dating", "marriage", "girlfriend", "boyfriend", "crush",
    "romance", "flirt", "beautiful", "handsome", "cute", "sexy", "hot", "attract",
    "age", "old", "young", "birthday", "party", "dance", "music", "height", "weight",
    "appearance", "look like",
    "facebook", "instagram", "twitter", "tiktok", "youtube", "snapchat", "whatsapp", "telegram",
    "social media",
    "politics", "election", "government", "minister", "president", "prime minister",
    "political party", "vote", "democracy",
    "conspiracy", "alien", "ufo", "ghost", "magic", "supernatural", "religion", "god", "allah",
    "prayer", "temple", "mosque", "church",
];

const LEAD_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "can", "should", "would", "could",
    "will", "do", "does", "is", "are", "was", "were", "have", "has", "had", "explain", "describe",
    "tell", "show", "help", "suggest",
];

/// Everything the rules look at, computed once per query.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    pub lower: String,
    pub char_count: usize,
    pub tokens: usize,
    pub has_lead_word: bool,
    pub has_question_mark: bool,
    pub domain_score: usize,
    pub off_topic_score: usize,
}

impl QueryFeatures {
    #[must_use]
    pub fn extract(query: &str) -> Self {
        let lower = query.trim().to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        Self {
            char_count: lower.chars().count(),
            tokens: tokens.len(),
            has_lead_word: tokens.iter().any(|t| LEAD_WORDS.contains(t)),
            has_question_mark: query.contains('?'),
            domain_score: count_terms(&lower, DOMAIN_TERMS),
            off_topic_score: count_terms(&lower, OFF_TOPIC_TERMS),
            lower,
        }
    }
}

/// Number of `terms` entries that occur as substrings of `text`. Repeated entries weigh more.
fn count_terms(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| text.contains(*term)).count()
}

pub struct Rule {
    pub name: &'static str,
    pub verdict: Verdict,
    predicate: fn(&QueryFeatures) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("verdict", &self.verdict)
            .finish_non_exhaustive()
    }
}

/// The cascade, in evaluation order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "too_short",
        verdict: Verdict::Deflect(DeflectReason::Malformed),
        predicate: |f| f.char_count < 3,
    },
    Rule {
        name: "greeting",
        verdict: Verdict::Deflect(DeflectReason::Greeting),
        predicate: |f| GREETING_PATTERNS.iter().any(|re| re.is_match(&f.lower)),
    },
    Rule {
        name: "abusive",
        verdict: Verdict::Deflect(DeflectReason::Abusive),
        predicate: |f| ABUSIVE_TERMS.iter().any(|term| f.lower.contains(term)),
    },
    Rule {
        name: "domain_relevant",
        verdict: Verdict::Answerable,
        predicate: |f| f.domain_score >= 2,
    },
    Rule {
        name: "off_topic",
        verdict: Verdict::Deflect(DeflectReason::OffTopic),
        predicate: |f| f.off_topic_score >= 1,
    },
    Rule {
        name: "terse_fragment",
        verdict: Verdict::Deflect(DeflectReason::Malformed),
        predicate: |f| f.tokens < 4 && !f.has_lead_word,
    },
    Rule {
        name: "structured_question",
        verdict: Verdict::Answerable,
        predicate: |f| {
            f.tokens >= 5 && f.has_lead_word && (f.domain_score >= 1 || f.has_question_mark)
        },
    },
    Rule {
        name: "short_statement",
        verdict: Verdict::Deflect(DeflectReason::Malformed),
        predicate: |f| f.tokens < 6 && !f.has_question_mark && !f.has_lead_word,
    },
];

/// Verdict plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub verdict: Verdict,
    /// `"default"` when no rule matched.
    pub rule: &'static str,
    pub ruleset_version: u32,
}

#[must_use]
pub fn explain(query: &str) -> Classification {
    let features = QueryFeatures::extract(query);
    let (verdict, rule) = RULES
        .iter()
        .find(|rule| (rule.predicate)(&features))
        .map_or((Verdict::Answerable, "default"), |rule| {
            (rule.verdict, rule.name)
        });

    tracing::debug!(
        rule,
        %verdict,
        domain_score = features.domain_score,
        off_topic_score = features.off_topic_score,
        tokens = features.tokens,
        "query classified"
    );
    Classification {
        verdict,
        rule,
        ruleset_version: RULESET_VERSION,
    }
}

/// Decide whether `query` should be answered from the document.
#[must_use]
pub fn classify(query: &str) -> Verdict {
    explain(query).verdict
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn reason(query: &str) -> Option<DeflectReason> {
        match classify(query) {
            Verdict::Answerable => None,
            Verdict::Deflect(r) => Some(r),
        }
    }

    #[test]
    fn hi_is_deflected() {
        assert!(!classify("hi").is_answerable());
        assert_eq!(explain("hi").rule, "too_short");
    }

    #[test]
    fn abuse_is_deflected() {
        assert_eq!(reason("fuck you"), Some(DeflectReason::Abusive));
    }

    #[test]
    fn domain_question_is_answerable() {
        let query =
            "What is the best strategy to overcome a difficult decision-making challenge at work?";
        assert_eq!(classify(query), Verdict::Answerable);
        assert_eq!(explain(query).rule, "domain_relevant");
    }

    #[test]
    fn weather_is_off_topic() {
        assert_eq!(reason("weather today"), Some(DeflectReason::OffTopic));
    }

    #[test]
    fn greetings() {
        for q in [
            "hello there",
            "Good morning!",
            "how are you doing",
            "what is your name",
            "who are you?",
            "Assalam o alaikum",
            "aap kaun ho",
        ] {
            assert_eq!(reason(q), Some(DeflectReason::Greeting), "{q}");
        }
    }

    #[test]
    fn greeting_needs_word_boundary() {
        // "this" contains "hi" but is not a greeting
        let query = "this method and this process work";
        assert_eq!(explain(query).rule, "domain_relevant");
    }

    #[test]
    fn whitespace_is_trimmed_before_length_check() {
        assert_eq!(explain("   ok   ").rule, "too_short");
        assert_eq!(explain("").rule, "too_short");
    }

    #[test]
    fn abuse_precedes_domain_score() {
        let query = "this stupid problem needs a solution";
        assert_eq!(reason(query), Some(DeflectReason::Abusive));
    }

    #[test]
    fn domain_score_precedes_off_topic() {
        let query = "how do I manage conflict in a football team";
        assert_eq!(classify(query), Verdict::Answerable);
    }

    #[test]
    fn improvement_terms_score_double() {
        for q in ["improve my dating life", "how to enhance my cricket game"] {
            let c = explain(q);
            assert_eq!(c.verdict, Verdict::Answerable, "{q}");
            assert_eq!(c.rule, "domain_relevant", "{q}");
        }
        assert_eq!(QueryFeatures::extract("improve").domain_score, 2);
        assert_eq!(QueryFeatures::extract("develop").domain_score, 1);
    }

    #[test]
    fn only_improvement_terms_repeat() {
        let mut sorted = DOMAIN_TERMS.to_vec();
        sorted.sort_unstable();
        let repeated: Vec<_> = sorted
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0])
            .collect();
        assert_eq!(repeated, ["enhance", "improve"]);
    }

    #[test]
    fn off_topic_substring_semantics() {
        // "age" inside "message" counts as off-topic
        assert_eq!(reason("send message now"), Some(DeflectReason::OffTopic));
    }

    #[test]
    fn terse_fragment_without_lead_word() {
        assert_eq!(explain("blue tables chairs").rule, "terse_fragment");
    }

    #[test]
    fn structured_question_with_question_mark() {
        let query = "why do rivers bend across flat plains?";
        assert_eq!(explain(query).rule, "structured_question");
    }

    #[test]
    fn short_statement_without_lead_word() {
        assert_eq!(explain("the river bends west").rule, "short_statement");
    }

    #[test]
    fn ambiguous_defaults_to_answerable() {
        let c = explain("rivers bend across wide flat plains near the coast");
        assert_eq!(c.verdict, Verdict::Answerable);
        assert_eq!(c.rule, "default");
        assert_eq!(c.ruleset_version, RULESET_VERSION);
    }

    #[test]
    fn vocabulary_has_no_duplicates() {
        for list in [ABUSIVE_TERMS, OFF_TOPIC_TERMS, LEAD_WORDS] {
            let mut sorted = list.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), list.len());
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn verdict_display() {
        assert_eq!(Verdict::Answerable.to_string(), "ANSWERABLE");
        assert_eq!(
            Verdict::Deflect(DeflectReason::OffTopic).to_string(),
            "DEFLECT (off-topic)"
        );
    }

    proptest! {
        #[test]
        fn classify_is_pure(query in ".{0,80}") {
            prop_assert_eq!(classify(&query), classify(&query));
        }

        #[test]
        fn short_queries_always_deflect(query in "[a-zA-Z0-9 ?!]{0,2}") {
            prop_assert!(!classify(&query).is_answerable());
        }
    }
}
