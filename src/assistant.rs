// --- Rule table ---

/// A canned answer, given when any of its keywords appears in the question.
/// Keywords carry spaces where they must sit on a word edge.
struct Rule {
    keywords: &'static [&'static str],
    answer: &'static str,
}

// First match wins, so narrower topics go before broader ones.
const RULES: &[Rule] = &[
    Rule {
        keywords: &[" hello", " hi ", " hey "],
        answer: "Hi! Ask me about pH, water temperature, EC, ammonia, fish or plants.",
    },
    Rule {
        keywords: &[" ph low", " low ph ", " acidic"],
        answer: "Low pH: add a buffer such as potassium carbonate or calcium carbonate in small doses and re-test after a few hours.",
    },
    Rule {
        keywords: &[" ph high", " high ph ", " alkaline"],
        answer: "High pH: nitrification lowers pH over time; if you need to correct faster, use small doses of a pH-down suitable for aquaponics.",
    },
    Rule {
        keywords: &[" ph "],
        answer: "Keep pH between 6.8 and 7.2 as a compromise between fish, plants and nitrifying bacteria.",
    },
    Rule {
        keywords: &[" temperature", " temp ", " temps ", " hot ", " cold "],
        answer: "Most aquaponic systems run best at 22-29 C. Warm water holds less oxygen, so add aeration when it rises.",
    },
    Rule {
        keywords: &[" ec ", " ppm", " conductivity", " nutrient"],
        answer: "Aim for an EC of roughly 0.6-1.2 mS/cm (300-600 ppm). Low readings may mean the fish load is too light for your plants.",
    },
    Rule {
        keywords: &[" ammonia", " nitrite", " cycling"],
        answer: "Ammonia or nitrite above 1 ppm is stressful for fish. Reduce feeding, increase aeration and check your biofilter.",
    },
    Rule {
        keywords: &[" oxygen", " aeration", " dissolved"],
        answer: "Keep dissolved oxygen above 5 mg/L. Air stones and good water movement are the usual fix.",
    },
    Rule {
        keywords: &[" fish", " feed", " tilapia"],
        answer: "Feed what the fish finish in about five minutes, once or twice a day. Remove uneaten food.",
    },
    Rule {
        keywords: &[" plant", " yellow", " leaves", " aphid", " pest"],
        answer: "Yellowing leaves often point to iron deficiency; chelated iron is safe for fish. For pests, use ladybugs or neem carefully away from the water.",
    },
    Rule {
        keywords: &[" sensor", " calibrat"],
        answer: "Calibrate pH probes monthly with fresh buffer solutions and rinse them between readings.",
    },
];

const FALLBACK: &str =
    "I'm not sure about that one. Try asking about pH, temperature, EC, ammonia, oxygen, fish or plants.";

/// Answers a question from the rule table.
pub fn respond(question: &str) -> &'static str {
    // Punctuation becomes a word break and the ends are padded, so " hot "
    // matches "too hot?" but not "shot".
    let words: Vec<String> = question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let text = format!(" {} ", words.join(" "));
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
        .map(|rule| rule.answer)
        .unwrap_or(FALLBACK)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Default)]
pub struct Conversation {
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn ask(&mut self, question: &str) -> &str {
        let question = question.trim();
        self.messages.push(ChatMessage {
            role: "user",
            content: question.to_string(),
        });
        self.messages.push(ChatMessage {
            role: "assistant",
            content: respond(question).to_string(),
        });
        &self.messages[self.messages.len() - 1].content
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
