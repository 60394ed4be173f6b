//! Fixed chat copy and the example prompt shortcuts.

pub const GREETING: &str = "👋 Hi there! I'm your friendly movie recommender. Let me know what genre or type of movie you're in the mood for, and I'll suggest the best options!";

pub const NO_RESULTS_TURN: &str = "No movies found. Try again with different keywords!";
pub const RESULTS_TURN: &str = "Here's your recommendation:";
pub const SUMMARY_PREFIX: &str = "Based on your search, here's what I recommend: ";

/// Shown while a cycle runs. Never recorded in the conversation.
pub const FOUND_NOTICE: &str = "Here's what I found for you!";
pub const GENERATING_NOTICE: &str = "Generating your tailored recommendation...";

pub const SIDEBAR_TITLE: &str = "🎬 Movie Magic Hub";
pub const SIDEBAR_SUBHEADER: &str = "Your AI-powered Film Recommender 🎥";
pub const SIDEBAR_INTRO: &str = "Looking for the perfect movie for your night? Powered by Weaviate & AI, we've got you covered. Tell us what you're in the mood for, and we'll suggest something fantastic!";
/// Shown once the client is built; secrets were present by then.
pub const CONNECTED_STATUS: &str = "Connected to Weaviate successfully!";
pub const CONNECTED_ICON: &str = "💚";

pub const QUERY_PLACEHOLDER: &str = "E.g., action, romance, documentary...";
pub const OCCASION_PLACEHOLDER: &str = "E.g., movie night with friends, date night...";

/// `I'm looking for a **<query>** movie.` plus the occasion sentence when one
/// was given.
pub fn user_message(query: &str, occasion: &str) -> String {
    let mut message = format!("I'm looking for a **{query}** movie.");
    if !occasion.is_empty() {
        message.push_str(&format!(" It's for a **{occasion}**."));
    }
    message
}

pub fn no_results_notice(query: &str, mode_label: &str) -> String {
    format!(
        "Sorry, no movies matched your search for {query} using {mode_label} mode. Try adjusting your search!"
    )
}

/// The summary turn text: prefix, then every word followed by one space.
pub fn summary_turn(passage: &str) -> String {
    let mut content = String::from(SUMMARY_PREFIX);
    for word in passage.split_whitespace() {
        content.push_str(word);
        content.push(' ');
    }
    content
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamplePrompt {
    pub movie_type: &'static str,
    pub occasion: &'static str,
    pub help: &'static str,
}

impl ExamplePrompt {
    /// Button text: `<type> for <occasion>`.
    pub fn label(&self) -> String {
        format!("{} for {}", self.movie_type, self.occasion)
    }
}

pub const EXAMPLES: [ExamplePrompt; 6] = [
    ExamplePrompt {
        movie_type: "Sci-fi adventure",
        occasion: "movie night with friends",
        help: "Looking for sci-fi adventures? Perfect for a group movie night!",
    },
    ExamplePrompt {
        movie_type: "Romantic comedy",
        occasion: "date night",
        help: "Romantic comedies for the perfect date night.",
    },
    ExamplePrompt {
        movie_type: "Animated family film",
        occasion: "family viewing",
        help: "Animated films for a fun family evening.",
    },
    ExamplePrompt {
        movie_type: "Classic thriller",
        occasion: "solo movie night",
        help: "Thrillers that'll keep you on the edge of your seat, just for you.",
    },
    ExamplePrompt {
        movie_type: "Historical drama",
        occasion: "educational evening",
        help: "Dramatic and educational movies to broaden your horizons.",
    },
    ExamplePrompt {
        movie_type: "Indie comedy-drama",
        occasion: "film club discussion",
        help: "Indie gems to spark discussions at your film club.",
    },
];

pub fn example(index: usize) -> Option<&'static ExamplePrompt> {
    EXAMPLES.get(index)
}
