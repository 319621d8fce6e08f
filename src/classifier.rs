//! Keyword-based smart responses.
//!
//! Categories are tested in a fixed priority order and the first one whose
//! keywords appear anywhere in the lower-cased text wins. Matching is a
//! plain substring test, so "shelp" matches "help".

/// Reply categories, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Greeting,
    Features,
    Help,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Greeting, Category::Features, Category::Help];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Greeting => &["hello", "hi", "hey", "greetings"],
            Category::Features => &["feature", "features", "what can you do", "capabilities"],
            Category::Help => &["help", "support", "assist"],
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Category::Greeting => {
                "👋 <b>Hello!</b> How can I help you today? Try asking me about my features!"
            }
            Category::Features => {
                "🚀 <b>I have many features!</b>\n\n\
                 • AI-powered conversations\n\
                 • File processing\n\
                 • User management\n\
                 • Analytics\n\
                 • Admin tools\n\n\
                 Type /features to see everything!"
            }
            Category::Help => {
                "🆘 <b>Need help?</b>\n\n\
                 Type /help for command list\n\
                 Type /features for feature list\n\
                 Type /contact for support"
            }
        }
    }

    fn matches(self, lowered: &str) -> bool {
        self.keywords().iter().any(|word| lowered.contains(word))
    }
}

/// First category whose keywords occur in `text`, if any
pub fn categorize(text: &str) -> Option<Category> {
    let lowered = text.to_lowercase();
    Category::ALL.into_iter().find(|c| c.matches(&lowered))
}

/// Reply for a free-text message. Never fails.
///
/// The fallback reply echoes `text` HTML-escaped (`&`, `<`, `>`), since
/// every reply is sent with HTML parse mode.
pub fn classify(text: &str) -> String {
    match categorize(text) {
        Some(category) => category.template().to_string(),
        None => default_reply(text),
    }
}

fn default_reply(text: &str) -> String {
    // Replies go out as HTML; only markup characters are touched.
    let echoed = html_escape::encode_text(text);
    format!(
        "🤖 <b>Smart Response</b>\n\n\
         You said: \"<i>{}</i>\"\n\n\
         That's interesting! I'm an AI-powered bot that can help with various tasks. \
         Try asking me about:\n\n\
         • My features and capabilities\n\
         • File processing\n\
         • User statistics\n\
         • Admin functions\n\n\
         Type /help to see all available commands!",
        echoed
    )
}
