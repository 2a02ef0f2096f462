//! Keyword-matched replies used when generation is unavailable.

struct Topic {
    keywords: &'static [&'static str],
    whole_word: bool,
    replies: &'static [&'static str],
}

impl Topic {
    const fn any(keywords: &'static [&'static str], replies: &'static [&'static str]) -> Self {
        Self {
            keywords,
            whole_word: false,
            replies,
        }
    }

    fn matches(&self, message: &str, words: &[&str]) -> bool {
        self.keywords.iter().any(|keyword| {
            if self.whole_word {
                words.contains(keyword)
            } else {
                message.contains(keyword)
            }
        })
    }
}

const DEMO_TOPICS: &[Topic] = &[
    Topic::any(
        &["what is dot", "what is this", "explain dot"],
        &["Dot is a SaaS platform that allows businesses to create and embed AI chatbots on their websites. It provides intelligent conversations to help engage visitors and provide instant support. You can create custom chatbots with your business knowledge and easily embed them on any website."],
    ),
    Topic::any(
        &["how does", "how to", "setup", "get started"],
        &["Getting started with Dot is simple: 1) Sign up for an account, 2) Create your first chatbot, 3) Add your business knowledge, 4) Customize the appearance, 5) Get your embed code and add it to your website. The whole process takes just a few minutes!"],
    ),
    Topic::any(
        &["features", "what can", "capabilities"],
        &["Dot features include: Custom AI chatbots, knowledge base management, website embedding, conversation analytics, multiple chatbot themes, real-time chat, and easy setup process. You can customize everything from appearance to behavior."],
    ),
    Topic::any(
        &["pricing", "cost", "price"],
        &["Dot offers flexible pricing plans based on usage and features. We have competitive rates for businesses of all sizes. Contact us for custom pricing tailored to your specific needs and requirements."],
    ),
    Topic::any(
        &["embed", "website", "add to site"],
        &["To embed Dot on your website, you get a simple JavaScript snippet after creating your chatbot. Just paste this code into your website and the chatbot will appear. It works with all major platforms like WordPress, Shopify, and custom websites."],
    ),
    Topic::any(
        &["ai", "artificial intelligence", "technology"],
        &["Dot uses advanced AI technology to understand and respond to visitor questions. The AI is trained on your business knowledge to provide accurate and helpful responses. It can handle natural language conversations and learn from interactions."],
    ),
    Topic::any(
        &["business", "company", "help"],
        &["Dot helps businesses improve customer engagement, reduce support workload, and provide instant answers to common questions. It's perfect for e-commerce, service businesses, and any company with a website. You can increase conversions and customer satisfaction."],
    ),
];

const GENERAL_TOPICS: &[Topic] = &[
    Topic {
        keywords: &["hello", "hi", "hey"],
        whole_word: true,
        replies: &[
            "Hello! I'm here to help you with any questions about our services.",
            "Hi there! How can I assist you today?",
            "Welcome! I'm ready to help you find the information you need.",
        ],
    },
    Topic::any(
        &["web development", "website", "web app", "frontend", "backend"],
        &["We specialize in modern web development! We build responsive websites, web applications, and full-stack solutions using technologies like React, Next.js, Node.js, and more. Our web development services include custom UI/UX design, API development, database integration, and deployment. What type of web project do you have in mind?"],
    ),
    Topic::any(
        &["ai", "artificial intelligence", "machine learning"],
        &["Our AI solutions include custom AI model development, chatbot integration, data analysis, and AI-powered automation. We can help you implement AI features like natural language processing, computer vision, or predictive analytics. What AI capabilities are you looking to add to your business?"],
    ),
    Topic::any(
        &["service", "what do you do", "offer"],
        &[
            "We offer a comprehensive range of services including web development, AI solutions, and digital consulting. What specific area are you interested in?",
            "Our services include custom software development, AI integration, and digital transformation consulting. Would you like to know more about any particular service?",
            "We provide web development, AI solutions, and business consulting services. Which area would you like to explore?",
        ],
    ),
    Topic::any(
        &["price", "cost", "how much"],
        &[
            "Our pricing varies based on project scope and requirements. Would you like to schedule a consultation to discuss your specific needs?",
            "We offer competitive pricing tailored to each project. Let me know what you're looking for and I can provide more specific information.",
            "Pricing depends on the complexity and scope of your project. I'd be happy to connect you with our team for a detailed quote.",
        ],
    ),
    Topic::any(
        &["contact", "email", "phone", "reach"],
        &[
            "You can reach us at contact@company.com or call us at +1-555-0123. We're available Monday through Friday, 9 AM to 6 PM.",
            "Feel free to contact us via email at hello@company.com or give us a call at +1-555-0123. We'd love to hear from you!",
            "You can get in touch with us at info@company.com or call +1-555-0123. We're here to help!",
        ],
    ),
    Topic::any(
        &["technology", "tech stack", "framework"],
        &["We work with modern technologies including React, Next.js, Node.js, Python, TypeScript, and various cloud platforms. Our tech stack is chosen based on your specific project requirements and goals. What technologies are you interested in?"],
    ),
    Topic::any(
        &["timeline", "how long", "duration"],
        &["Project timelines vary depending on complexity. A simple website might take 2-4 weeks, while a complex web application could take 2-6 months. We'll provide a detailed timeline during our initial consultation. When are you looking to launch?"],
    ),
    Topic::any(
        &["portfolio", "examples", "work"],
        &["We'd be happy to show you examples of our work! We have case studies and portfolio pieces across web development, AI solutions, and digital consulting. Would you like to see specific examples in any particular area?"],
    ),
];

const DEFAULT_REPLIES: &[&str] = &[
    "That's an interesting question! Let me connect you with our team for more detailed information.",
    "I'd be happy to help with that. Could you provide a bit more context so I can give you the best possible answer?",
    "Great question! Let me gather some more information to provide you with a comprehensive response.",
];

/// Canned reply for `message`. The demo table is consulted first when
/// `demo` is set. Always returns non-empty text.
pub fn canned_response(message: &str, demo: bool) -> &'static str {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let demo_topics: &[Topic] = if demo { DEMO_TOPICS } else { &[] };

    let replies = demo_topics
        .iter()
        .chain(GENERAL_TOPICS)
        .find(|topic| topic.matches(&lowered, &words))
        .map(|topic| topic.replies)
        .unwrap_or(DEFAULT_REPLIES);

    pick(replies, &lowered)
}

/// Deterministic variant choice.
fn pick(replies: &'static [&'static str], message: &str) -> &'static str {
    let hash = message
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    replies[hash as usize % replies.len()]
}
