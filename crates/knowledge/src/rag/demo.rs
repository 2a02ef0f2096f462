//! The built-in demonstration persona and its fixed knowledge.

use super::{Persona, PersonaKind};
use dot_core::{ChatSettings, LlmSettings};

/// Reserved tenant id that selects the demo persona.
pub const DEMO_TENANT_ID: &str = "demo";

/// Passages returned per demo query.
const DEMO_PASSAGE_LIMIT: usize = 3;

pub(crate) const DEMO_DESCRIPTION: &str = "You are Dot, the AI assistant for the Dot SaaS platform. Dot is a platform that allows businesses to create and embed AI chatbots on their websites. You should explain how Dot works, its features, benefits, and how businesses can use it to improve their website engagement.";

const DEMO_KNOWLEDGE: &[(&str, [&str; 2])] = &[
    ("what is dot", [
        "Dot is a SaaS platform that allows businesses to create and embed AI chatbots on their websites. It provides a simple way to add intelligent conversations to any website instantly.",
        "Dot is an AI chatbot platform that helps businesses engage with their website visitors through intelligent conversations. You can create custom chatbots and embed them on your website.",
    ]),
    ("how does dot work", [
        "Dot works by allowing you to create a chatbot with custom knowledge, then embed it on your website using a simple JavaScript snippet. The chatbot can answer questions about your business, products, or services.",
        "To use Dot: 1) Create a chatbot with your business information, 2) Customize its appearance and behavior, 3) Get an embed code, 4) Add it to your website. The chatbot will then help visitors with questions.",
    ]),
    ("features", [
        "Dot features include: Custom AI chatbots, knowledge base management, website embedding, conversation analytics, multiple chatbot themes, real-time chat, and easy setup process.",
        "Key features of Dot: AI-powered responses, customizable appearance, knowledge base integration, conversation history, analytics dashboard, and simple embed process.",
    ]),
    ("pricing", [
        "Dot offers flexible pricing plans based on usage and features. Contact us for custom pricing tailored to your business needs.",
        "Pricing varies based on the number of chatbots, conversations, and features you need. We offer competitive rates for businesses of all sizes.",
    ]),
    ("embed", [
        "To embed Dot on your website, you get a simple JavaScript snippet after creating your chatbot. Just paste this code into your website and the chatbot will appear.",
        "Embedding is easy: create your chatbot, copy the provided embed code, and paste it into your website HTML. The chatbot will automatically appear and start helping visitors.",
    ]),
    ("setup", [
        "Setting up Dot is simple: 1) Sign up for an account, 2) Create your first chatbot, 3) Add your business knowledge, 4) Customize the appearance, 5) Get your embed code and add it to your website.",
        "Getting started with Dot takes just a few minutes: create an account, build your chatbot with your business information, customize it, and embed it on your website.",
    ]),
    ("ai", [
        "Dot uses advanced AI technology to understand and respond to visitor questions. The AI is trained on your business knowledge to provide accurate and helpful responses.",
        "Our AI technology can understand natural language questions and provide intelligent responses based on your business information and knowledge base.",
    ]),
    ("chatbot", [
        "A Dot chatbot is an AI assistant that can answer questions about your business, products, or services. It helps engage website visitors and provide instant support.",
        "Dot chatbots are intelligent AI assistants that can handle customer inquiries, provide product information, and help with common questions 24/7.",
    ]),
    ("business", [
        "Dot helps businesses improve customer engagement, reduce support workload, and provide instant answers to common questions. It's perfect for e-commerce, service businesses, and any company with a website.",
        "Businesses use Dot to: increase customer engagement, provide 24/7 support, answer frequently asked questions, generate leads, and improve customer satisfaction.",
    ]),
    ("website", [
        "Dot can be embedded on any website using a simple JavaScript code. It works with all major website platforms and content management systems.",
        "You can add Dot to any website - whether it's built with WordPress, Shopify, custom code, or any other platform. Just paste the embed code and you're ready to go.",
    ]),
    ("help", [
        "Dot helps businesses by providing instant customer support, answering common questions, generating leads, and improving overall customer experience on their website.",
        "Dot helps by: reducing support ticket volume, providing instant answers to customers, improving website engagement, and helping convert visitors into customers.",
    ]),
];

const GENERAL_PASSAGES: [&str; 2] = [
    "Dot is a SaaS platform that allows businesses to create and embed AI chatbots on their websites. It provides intelligent conversations to help engage visitors and provide instant support.",
    "With Dot, you can create custom AI chatbots with your business knowledge, customize their appearance, and easily embed them on any website to improve customer engagement.",
];

/// The demo persona. Model parameters come from configuration.
pub fn demo_persona(llm: &LlmSettings, chat: &ChatSettings) -> Persona {
    Persona {
        name: "Dot AI Assistant".to_string(),
        context: Some(
            "Dot is a SaaS platform that allows businesses to create and embed AI chatbots on their websites."
                .to_string(),
        ),
        model: llm.model.clone(),
        temperature: chat.default_temperature,
        max_tokens: chat.default_max_tokens,
        kind: PersonaKind::Demo,
    }
}

/// Demo passages for `query`: every topic whose keyword contains the query
/// or is contained in it, at most three passages, general passages when
/// nothing matches.
pub fn demo_knowledge(query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();

    let mut passages: Vec<&str> = if query.is_empty() {
        Vec::new()
    } else {
        DEMO_KNOWLEDGE
            .iter()
            .filter(|(keyword, _)| keyword.contains(query.as_str()) || query.contains(keyword))
            .flat_map(|(_, content)| content.iter().copied())
            .collect()
    };

    if passages.is_empty() {
        passages.extend(GENERAL_PASSAGES);
    }

    passages
        .into_iter()
        .take(DEMO_PASSAGE_LIMIT)
        .map(str::to_string)
        .collect()
}
