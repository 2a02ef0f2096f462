//! Deterministic placeholder analyzer.

use super::BusinessAnalyzer;
use crate::types::{BusinessInfo, CompanyInfo, ContactInfo, FaqEntry, Product, Service};
use dot_core::AppResult;

/// Builds plausible placeholder knowledge from the URL's host alone.
///
/// Pure function of its inputs; never fails.
#[derive(Debug, Default, Clone)]
pub struct TemplateAnalyzer;

impl TemplateAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, url: &str, custom_instructions: Option<&str>) -> BusinessInfo {
        let host = host_of(url);
        let label = host.split('.').next().unwrap_or_default();

        let mut description =
            "A professional company providing digital solutions and services.".to_string();
        if let Some(focus) = custom_instructions.map(str::trim).filter(|s| !s.is_empty()) {
            description.push_str(" Custom focus: ");
            description.push_str(focus);
        }

        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        BusinessInfo {
            company: CompanyInfo {
                name: format!("{} Solutions", capitalize(label)),
                description,
                industry: "Technology".to_string(),
                source_url: url.to_string(),
            },
            products: vec![Product {
                name: "Digital Platform".to_string(),
                description: "Comprehensive digital solution for businesses".to_string(),
                features: strings(&[
                    "User-friendly interface",
                    "Scalable architecture",
                    "24/7 support",
                ]),
                pricing: Some("Contact for pricing".to_string()),
            }],
            services: vec![
                Service {
                    name: "Web Development".to_string(),
                    description: "Custom website and web application development".to_string(),
                    benefits: strings(&["Responsive design", "SEO optimized", "Fast loading"]),
                },
                Service {
                    name: "Digital Consulting".to_string(),
                    description: "Strategic digital transformation consulting".to_string(),
                    benefits: strings(&["Expert guidance", "Custom solutions", "Ongoing support"]),
                },
            ],
            contact: ContactInfo {
                email: Some(format!("contact@{}", host)),
                phone: Some("+1 (555) 123-4567".to_string()),
                address: Some("123 Business Street, Tech City, TC 12345".to_string()),
                social_links: strings(&["LinkedIn", "Twitter", "Facebook"]),
            },
            faq: vec![
                FaqEntry {
                    question: "What services do you offer?".to_string(),
                    answer: "We offer comprehensive digital solutions including web development, consulting, and ongoing support.".to_string(),
                },
                FaqEntry {
                    question: "How can I get started?".to_string(),
                    answer: "Contact us through our website or email to discuss your project requirements and get a custom quote.".to_string(),
                },
                FaqEntry {
                    question: "Do you provide ongoing support?".to_string(),
                    answer: "Yes, we provide 24/7 support and maintenance services for all our clients.".to_string(),
                },
            ],
            key_features: strings(&[
                "Professional expertise",
                "Custom solutions",
                "Ongoing support",
                "Modern technology stack",
            ]),
            target_audience:
                "Businesses looking for digital transformation and web development services"
                    .to_string(),
        }
    }
}

#[async_trait::async_trait]
impl BusinessAnalyzer for TemplateAnalyzer {
    fn name(&self) -> &str {
        "template"
    }

    async fn analyze(&self, url: &str, custom_instructions: Option<&str>) -> AppResult<BusinessInfo> {
        tracing::info!(url, "Using template analyzer");
        Ok(self.generate(url, custom_instructions))
    }
}

/// Host part of a URL: no scheme, credentials, path, query, port or leading `www.`.
pub(crate) fn host_of(url: &str) -> String {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = authority.split(':').next().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Business".to_string(),
    }
}
