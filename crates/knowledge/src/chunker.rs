//! Turns a `BusinessInfo` into short, self-contained knowledge chunks.
//!
//! One chunk per structural section, rendered as labeled lines
//! (`Field: value`). Empty fields are left out and chunks of
//! `MIN_CHUNK_CHARS` characters or fewer are discarded.

use crate::types::{BusinessInfo, ContactInfo, FaqEntry, Product, Service};
use serde::{Deserialize, Serialize};

/// Chunks at or below this many characters carry no useful information.
pub const MIN_CHUNK_CHARS: usize = 10;

/// The structural section a chunk was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Company,
    Product,
    Service,
    Contact,
    Faq,
    KeyFeatures,
    TargetAudience,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Product => "product",
            Self::Service => "service",
            Self::Contact => "contact",
            Self::Faq => "faq",
            Self::KeyFeatures => "keyFeatures",
            Self::TargetAudience => "targetAudience",
        }
    }
}

/// A rendered chunk and the section it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSection {
    pub kind: SectionKind,
    pub text: String,
}

/// Render every non-trivial section, in the fixed section order.
pub fn sections(info: &BusinessInfo) -> Vec<KnowledgeSection> {
    let mut out = Vec::new();
    let mut push = |kind: SectionKind, text: String| {
        if text.chars().count() > MIN_CHUNK_CHARS {
            out.push(KnowledgeSection { kind, text });
        }
    };

    let company = &info.company;
    push(
        SectionKind::Company,
        render(&[
            ("Company", company.name.as_str()),
            ("Description", company.description.as_str()),
            ("Industry", company.industry.as_str()),
            ("Website", company.source_url.as_str()),
        ]),
    );

    for product in &info.products {
        push(SectionKind::Product, render_product(product));
    }

    for service in &info.services {
        push(SectionKind::Service, render_service(service));
    }

    if info.contact.has_any() {
        push(SectionKind::Contact, render_contact(&info.contact));
    }

    for entry in &info.faq {
        push(SectionKind::Faq, render_faq(entry));
    }

    let features = join_list(&info.key_features);
    if !features.is_empty() {
        push(SectionKind::KeyFeatures, format!("Key Features: {}", features));
    }

    let audience = info.target_audience.trim();
    if !audience.is_empty() {
        push(
            SectionKind::TargetAudience,
            format!("Target Audience: {}", audience),
        );
    }

    out
}

/// Chunk texts only, in section order.
pub fn chunk(info: &BusinessInfo) -> Vec<String> {
    sections(info).into_iter().map(|s| s.text).collect()
}

fn render_product(product: &Product) -> String {
    let features = join_list(&product.features);
    render(&[
        ("Product", product.name.as_str()),
        ("Description", product.description.as_str()),
        ("Features", features.as_str()),
        ("Pricing", product.pricing.as_deref().unwrap_or_default()),
    ])
}

fn render_service(service: &Service) -> String {
    let benefits = join_list(&service.benefits);
    render(&[
        ("Service", service.name.as_str()),
        ("Description", service.description.as_str()),
        ("Benefits", benefits.as_str()),
    ])
}

fn render_contact(contact: &ContactInfo) -> String {
    let social = join_list(&contact.social_links);
    let body = render(&[
        ("Email", contact.email.as_deref().unwrap_or_default()),
        ("Phone", contact.phone.as_deref().unwrap_or_default()),
        ("Address", contact.address.as_deref().unwrap_or_default()),
        ("Social Media", social.as_str()),
    ]);
    format!("Contact Information:\n{}", body)
}

fn render_faq(entry: &FaqEntry) -> String {
    render(&[("Q", entry.question.as_str()), ("A", entry.answer.as_str())])
}

/// `Label: value` lines for every non-blank value.
fn render(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .filter_map(|(label, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| format!("{}: {}", label, value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::TemplateAnalyzer;
    use crate::types::CompanyInfo;

    fn acme() -> BusinessInfo {
        BusinessInfo {
            company: CompanyInfo {
                name: "Acme".to_string(),
                ..Default::default()
            },
            products: vec![Product {
                name: "Widget".to_string(),
                features: vec!["fast".to_string(), "cheap".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_business_yields_two_chunks() {
        let chunks = chunk(&acme());
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("Acme"));
        assert!(chunks[1].contains("Widget"));
        assert!(chunks[1].contains("fast"));
        assert!(chunks[1].contains("cheap"));
        assert_eq!(chunks[1], "Product: Widget\nFeatures: fast, cheap");
    }

    #[test]
    fn test_section_order() {
        let info = TemplateAnalyzer::new().generate("https://acme.com", None);
        let kinds: Vec<SectionKind> = sections(&info).into_iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Company,
                SectionKind::Product,
                SectionKind::Service,
                SectionKind::Service,
                SectionKind::Contact,
                SectionKind::Faq,
                SectionKind::Faq,
                SectionKind::Faq,
                SectionKind::KeyFeatures,
                SectionKind::TargetAudience,
            ]
        );
    }

    #[test]
    fn test_rendered_formats() {
        let info = TemplateAnalyzer::new().generate("https://acme.com", None);
        let chunks = chunk(&info);
        assert!(chunks[0].starts_with("Company: Acme Solutions\nDescription: "));
        assert!(chunks[0].ends_with("Industry: Technology\nWebsite: https://acme.com"));
        assert!(chunks[1].ends_with("Pricing: Contact for pricing"));
        assert!(chunks[2].starts_with("Service: Web Development"));
        assert!(chunks[4].starts_with("Contact Information:\nEmail: contact@acme.com"));
        assert!(chunks[4].ends_with("Social Media: LinkedIn, Twitter, Facebook"));
        assert!(chunks[5].starts_with("Q: What services do you offer?\nA: "));
        assert!(chunks[8].starts_with("Key Features: Professional expertise, "));
        assert!(chunks[9].starts_with("Target Audience: "));
    }

    #[test]
    fn test_empty_sections_skipped() {
        let info = BusinessInfo::default();
        assert!(chunk(&info).is_empty());

        let info = BusinessInfo {
            key_features: vec!["  ".to_string()],
            target_audience: "   ".to_string(),
            contact: ContactInfo {
                social_links: vec![String::new()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(chunk(&info).is_empty());
    }

    #[test]
    fn test_short_chunks_discarded() {
        let info = BusinessInfo {
            faq: vec![FaqEntry {
                question: "Hi".to_string(),
                answer: "Y".to_string(),
            }],
            ..Default::default()
        };
        // "Q: Hi\nA: Y" is exactly ten characters.
        assert!(chunk(&info).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let info = TemplateAnalyzer::new().generate("https://acme.com", Some("pricing"));
        assert_eq!(chunk(&info), chunk(&info));
    }
}
