//! Deterministic synthetic responses.
//!
//! When every provider in a chain fails, the router answers with
//! pre-authored text chosen from the request's topic. Categories are
//! checked in a fixed order against the lowercased request text and the
//! first category with a matching keyword wins.

use airelay_types::provider::UseCase;
use airelay_types::routing::FallbackCategory;

/// Keyword table in match order.
const CATEGORY_KEYWORDS: &[(FallbackCategory, &[&str])] = &[
    (
        FallbackCategory::Pricing,
        &["budget", "cost", "price", "pricing", "quote", "estimate"],
    ),
    (
        FallbackCategory::Surveillance,
        &["camera", "surveillance", "video", "cctv", "nvr"],
    ),
    (
        FallbackCategory::AccessControl,
        &["access", "door", "entry", "badge", "credential"],
    ),
    (
        FallbackCategory::Compliance,
        &["compliance", "hipaa", "pci", "ferpa", "cjis", "regulation", "nfpa"],
    ),
    (
        FallbackCategory::Timeline,
        &["timeline", "schedule", "deadline", "how long", "install"],
    ),
    (
        FallbackCategory::Technical,
        &["technical", "spec", "integration", "network", "bandwidth", "storage"],
    ),
    (FallbackCategory::GettingStarted, &["help", "start", "begin"]),
];

/// A canned answer and the category that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticResponse {
    pub category: FallbackCategory,
    pub text: String,
}

/// First matching keyword category, or `General`.
pub fn detect_category(text: &str) -> FallbackCategory {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FallbackCategory::General)
}

/// Build the synthetic answer for a request. Total and side-effect free.
pub fn synthetic_response(use_case: UseCase, text: &str) -> SyntheticResponse {
    let category = detect_category(text);
    let body = category_body(category);
    let text = match lead_in(use_case) {
        Some(lead) => format!("{lead}\n\n{body}"),
        None => body.to_string(),
    };
    SyntheticResponse { category, text }
}

fn lead_in(use_case: UseCase) -> Option<&'static str> {
    match use_case {
        UseCase::General | UseCase::Chatbot => None,
        UseCase::Assessment => Some(
            "Automated assessment generation is temporarily unavailable, so here is general guidance to keep your project moving.",
        ),
        UseCase::Analysis => Some(
            "Document analysis is temporarily unavailable. Your upload is safe; here is general guidance in the meantime.",
        ),
        UseCase::Search => Some("Search assistance is temporarily unavailable. Here is what we can share right now."),
        UseCase::CreativeWriting | UseCase::CreativeImage | UseCase::CreativeResearch => Some(
            "The creative studio assistant is temporarily unavailable. Here is some guidance to get you started.",
        ),
    }
}

fn category_body(category: FallbackCategory) -> &'static str {
    match category {
        FallbackCategory::Pricing => {
            "**Budget Planning for Security Systems**

Security implementations typically fall into these ranges:
- **Basic Package**: $15,000 - $50,000 (essential cameras and access control)
- **Professional Package**: $50,000 - $150,000 (comprehensive coverage with analytics)
- **Enterprise Package**: $150,000+ (advanced analytics, integration and compliance features)

An accurate estimate depends on facility size and layout, the number of entry points and monitored areas, integration with existing systems, and the compliance standards that apply."
        }
        FallbackCategory::Surveillance => {
            "**Video Surveillance Considerations**

Effective surveillance design looks at:
- **Coverage areas**: entry points, high-value zones, perimeter
- **Camera types**: fixed, PTZ, thermal, license plate recognition
- **Resolution**: 4K for identification, 1080p for general monitoring
- **Retention**: 30-90 days is typical
- **Analytics**: motion detection and behavioural analysis

Which areas need priority coverage, and do you need 24/7 or business-hours monitoring?"
        }
        FallbackCategory::AccessControl => {
            "**Access Control System Planning**

Modern access control provides:
- **Card and mobile credentials** that are convenient and trackable
- **Biometric options** for high-security areas
- **Integration** with video, alarms and visitor management
- **Audit trails** of who accessed what, and when

How many doors need electronic access control, and do any areas require multi-factor authentication?"
        }
        FallbackCategory::Compliance => {
            "**Compliance Requirements**

Security designs are commonly shaped by:
- **HIPAA** for healthcare facilities handling patient information
- **PCI DSS** for areas that process payment card data
- **FERPA** for educational records
- **CJIS** for criminal justice information
- **NFPA** life-safety codes for egress and door hardware

Tell us your industry and facility type and we will map the standards that apply to your project."
        }
        FallbackCategory::Timeline => {
            "**Project Timeline**

Typical phases for a security project:
- **Discovery and site survey**: 1-2 weeks
- **Design and proposal**: 1-3 weeks
- **Procurement**: 2-6 weeks depending on equipment
- **Installation and commissioning**: 1-4 weeks per site

Hard deadlines such as an opening date or an audit should be shared early so the schedule can be built around them."
        }
        FallbackCategory::Technical => {
            "**Technical Planning**

Key technical considerations include:
- **Network**: PoE switch capacity, VLAN separation and bandwidth per camera stream
- **Storage**: retention period multiplied by stream bitrate and camera count
- **Integration**: video management, access control and alarm platforms
- **Power**: UPS sizing for head-end equipment

Share your existing infrastructure and we can check compatibility before the design is finalised."
        }
        FallbackCategory::GettingStarted => {
            "I'd be happy to help with your security discovery process. Let's start with your facility and security needs.

**To begin, could you tell me:**
- What type of facility are we securing? (office, retail, warehouse, healthcare, etc.)
- What are your primary security concerns?
- Do you have any specific compliance requirements?"
        }
        FallbackCategory::General => {
            "I'm having trouble reaching our AI services right now, but I can still point you in the right direction.

We commonly help with:
- **Video surveillance** design and coverage planning
- **Access control** for doors, gates and sensitive areas
- **Perimeter security** and intrusion detection
- **System integration** across video, access and alarms
- **Compliance** requirements such as HIPAA and PCI

Please try again in a moment, or tell us more about your facility and goals."
        }
    }
}
