//! Reference text injected verbatim into every system prompt. Loaded
//! once at startup and shared read-only for the life of the process.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

pub const KNOWLEDGE_BASE: &str = r"
AMRITA VISHWA VIDYAPEETHAM - COIMBATORE CAMPUS

UNIVERSITY OVERVIEW:
- Established: 2003, A++ NAAC accredited multidisciplinary university
- Campus Size: 400+ acres, main campus of Amrita Vishwa Vidyapeetham
- Location: Ettimadai, Coimbatore, Tamil Nadu, India
- University Type: Private, Deemed-to-be University status

ACADEMIC PROGRAMS:
Engineering: CSE, ECE, Mechanical, Civil, Aerospace, AI & Data Science, Cybersecurity
Sciences: Physics, Chemistry, Mathematics, Biotechnology, Microbiology
Business: MBA, BBA with various specializations
Arts & Humanities: English, Psychology, Social Work
Medicine: MBBS, Nursing, Physiotherapy, Allied Health Sciences

CAMPUS FACILITIES:
- Separate hostels for boys and girls with 24/7 security
- Central library with 2+ lakh books and digital resources
- State-of-the-art laboratories and research centers
- Sports complex: Cricket, Football, Basketball, Tennis, Swimming
- Medical center with qualified doctors and ambulance service
- Banking and ATM facilities on campus

RESEARCH & INNOVATION:
- Centers of Excellence in AI, Robotics, Cybersecurity
- Live-in-Labs program for rural development
- International collaborations with top universities
- Patent filing and technology transfer support
- Student research opportunities from undergraduate level

STUDENT LIFE:
- Cultural festivals: Anokha (technical), Shristi (cultural)
- 100+ student clubs and organizations
- Sports teams competing at national level
- International exchange programs
- Placement assistance with 90%+ placement rate

CONTACT INFORMATION:
- Phone: +91-422-2685000
- Email: coimbatore@amrita.edu
- Website: www.amrita.edu
- Address: Amrita Vishwa Vidyapeetham, Ettimadai, Coimbatore - 641112
";

/// Immutable knowledge text. Cloning shares the same allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeBase(Arc<str>);

impl KnowledgeBase {
    pub fn new(text: &str) -> Self {
        Self(Arc::from(text))
    }

    /// Reads the knowledge text from a file, replacing the built-in
    /// text entirely.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base from {}", path.display()))?;
        if text.trim().is_empty() {
            bail!("Knowledge base file {} is empty", path.display());
        }
        tracing::info!("Loaded knowledge base from {} ({} bytes)", path.display(), text.len());
        Ok(Self::new(&text))
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(KNOWLEDGE_BASE)
    }
}
