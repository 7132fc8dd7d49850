use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub name: String,
    pub category: String,
    pub time_period: String,
    pub creation_date: String,
    pub original_purpose: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModernStatus {
    #[serde(rename = "bekannt", alias = "known")]
    Known,
    #[serde(rename = "vergessen", alias = "forgotten")]
    Forgotten,
    #[serde(rename = "verdrängt", alias = "displaced", alias = "verdraengt")]
    Displaced,
}

impl ModernStatus {
    pub fn label(self) -> &'static str {
        match self {
            ModernStatus::Known => "bekannt",
            ModernStatus::Forgotten => "vergessen",
            ModernStatus::Displaced => "verdrängt",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evolution {
    #[serde(default)]
    pub historical_changes: Vec<String>,
    pub modern_status: ModernStatus,
    #[serde(default)]
    pub replaced_by: Option<String>,
    pub cultural_significance: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub title: String,
    /// First-person short narrative; always rendered.
    pub narrative: String,
    #[serde(default)]
    pub long_narrative: Option<String>,
    #[serde(default)]
    pub key_moments: Vec<String>,
    #[serde(default)]
    pub deductions: Option<Vec<String>>,
    #[serde(default)]
    pub detail_highlights: Option<Vec<String>>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Timeline year: the AI sends either a number (`1850`) or free text (`"um 1900"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(f64),
    Text(String),
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Number(n) => f.write_str(&format_number(*n)),
            Year::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub year: Year,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Scores are 0–10. `overall` is supplied by the caller and trusted as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityScores {
    pub rarity: f64,
    pub condition: f64,
    pub historical_value: f64,
    pub overall: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub category: String,
    pub historical: String,
    pub modern: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModernComparison {
    pub modern_name: String,
    #[serde(default)]
    pub comparisons: Vec<ComparisonPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialContext {
    #[serde(default)]
    pub gender_role: Option<String>,
    #[serde(default)]
    pub social_class: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicContext {
    #[serde(default)]
    pub historical_price: Option<String>,
    #[serde(default)]
    pub modern_equivalent: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvisibleContext {
    #[serde(default)]
    pub missing: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// Only produced for photographs and paintings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAnalysis {
    #[serde(default)]
    pub composition: Option<String>,
    #[serde(default)]
    pub clothing: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub invisible_context: Option<InvisibleContext>,
    #[serde(default)]
    pub representation_change: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub identity: Identity,
    pub evolution: Evolution,
    pub story: Story,
    #[serde(default)]
    pub timeline: Option<Vec<Milestone>>,
    #[serde(default)]
    pub rarity_scores: Option<RarityScores>,
    #[serde(default)]
    pub modern_comparison: Option<ModernComparison>,
    #[serde(default)]
    pub social_context: Option<SocialContext>,
    #[serde(default)]
    pub economic_context: Option<EconomicContext>,
    #[serde(default)]
    pub visual_analysis: Option<VisualAnalysis>,
    #[serde(default)]
    pub needs_clarification: Option<Clarification>,
    /// 0–100, advisory only.
    #[serde(default)]
    pub confidence: f32,
}

impl AnalysisRecord {
    /// Iterate every piece of text the report may draw from this record.
    pub(crate) fn texts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![
            self.identity.name.as_str(),
            self.identity.category.as_str(),
            self.identity.time_period.as_str(),
            self.identity.creation_date.as_str(),
            self.identity.original_purpose.as_str(),
            self.evolution.cultural_significance.as_str(),
            self.story.title.as_str(),
            self.story.narrative.as_str(),
        ];
        out.extend(self.evolution.historical_changes.iter().map(String::as_str));
        out.extend(self.evolution.replaced_by.as_deref());
        out.extend(self.story.long_narrative.as_deref());
        out.extend(self.story.summary.as_deref());
        out.extend(self.story.key_moments.iter().map(String::as_str));
        for list in [&self.story.deductions, &self.story.detail_highlights]
            .into_iter()
            .flatten()
        {
            out.extend(list.iter().map(String::as_str));
        }
        for m in self.timeline.iter().flatten() {
            out.extend([m.label.as_str(), m.description.as_str(), m.icon.as_str()]);
            if let Year::Text(ref s) = m.year {
                out.push(s);
            }
        }
        if let Some(mc) = &self.modern_comparison {
            out.push(&mc.modern_name);
            for c in &mc.comparisons {
                out.extend([
                    c.category.as_str(),
                    c.historical.as_str(),
                    c.modern.as_str(),
                    c.icon.as_str(),
                ]);
            }
        }
        if let Some(sc) = &self.social_context {
            out.extend(sc.gender_role.as_deref());
            out.extend(sc.social_class.as_deref());
        }
        if let Some(ec) = &self.economic_context {
            out.extend(ec.historical_price.as_deref());
            out.extend(ec.modern_equivalent.as_deref());
        }
        if let Some(va) = &self.visual_analysis {
            out.extend(va.composition.as_deref());
            out.extend(va.clothing.as_deref());
            out.extend(va.background.as_deref());
            out.extend(va.representation_change.as_deref());
            if let Some(ic) = &va.invisible_context {
                out.extend(ic.missing.as_deref());
                out.extend(ic.creator.as_deref());
                out.extend(ic.purpose.as_deref());
            }
        }
        out
    }
}

/// `8.0 → "8"`, `7.5 → "7.5"`: integral values print without a fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// True for `Some` text that is not just whitespace.
pub(crate) fn has_text(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|t| !t.trim().is_empty())
}
