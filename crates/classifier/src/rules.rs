//! Deterministic lexical rules.
//!
//! This is the only keyword table in the crate. The heuristic profile path
//! reads its vocabulary, age and interest cues; the opt-in domain fallback
//! reads its domain keywords. Neither ever adjusts a provider score.
//!
//! ASCII terms match on word boundaries. Terms containing other scripts
//! match as plain substrings, since CJK text has no spaces to split on.

use crate::types::{AgeRange, DomainMatch};

#[derive(Debug)]
pub struct DomainKeywords {
    pub domain: &'static str,
    pub keywords: &'static [&'static str],
}

#[derive(Debug)]
pub struct AgeCue {
    pub cues: &'static [&'static str],
    pub age_range: AgeRange,
}

#[derive(Debug)]
pub struct TagCue {
    pub cues: &'static [&'static str],
    pub tag: &'static str,
}

/// Tone of the text, used to separate advanced from intermediate writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Informational,
    Promotional,
    Neutral,
}

#[derive(Debug)]
pub struct RuleTable {
    pub domain_keywords: &'static [DomainKeywords],
    pub technical_terms: &'static [&'static str],
    /// Terms that mark specialist material on their own.
    pub deep_technical_terms: &'static [&'static str],
    /// Checked in order; the first matching cue decides.
    pub age_cues: &'static [AgeCue],
    pub interest_cues: &'static [TagCue],
    pub behaviour_cues: &'static [TagCue],
    pub domain_geekiness: &'static [(&'static str, u8)],
    pub default_geekiness: u8,
    pub informational_cues: &'static [&'static str],
    pub promotional_cues: &'static [&'static str],
}

static BUILTIN: RuleTable = RuleTable {
    domain_keywords: &[
        DomainKeywords {
            domain: "Automotive",
            keywords: &[
                "car", "vehicle", "toyota", "honda", "suv", "sedan", "truck", "auto",
                "車", "トヨタ", "ホンダ", "自動車", "ドライブ", "エンジン", "hybrid", "fuel",
                "driving", "automotive", "rav4", "steering", "brake", "transmission", "mpg",
                "acceleration",
            ],
        },
        DomainKeywords {
            domain: "Technology & Computing",
            keywords: &[
                "computer", "software", "app", "digital", "ai", "tech", "algorithm",
                "コンピューター", "ソフトウェア", "アプリ", "デジタル", "テクノロジー",
                "machine learning", "neural", "pytorch", "framework", "programming", "data",
                "optimization", "implementation", "architecture",
            ],
        },
        DomainKeywords {
            domain: "Medical Health",
            keywords: &[
                "health", "medical", "doctor", "medicine", "fitness", "wellness", "健康", "医療",
                "医者", "病院", "フィットネス", "dermatology", "treatment", "therapy", "clinical",
            ],
        },
        DomainKeywords {
            domain: "Business and Finance",
            keywords: &[
                "business", "finance", "money", "investment", "economy", "market", "ビジネス",
                "金融", "お金", "投資", "経済", "portfolio", "strategic", "growth", "revenue",
                "profit", "financial", "budget", "capital", "assets",
            ],
        },
        DomainKeywords {
            domain: "Education",
            keywords: &[
                "education", "school", "learning", "student", "university", "academic", "教育",
                "学校", "学習", "学生", "大学", "curriculum", "study", "research", "teaching",
                "training", "course", "degree", "scholarship",
            ],
        },
        DomainKeywords {
            domain: "Style & Fashion",
            keywords: &[
                "fashion", "style", "clothing", "beauty", "makeup", "skincare", "ファッション",
                "スタイル", "美容", "メイク", "designer", "trends", "outfit", "accessories",
                "cosmetics",
            ],
        },
    ],
    technical_terms: &[
        "technology", "system", "performance", "specifications", "analysis", "optimization",
        "implementation", "framework", "algorithm", "data", "hybrid", "engine", "safety",
        "features", "navigation", "infotainment", "transmission", "acceleration", "mpg",
        "horsepower", "machine learning", "neural", "pytorch", "cuda", "ai", "software",
        "programming", "architecture", "digital", "app", "strategic", "investment",
        "portfolio", "market", "financial", "revenue", "growth", "budget", "dermatology",
        "organic", "formulation", "clinical", "therapeutic", "テクノロジー", "システム",
        "パフォーマンス", "ハイブリッド", "エンジン", "デジタル", "ソフトウェア",
        "アプリケーション",
    ],
    deep_technical_terms: &["machine learning", "neural", "pytorch", "cuda", "architecture"],
    age_cues: &[
        AgeCue {
            cues: &["retirement", "retiree", "grandchildren", "定年"],
            age_range: AgeRange::Over50,
        },
        AgeCue {
            cues: &["family", "ファミリー", "children", "子供", "parent"],
            age_range: AgeRange::From35To49,
        },
        AgeCue {
            cues: &["performance", "racing", "speed", "first car", "new car", "beginner", "初心者"],
            age_range: AgeRange::From25To34,
        },
        AgeCue {
            cues: &["luxury", "premium", "高級", "investment", "portfolio"],
            age_range: AgeRange::From35To49,
        },
        AgeCue {
            cues: &["student", "university", "college", "学生", "大学"],
            age_range: AgeRange::From18To24,
        },
    ],
    interest_cues: &[
        TagCue {
            cues: &["車", "car", "automotive", "vehicle"],
            tag: "automotive",
        },
        TagCue {
            cues: &["suv", "off-road", "adventure", "camping"],
            tag: "outdoor_activities",
        },
        TagCue {
            cues: &["family", "ファミリー"],
            tag: "family_oriented",
        },
        TagCue {
            cues: &["performance", "性能", "sport"],
            tag: "performance_enthusiast",
        },
        TagCue {
            cues: &["software", "programming", "machine learning", "gadget"],
            tag: "technology",
        },
        TagCue {
            cues: &["investment", "portfolio", "stocks", "投資"],
            tag: "personal_finance",
        },
    ],
    behaviour_cues: &[
        TagCue {
            cues: &["suv", "compare", "review", "specifications"],
            tag: "research_before_buying",
        },
        TagCue {
            cues: &["toyota", "reliable", "reliability", "信頼"],
            tag: "values_reliability",
        },
    ],
    domain_geekiness: &[
        ("Technology & Computing", 7),
        ("Business and Finance", 6),
        ("Education", 5),
        ("Medical Health", 5),
    ],
    default_geekiness: 4,
    informational_cues: &["です", "について", "features", "specifications", "performance"],
    promotional_cues: &["best", "amazing", "perfect", "最高", "素晴らしい", "おすすめ"],
};

impl RuleTable {
    pub fn builtin() -> &'static RuleTable {
        &BUILTIN
    }

    /// Keyword hits per table domain, in table order. `lower` must be lowercased.
    pub fn domain_scores(&self, lower: &str) -> Vec<(&'static str, usize)> {
        self.domain_keywords
            .iter()
            .map(|d| (d.domain, count_terms(lower, d.keywords)))
            .collect()
    }

    /// Best keyword domain among `known` domains, or `None` when nothing hits.
    ///
    /// Confidence is the winner's share of all keyword hits. Ties keep table order.
    pub fn keyword_domain(&self, text: &str, known: &[String]) -> Option<DomainMatch> {
        let lower = text.to_lowercase();
        let scores: Vec<_> = self
            .domain_scores(&lower)
            .into_iter()
            .filter(|(domain, hits)| *hits > 0 && known.iter().any(|k| k == domain))
            .collect();
        let total: usize = scores.iter().map(|(_, hits)| hits).sum();
        let mut best: Option<(&str, usize)> = None;
        for (domain, hits) in scores {
            if best.map_or(true, |(_, top)| hits > top) {
                best = Some((domain, hits));
            }
        }
        best.map(|(domain, hits)| DomainMatch::keywords(domain, hits as f32 / total as f32))
    }

    pub fn technical_term_count(&self, lower: &str) -> usize {
        count_terms(lower, self.technical_terms)
    }

    pub fn has_deep_technical_terms(&self, lower: &str) -> bool {
        self.deep_technical_terms.iter().any(|t| contains_term(lower, t))
    }

    pub fn base_geekiness(&self, domain: &str) -> u8 {
        self.domain_geekiness
            .iter()
            .find(|(d, _)| *d == domain)
            .map_or(self.default_geekiness, |(_, g)| *g)
    }

    pub fn age_cue(&self, lower: &str) -> Option<AgeRange> {
        self.age_cues
            .iter()
            .find(|cue| cue.cues.iter().any(|c| contains_term(lower, c)))
            .map(|cue| cue.age_range)
    }

    /// Interest tags followed by behaviour tags, each at most once.
    pub fn tags(&self, lower: &str) -> Vec<String> {
        self.interest_cues
            .iter()
            .chain(self.behaviour_cues)
            .filter(|cue| cue.cues.iter().any(|c| contains_term(lower, c)))
            .map(|cue| cue.tag.to_string())
            .collect()
    }

    pub fn tone(&self, lower: &str) -> Tone {
        let info = count_terms(lower, self.informational_cues);
        let promo = count_terms(lower, self.promotional_cues);
        match info.cmp(&promo) {
            std::cmp::Ordering::Greater => Tone::Informational,
            std::cmp::Ordering::Less => Tone::Promotional,
            std::cmp::Ordering::Equal => Tone::Neutral,
        }
    }
}

fn count_terms(lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| contains_term(lower, t)).count()
}

/// Whether `term` occurs in `haystack`. ASCII terms need word boundaries.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if !term.is_ascii() {
        return haystack.contains(term);
    }
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
