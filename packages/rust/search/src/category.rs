use serde::Serialize;

/// Risk categories of the EDD findings table.
///
/// The labels are rendered verbatim into prompts and parsed back out of
/// reports, so they must not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum RiskCategory {
    Sanctions,
    TerrorismFinancing,
    FinancialConduct,
    MoneyLaundering,
    BriberyCorruption,
    AdverseMedia,
    OtherRedFlags,
    /// Any category the caller names that is not one of the fixed ones.
    Custom(String),
}

impl RiskCategory {
    /// The fixed categories, in table order.
    pub const STANDARD: [RiskCategory; 7] = [
        Self::Sanctions,
        Self::TerrorismFinancing,
        Self::FinancialConduct,
        Self::MoneyLaundering,
        Self::BriberyCorruption,
        Self::AdverseMedia,
        Self::OtherRedFlags,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Sanctions => "Sanctions & Restricted Countries",
            Self::TerrorismFinancing => "Terrorism Financing",
            Self::FinancialConduct => "Financial Conduct & Regulatory Issues",
            Self::MoneyLaundering => "Money Laundering",
            Self::BriberyCorruption => "Bribery & Corruption",
            Self::AdverseMedia => "Adverse Media & Negative News",
            Self::OtherRedFlags => "Other Red Flags",
            Self::Custom(label) => label,
        }
    }

    /// What the searcher should look for under this category.
    pub fn scope(&self) -> &str {
        match self {
            Self::Sanctions => {
                "associations with Iran, Syria, Cuba, North Korea, Crimea, DPRK, Sevastopol, or international sanctions"
            }
            Self::TerrorismFinancing => "links to terrorist organizations, funding, or support",
            Self::FinancialConduct => {
                "fines, enforcement actions, market misconduct, insider trading"
            }
            Self::MoneyLaundering => {
                "laundering schemes, shell companies, suspicious transactions"
            }
            Self::BriberyCorruption => "bribery, kickbacks, embezzlement, misuse of power",
            Self::AdverseMedia => {
                "fraud, scams, bankruptcy, trafficking, smuggling, forgery, counterfeit, cybercrime, evasion"
            }
            Self::OtherRedFlags => "reputational risks, banned industries, criminal cases",
            Self::Custom(_) => "any red flags relevant to this category",
        }
    }

    /// Match a fixed category by label or short name; anything else becomes
    /// [`RiskCategory::Custom`]. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let key = trimmed.to_ascii_lowercase();
        let fixed = Self::STANDARD.into_iter().find(|c| {
            c.label().eq_ignore_ascii_case(trimmed)
                || key == c.short_name()
                || key.replace([' ', '-'], "_") == c.short_name()
        });

        Some(fixed.unwrap_or_else(|| Self::Custom(trimmed.to_string())))
    }

    fn short_name(&self) -> &str {
        match self {
            Self::Sanctions => "sanctions",
            Self::TerrorismFinancing => "terrorism_financing",
            Self::FinancialConduct => "financial_conduct",
            Self::MoneyLaundering => "money_laundering",
            Self::BriberyCorruption => "bribery_corruption",
            Self::AdverseMedia => "adverse_media",
            Self::OtherRedFlags => "other_red_flags",
            Self::Custom(_) => "",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
